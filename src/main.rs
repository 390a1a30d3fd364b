use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep, Duration};
use gungameweapon::state::commands::WeaponCommand;
use gungameweapon::utils::config::{init_trace_tag, Config};
use gungameweapon::{
    FieldId, MetaData, SphereWorld, Stance, Weapon, WeaponController, WeaponDb,
    weapon_tick_loop,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    setup_logging(&config)?;
    init_trace_tag(&config.trace_tag)?;

    // Load immutable globals
    let weapons = WeaponDb::load();
    let weapon_config = weapons.require(config.weapon_id)?.clone();
    let config = Arc::new(config);

    // Small shooting range: two targets and a wall in front of a third
    let mut world = SphereWorld::new();
    world.add_target(2, (800.0, 0.0, 0.0), 40.0);
    world.add_target(3, (0.0, 1200.0, 0.0), 40.0);
    world.add_blocker((0.0, -300.0, 0.0), 50.0);
    world.add_target(4, (0.0, -900.0, 0.0), 40.0);
    let world = Arc::new(RwLock::new(world));

    let mut weapon = Weapon::new(weapon_config);
    weapon.add_shot_listener(Box::new(|hit| {
        log::info!("Shot {}", if hit { "hit" } else { "missed" });
    }));

    // Remote observer applies updates on its own task
    let mut observer = weapon.connect_observer()?;
    let observer_task = tokio::spawn(async move {
        while let Some(field) = observer.next_change().await {
            match field {
                FieldId::IsActive => log::info!("Observer: is_active = {}", observer.is_active()),
                FieldId::MetaData => log::info!("Observer: meta_data = {:?}", observer.meta_data()),
            }
        }
    });

    let (command_tx, command_rx) = mpsc::channel::<WeaponCommand>(256);
    let tick_task = tokio::spawn(weapon_tick_loop(
        WeaponController::new(weapon),
        command_rx,
        world.clone(),
        config.clone(),
    ));

    log::info!("Weapon demo running for {}s", config.demo_duration_secs);
    let steps = [
        WeaponCommand::Equip { owner: 1 },
        WeaponCommand::SetMetaData { meta_data: MetaData { skin: 2 } },
        WeaponCommand::SetActive { is_active: true },
        WeaponCommand::Aim { origin: (0.0, 0.0, 0.0), direction: (1.0, 0.0, 0.0), stance: Stance::default() },
        WeaponCommand::StartFire,
    ];
    for cmd in steps {
        command_tx.send(cmd).await?;
    }

    let third = Duration::from_millis(config.demo_duration_secs * 1000 / 3);
    sleep(third).await;

    // First target is destroyed
    world.write().await.remove_entity(2);
    command_tx.send(WeaponCommand::Aim {
        origin: (0.0, 0.0, 0.0),
        direction: (0.0, -1.0, 0.0),
        stance: Stance { crouching: true, aiming: true },
    }).await?;
    command_tx.send(WeaponCommand::TryShooting).await?;

    sleep(third).await;
    command_tx.send(WeaponCommand::StopFire).await?;
    command_tx.send(WeaponCommand::SetActive { is_active: false }).await?;

    sleep(third).await;
    command_tx.send(WeaponCommand::Shutdown).await?;

    let (controller, stats) = tick_task.await?;
    log::info!(
        "Demo finished: {} ticks, {} shots, {} replicated changes, recoil offset {:?}",
        stats.ticks,
        stats.shots,
        stats.replicated_changes,
        controller.weapon().recoil_offset()
    );
    if let Some(shot) = controller.weapon().last_shot() {
        log::info!("Last shot: hit={} distance={:?}", shot.hit, shot.distance);
    }

    // Dropping the weapon closes the observer's feed
    drop(controller);
    observer_task.await?;
    Ok(())
}

fn setup_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Utc::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(config.level_filter())
        .chain(std::io::stdout())
        .chain(fern::log_file("weapon.log")?)
        .apply()?;
    Ok(())
}
