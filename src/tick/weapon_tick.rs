use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};
use crate::domain::hit_test::HitTestProvider;
use crate::state::commands::{drain_and_coalesce, WeaponCommand};
use crate::state::controller::WeaponController;
use crate::tick::delta_sync;
use crate::utils::config::Config;

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub shots: u64,
    pub replicated_changes: u64,
}

/// Per-weapon tick loop - applies commands, advances the weapon, reports replication
/// Runs at the configured tick rate until `Shutdown` or until every sender is gone
pub async fn weapon_tick_loop<W>(
    mut controller: WeaponController,
    mut command_rx: mpsc::Receiver<WeaponCommand>,
    world: Arc<RwLock<W>>,
    config: Arc<Config>,
) -> (WeaponController, TickStats)
where
    W: HitTestProvider + Send + Sync,
{
    let tick_interval = Duration::from_millis(config.tick_interval_ms());
    let dt = tick_interval.as_secs_f32();
    let mut tick_timer = interval(tick_interval);
    let mut stats = TickStats::default();

    loop {
        tick_timer.tick().await;

        // 1. Drain commands (coalesce aim - keep only latest)
        let commands = drain_and_coalesce(&mut command_rx);

        // 2. Hold the world for the whole frame
        let world_guard = world.read().await;

        // 3. Apply commands in order
        let mut shutdown = false;
        for cmd in commands {
            if !process_command(&mut controller, &*world_guard, cmd) {
                shutdown = true;
                break;
            }
        }

        // 4. Advance cooldown, recoil, attachment and fire policy
        if !shutdown {
            controller.tick(dt, &*world_guard);
        }
        drop(world_guard);
        stats.ticks += 1;

        // 5. Report replicated changes
        let events = delta_sync::collect_changes(controller.weapon_mut());
        for event in &events {
            log::info!("Replicated {}", delta_sync::describe(event));
        }
        stats.replicated_changes += events.len() as u64;

        if shutdown {
            log::info!("Weapon tick loop shutting down");
            break;
        }
        if command_rx.is_closed() && command_rx.is_empty() {
            log::info!("Command channel closed, stopping weapon tick loop");
            break;
        }
    }

    stats.shots = controller.weapon().shots_resolved();
    (controller, stats)
}

/// Apply one command; false means stop the loop
fn process_command(
    controller: &mut WeaponController,
    world: &dyn HitTestProvider,
    cmd: WeaponCommand,
) -> bool {
    match cmd {
        WeaponCommand::Equip { owner } => {
            controller.weapon_mut().set_owning_character(Some(owner));
        }
        WeaponCommand::Unequip => {
            controller.stop_fire();
            controller.weapon_mut().detach();
        }
        WeaponCommand::SetActive { is_active } => {
            controller.set_is_active(is_active);
        }
        WeaponCommand::SetMetaData { meta_data } => {
            controller.weapon_mut().set_meta_data(meta_data);
        }
        WeaponCommand::Aim { origin, direction, stance } => {
            let weapon = controller.weapon_mut();
            weapon.set_aim(origin, direction);
            weapon.set_stance(stance);
        }
        WeaponCommand::StartFire => controller.start_fire(world),
        WeaponCommand::StopFire => controller.stop_fire(),
        WeaponCommand::TryShooting => {
            let attempt = controller.try_shooting(world);
            log::debug!("TryShooting -> {:?}", attempt);
        }
        WeaponCommand::Shutdown => return false,
    }
    true
}
