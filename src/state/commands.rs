use tokio::sync::mpsc;
use crate::domain::hit_test::EntityId;
use crate::domain::recoil::Stance;
use crate::domain::replication::MetaData;
use crate::utils::vector::Vec3;

/// Command sent from the outside world to the weapon tick loop
#[derive(Debug, Clone)]
pub enum WeaponCommand {
    // Ownership
    Equip { owner: EntityId },
    Unequip,

    // Replicated state
    SetActive { is_active: bool },
    SetMetaData { meta_data: MetaData },

    // Aim (only latest kept per frame)
    Aim { origin: Vec3, direction: Vec3, stance: Stance },

    // Trigger
    StartFire,
    StopFire,
    TryShooting,

    Shutdown,
}

/// Drain the queue, keeping only the latest aim
/// Stale aim updates are dropped; the latest stays where it was queued,
/// so a shot queued before it still uses the previous aim
pub fn drain_and_coalesce(rx: &mut mpsc::Receiver<WeaponCommand>) -> Vec<WeaponCommand> {
    let mut commands: Vec<WeaponCommand> = Vec::new();
    let mut latest_aim: Option<usize> = None;

    while let Ok(cmd) = rx.try_recv() {
        if matches!(cmd, WeaponCommand::Aim { .. }) {
            latest_aim = Some(commands.len());
        }
        commands.push(cmd);
    }

    if let Some(latest) = latest_aim {
        let mut index = 0;
        commands.retain(|cmd| {
            let keep = index == latest || !matches!(cmd, WeaponCommand::Aim { .. });
            index += 1;
            keep
        });
    }
    commands
}
