pub mod domain;
pub mod state;
pub mod tick;
pub mod utils;

pub use domain::fire_policy::{fire_policy_for, Automatic, Burst, FirePolicy, SingleShot};
pub use domain::hit_test::{EntityId, HitInfo, HitTestProvider, SphereWorld, TraceChannel};
pub use domain::recoil::{RecoilKick, Stance};
pub use domain::replication::{FieldId, MetaData, ReplicatedValue, ReplicationChannel};
pub use state::commands::WeaponCommand;
pub use state::controller::WeaponController;
pub use state::observer::ReplicaObserver;
pub use state::replication::ReplicationHub;
pub use state::weapon::{ShotAttempt, Weapon, WeaponState};
pub use tick::weapon_tick::{weapon_tick_loop, TickStats};
pub use utils::config::{Config, FireMode, RecoilConfig, WeaponConfig};
pub use utils::weapondb::WeaponDb;
