pub mod delta_sync;
pub mod weapon_tick;
