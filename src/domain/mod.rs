pub mod fire_policy;
pub mod recoil;
pub mod replication;
pub mod shot;
