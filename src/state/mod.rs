pub mod commands;
pub mod controller;
pub mod listener;
pub mod observer;
pub mod replication;
pub mod weapon;
