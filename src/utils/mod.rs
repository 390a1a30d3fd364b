pub mod buffers;
pub mod config;
pub mod vector;
pub mod weapondb;
