use std::collections::HashMap;
use crate::domain::hit_test::TraceChannel;
use crate::utils::config::{FireMode, RecoilConfig, WeaponConfig};

/// Immutable weapon preset table - loaded once at startup
/// Shared by reference, never mutated after load
#[derive(Debug, Clone)]
pub struct WeaponDb {
    weapons: HashMap<u32, WeaponConfig>,
}

impl WeaponDb {
    /// Load the built-in presets
    pub fn load() -> Self {
        let mut weapons = HashMap::new();

        weapons.insert(1, WeaponConfig {
            name: "Golden Friend".to_string(),
            max_range: 10_000.0,
            fire_rate: 4.0,
            fire_mode: FireMode::SingleShot,
            barrel_offset: 60.0,
            ..WeaponConfig::default()
        });

        weapons.insert(2, WeaponConfig {
            name: "Prototype".to_string(),
            max_range: 6_000.0,
            fire_rate: 10.0,
            fire_mode: FireMode::Automatic,
            trace_channel: TraceChannel::Pawn,
            barrel_offset: 75.0,
            recoil: RecoilConfig {
                pitch_min: 0.2,
                pitch_max: 0.6,
                recovery_rate: 4.0,
                ..RecoilConfig::default()
            },
            ..WeaponConfig::default()
        });

        weapons.insert(3, WeaponConfig {
            name: "Trident".to_string(),
            max_range: 8_000.0,
            fire_rate: 12.0,
            fire_mode: FireMode::Burst { shots: 3 },
            barrel_offset: 70.0,
            aiming_fov: 45.0,
            ..WeaponConfig::default()
        });

        Self { weapons }
    }

    /// Get weapon preset by ID
    pub fn get(&self, id: u32) -> Option<&WeaponConfig> {
        self.weapons.get(&id)
    }

    /// Get a preset or a reason it is missing
    pub fn require(&self, id: u32) -> Result<&WeaponConfig, &'static str> {
        self.get(id).ok_or("Unknown weapon id")
    }

    /// Check if weapon exists
    pub fn contains(&self, id: u32) -> bool {
        self.weapons.contains_key(&id)
    }

    /// Get default weapon ID (Golden Friend)
    pub fn default_weapon_id() -> u32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_db_load() {
        let db = WeaponDb::load();
        assert!(db.contains(1));
        assert!(db.contains(2));
        assert!(db.contains(3));
        assert!(!db.contains(999));
    }

    #[test]
    fn test_get_weapon() {
        let db = WeaponDb::load();
        let weapon = db.get(1).unwrap();
        assert_eq!(weapon.name, "Golden Friend");
        assert_eq!(weapon.fire_mode, FireMode::SingleShot);
    }

    #[test]
    fn test_fire_modes() {
        let db = WeaponDb::load();
        assert_eq!(db.get(2).unwrap().fire_mode, FireMode::Automatic);
        assert_eq!(db.get(3).unwrap().fire_mode, FireMode::Burst { shots: 3 });
    }

    #[test]
    fn test_require_unknown() {
        let db = WeaponDb::load();
        assert_eq!(db.require(42).unwrap_err(), "Unknown weapon id");
    }

    #[test]
    fn test_default_weapon() {
        let db = WeaponDb::load();
        assert!(db.contains(WeaponDb::default_weapon_id()));
    }
}
