use crate::domain::fire_policy::{fire_policy_for, FirePolicy};
use crate::domain::hit_test::HitTestProvider;
use crate::state::weapon::{ShotAttempt, Weapon};

/// A weapon plus the fire policy its config asks for
pub struct WeaponController {
    weapon: Weapon,
    policy: Box<dyn FirePolicy>,
}

impl WeaponController {
    pub fn new(weapon: Weapon) -> Self {
        let policy = fire_policy_for(weapon.config().fire_mode);
        Self::with_policy(weapon, policy)
    }

    pub fn with_policy(weapon: Weapon, policy: Box<dyn FirePolicy>) -> Self {
        Self { weapon, policy }
    }

    pub fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    pub fn weapon_mut(&mut self) -> &mut Weapon {
        &mut self.weapon
    }

    pub fn policy(&self) -> &dyn FirePolicy {
        self.policy.as_ref()
    }

    pub fn start_fire(&mut self, world: &dyn HitTestProvider) {
        self.policy.start_fire(&mut self.weapon, world);
    }

    pub fn stop_fire(&mut self) {
        self.policy.stop_fire(&mut self.weapon);
    }

    /// Single shot request, outside any held trigger
    pub fn try_shooting(&mut self, world: &dyn HitTestProvider) -> ShotAttempt {
        let attempt = self.weapon.try_shooting(world);
        if attempt.fired() {
            self.policy.on_shot_resolved(&mut self.weapon);
        }
        attempt
    }

    /// Holstering also releases the trigger
    pub fn set_is_active(&mut self, is_active: bool) {
        self.weapon.set_is_active(is_active);
        if !is_active {
            self.policy.stop_fire(&mut self.weapon);
        }
    }

    pub fn tick(&mut self, dt: f32, world: &dyn HitTestProvider) {
        self.weapon.tick(dt);
        self.policy.tick(&mut self.weapon, world);
    }
}
