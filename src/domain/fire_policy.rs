use crate::domain::hit_test::HitTestProvider;
use crate::state::weapon::{ShotAttempt, Weapon, WeaponState};
use crate::utils::config::FireMode;

/// Repeat-fire behaviour layered over the weapon state machine
///
/// The weapon enforces cooldown and state checks; a policy only decides
/// when to ask for the next round.
pub trait FirePolicy: Send {
    fn mode(&self) -> FireMode;

    /// Trigger pressed
    fn start_fire(&mut self, weapon: &mut Weapon, world: &dyn HitTestProvider);

    /// Trigger released. Cancels anything scheduled; idempotent.
    fn stop_fire(&mut self, weapon: &mut Weapon);

    /// Called every frame after `Weapon::tick`
    fn tick(&mut self, weapon: &mut Weapon, world: &dyn HitTestProvider);

    /// A shot requested directly through `try_shooting` resolved
    fn on_shot_resolved(&mut self, weapon: &mut Weapon);

    /// True while follow-up rounds are scheduled
    fn is_armed(&self) -> bool;
}

pub fn fire_policy_for(mode: FireMode) -> Box<dyn FirePolicy> {
    match mode {
        FireMode::SingleShot => Box::new(SingleShot),
        FireMode::Automatic => Box::new(Automatic::new()),
        FireMode::Burst { shots } => Box::new(Burst::new(shots)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Released,
    // Pressed during cooldown; the first round goes out when it ends
    Waiting,
    Firing,
}

/// One round per trigger press
#[derive(Debug, Default)]
pub struct SingleShot;

impl FirePolicy for SingleShot {
    fn mode(&self) -> FireMode {
        FireMode::SingleShot
    }

    fn start_fire(&mut self, weapon: &mut Weapon, world: &dyn HitTestProvider) {
        if weapon.try_shooting(world).fired() {
            weapon.finish_shot();
        }
    }

    fn stop_fire(&mut self, weapon: &mut Weapon) {
        weapon.stop_firing();
    }

    fn tick(&mut self, _weapon: &mut Weapon, _world: &dyn HitTestProvider) {}

    fn on_shot_resolved(&mut self, weapon: &mut Weapon) {
        weapon.finish_shot();
    }

    fn is_armed(&self) -> bool {
        false
    }
}

/// Fires every time the cooldown allows until the trigger is released
#[derive(Debug)]
pub struct Automatic {
    trigger: Trigger,
}

impl Automatic {
    pub fn new() -> Self {
        Self {
            trigger: Trigger::Released,
        }
    }

    fn release(&mut self, weapon: &mut Weapon) {
        self.trigger = Trigger::Released;
        weapon.stop_firing();
    }
}

impl Default for Automatic {
    fn default() -> Self {
        Self::new()
    }
}

impl FirePolicy for Automatic {
    fn mode(&self) -> FireMode {
        FireMode::Automatic
    }

    fn start_fire(&mut self, weapon: &mut Weapon, world: &dyn HitTestProvider) {
        if self.trigger != Trigger::Released {
            return;
        }
        self.trigger = match weapon.try_shooting(world) {
            ShotAttempt::Fired { .. } => Trigger::Firing,
            ShotAttempt::CoolingDown => Trigger::Waiting,
            _ => Trigger::Released,
        };
    }

    fn stop_fire(&mut self, weapon: &mut Weapon) {
        self.release(weapon);
    }

    fn tick(&mut self, weapon: &mut Weapon, world: &dyn HitTestProvider) {
        match self.trigger {
            Trigger::Released => {}
            Trigger::Waiting => {
                self.trigger = match weapon.try_shooting(world) {
                    ShotAttempt::Fired { .. } => Trigger::Firing,
                    ShotAttempt::CoolingDown => Trigger::Waiting,
                    _ => Trigger::Released,
                };
            }
            Trigger::Firing => {
                // Knocked out of Firing from outside (holstered, dropped)
                if weapon.state() != WeaponState::Firing {
                    self.trigger = Trigger::Released;
                    return;
                }
                match weapon.continue_firing(world) {
                    ShotAttempt::Fired { .. } | ShotAttempt::CoolingDown => {}
                    _ => self.release(weapon),
                }
            }
        }
    }

    fn on_shot_resolved(&mut self, weapon: &mut Weapon) {
        // A lone shot outside a held trigger completes immediately
        if self.trigger == Trigger::Released {
            weapon.finish_shot();
        }
    }

    fn is_armed(&self) -> bool {
        self.trigger != Trigger::Released
    }
}

/// Fixed number of rounds per trigger press
#[derive(Debug)]
pub struct Burst {
    shots: u32,
    remaining: u32,
    trigger: Trigger,
}

impl Burst {
    pub fn new(shots: u32) -> Self {
        Self {
            shots: shots.max(1),
            remaining: 0,
            trigger: Trigger::Released,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn cancel(&mut self) {
        self.remaining = 0;
        self.trigger = Trigger::Released;
    }

    fn begin(&mut self, attempt: ShotAttempt, weapon: &mut Weapon) {
        match attempt {
            ShotAttempt::Fired { .. } => {
                self.remaining = self.shots - 1;
                self.trigger = Trigger::Firing;
                if self.remaining == 0 {
                    self.cancel();
                    weapon.finish_shot();
                }
            }
            ShotAttempt::CoolingDown => {
                self.remaining = self.shots;
                self.trigger = Trigger::Waiting;
            }
            _ => self.cancel(),
        }
    }
}

impl FirePolicy for Burst {
    fn mode(&self) -> FireMode {
        FireMode::Burst { shots: self.shots }
    }

    fn start_fire(&mut self, weapon: &mut Weapon, world: &dyn HitTestProvider) {
        // A burst in progress runs to completion
        if self.trigger != Trigger::Released {
            return;
        }
        let attempt = weapon.try_shooting(world);
        self.begin(attempt, weapon);
    }

    fn stop_fire(&mut self, weapon: &mut Weapon) {
        self.cancel();
        weapon.stop_firing();
    }

    fn tick(&mut self, weapon: &mut Weapon, world: &dyn HitTestProvider) {
        match self.trigger {
            Trigger::Released => {}
            Trigger::Waiting => {
                let attempt = weapon.try_shooting(world);
                self.begin(attempt, weapon);
            }
            Trigger::Firing => {
                if weapon.state() != WeaponState::Firing {
                    self.cancel();
                    return;
                }
                match weapon.continue_firing(world) {
                    ShotAttempt::Fired { .. } => {
                        self.remaining -= 1;
                        if self.remaining == 0 {
                            self.cancel();
                            weapon.finish_shot();
                        }
                    }
                    ShotAttempt::CoolingDown => {}
                    _ => {
                        self.cancel();
                        weapon.stop_firing();
                    }
                }
            }
        }
    }

    fn on_shot_resolved(&mut self, weapon: &mut Weapon) {
        if self.trigger == Trigger::Released {
            weapon.finish_shot();
        }
    }

    fn is_armed(&self) -> bool {
        self.trigger != Trigger::Released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hit_test::SphereWorld;
    use crate::utils::config::WeaponConfig;

    fn ready_weapon(mode: FireMode) -> Weapon {
        let mut weapon = Weapon::new(WeaponConfig {
            fire_rate: 10.0,
            fire_mode: mode,
            ..WeaponConfig::default()
        })
        .with_seed(5);
        weapon.set_owning_character(Some(1));
        weapon.tick(0.0);
        weapon.set_is_active(true);
        weapon
    }

    fn run(policy: &mut dyn FirePolicy, weapon: &mut Weapon, world: &SphereWorld, ticks: u32, dt: f32) {
        for _ in 0..ticks {
            weapon.tick(dt);
            policy.tick(weapon, world);
        }
    }

    #[test]
    fn test_policy_for_mode() {
        assert_eq!(fire_policy_for(FireMode::Automatic).mode(), FireMode::Automatic);
        assert_eq!(
            fire_policy_for(FireMode::Burst { shots: 0 }).mode(),
            FireMode::Burst { shots: 1 }
        );
    }

    #[test]
    fn test_single_shot_returns_to_idle() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::SingleShot);
        let mut policy = SingleShot;

        policy.start_fire(&mut weapon, &world);
        assert_eq!(weapon.state(), WeaponState::Idle);
        assert_eq!(weapon.shots_resolved(), 1);

        run(&mut policy, &mut weapon, &world, 10, 0.1);
        assert_eq!(weapon.shots_resolved(), 1);
    }

    #[test]
    fn test_automatic_fires_until_released() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::Automatic);
        let mut policy = Automatic::new();

        policy.start_fire(&mut weapon, &world);
        assert_eq!(weapon.shots_resolved(), 1);
        run(&mut policy, &mut weapon, &world, 4, 0.1);
        assert_eq!(weapon.shots_resolved(), 5);
        assert_eq!(weapon.state(), WeaponState::Firing);

        policy.stop_fire(&mut weapon);
        assert_eq!(weapon.state(), WeaponState::Idle);
        run(&mut policy, &mut weapon, &world, 4, 0.1);
        assert_eq!(weapon.shots_resolved(), 5);

        // Idempotent
        policy.stop_fire(&mut weapon);
        assert!(!policy.is_armed());
    }

    #[test]
    fn test_automatic_waits_out_cooldown() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::Automatic);
        let mut policy = Automatic::new();

        policy.start_fire(&mut weapon, &world);
        policy.stop_fire(&mut weapon);
        policy.start_fire(&mut weapon, &world);
        assert_eq!(weapon.shots_resolved(), 1);
        assert!(policy.is_armed());

        run(&mut policy, &mut weapon, &world, 1, 0.1);
        assert_eq!(weapon.shots_resolved(), 2);
    }

    #[test]
    fn test_automatic_disarms_when_holstered() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::Automatic);
        let mut policy = Automatic::new();

        policy.start_fire(&mut weapon, &world);
        weapon.set_is_active(false);
        run(&mut policy, &mut weapon, &world, 1, 0.1);
        assert!(!policy.is_armed());

        weapon.set_is_active(true);
        run(&mut policy, &mut weapon, &world, 3, 0.1);
        assert_eq!(weapon.shots_resolved(), 1);
    }

    #[test]
    fn test_burst_fires_fixed_count() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::Burst { shots: 3 });
        let mut policy = Burst::new(3);

        policy.start_fire(&mut weapon, &world);
        assert_eq!(policy.remaining(), 2);
        run(&mut policy, &mut weapon, &world, 10, 0.1);

        assert_eq!(weapon.shots_resolved(), 3);
        assert_eq!(weapon.state(), WeaponState::Idle);
        assert!(!policy.is_armed());
    }

    #[test]
    fn test_burst_ignores_press_mid_burst() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::Burst { shots: 3 });
        let mut policy = Burst::new(3);

        policy.start_fire(&mut weapon, &world);
        policy.start_fire(&mut weapon, &world);
        run(&mut policy, &mut weapon, &world, 10, 0.1);
        assert_eq!(weapon.shots_resolved(), 3);
    }

    #[test]
    fn test_burst_stop_cancels_remaining_rounds() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::Burst { shots: 3 });
        let mut policy = Burst::new(3);

        policy.start_fire(&mut weapon, &world);
        policy.stop_fire(&mut weapon);
        policy.start_fire(&mut weapon, &world);
        assert_eq!(weapon.shots_resolved(), 1);

        run(&mut policy, &mut weapon, &world, 10, 0.1);
        // First press fired once; second press fired a full fresh burst
        assert_eq!(weapon.shots_resolved(), 4);
    }

    #[test]
    fn test_direct_shot_on_continuous_weapon_completes() {
        let world = SphereWorld::new();
        let mut weapon = ready_weapon(FireMode::Automatic);
        let mut policy = Automatic::new();

        assert!(weapon.try_shooting(&world).fired());
        policy.on_shot_resolved(&mut weapon);
        assert_eq!(weapon.state(), WeaponState::Idle);
    }
}
