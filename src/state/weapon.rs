use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::domain::hit_test::{EntityId, HitInfo, HitTestProvider};
use crate::domain::recoil::{RecoilKick, RecoilState, Stance};
use crate::domain::replication::{
    ChangeCallback, FieldId, MetaData, ReplicatedValue, ReplicationChannel,
};
use crate::domain::shot::{self, ShotResult};
use crate::state::listener::{ShotListener, ShotListenerSlot};
use crate::state::observer::ReplicaObserver;
use crate::state::replication::ReplicationHub;
use crate::utils::buffers::SmallEventVec;
use crate::utils::config::{self, WeaponConfig};
use crate::utils::vector::{self, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponState {
    Idle,
    Firing,
}

/// What a shot request did
///
/// Everything other than `Fired` is a silent no-op for gameplay purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotAttempt {
    Fired { hit: bool },
    Inactive,
    NotIdle,
    CoolingDown,
    NoWielder,
}

impl ShotAttempt {
    pub fn fired(&self) -> bool {
        matches!(self, ShotAttempt::Fired { .. })
    }
}

/// Server-authoritative weapon state machine
pub struct Weapon {
    config: WeaponConfig,
    state: WeaponState,
    is_active: bool,
    meta_data: MetaData,

    // Wielder (non-owning) and lazy attachment
    owner: Option<EntityId>,
    has_attached: bool,

    // Seconds until the next shot may resolve
    cooldown_remaining: f32,

    // Aim supplied by the wielder each frame
    aim_origin: Vec3,
    aim_direction: Vec3,
    stance: Stance,
    first_person: bool,

    recoil: RecoilState,
    rng: StdRng,
    listener: ShotListenerSlot,
    replication: Box<dyn ReplicationChannel>,

    shots_resolved: u64,
    last_shot: Option<ShotResult>,
}

impl Weapon {
    /// Weapon replicating through an in-process `ReplicationHub`
    pub fn new(config: WeaponConfig) -> Self {
        let mut hub = ReplicationHub::new();
        hub.seed(ReplicatedValue::IsActive(false));
        hub.seed(ReplicatedValue::MetaData(MetaData::default()));
        Self::with_channel(config, Box::new(hub))
    }

    pub fn with_channel(config: WeaponConfig, mut replication: Box<dyn ReplicationChannel>) -> Self {
        let meta_data = MetaData::default();

        // Observers must see the defaults before the first write
        replication.publish(FieldId::IsActive, ReplicatedValue::IsActive(false));
        replication.publish(FieldId::MetaData, ReplicatedValue::MetaData(meta_data.clone()));
        replication.drain_events();

        Self {
            config,
            state: WeaponState::Idle,
            is_active: false,
            meta_data,
            owner: None,
            has_attached: false,
            cooldown_remaining: 0.0,
            aim_origin: (0.0, 0.0, 0.0),
            aim_direction: (1.0, 0.0, 0.0),
            stance: Stance::default(),
            first_person: false,
            recoil: RecoilState::new(),
            rng: StdRng::from_entropy(),
            listener: ShotListenerSlot::new(),
            replication,
            shots_resolved: 0,
            last_shot: None,
        }
    }

    /// Fix the recoil RNG seed (replays, tests)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn state(&self) -> WeaponState {
        self.state
    }

    pub(crate) fn set_weapon_state(&mut self, new_state: WeaponState) {
        if self.state != new_state {
            log::debug!("Weapon '{}' {:?} -> {:?}", self.config.name, self.state, new_state);
            self.state = new_state;
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Activate or holster. Going inactive mid-fire drops straight to Idle.
    pub fn set_is_active(&mut self, is_active: bool) {
        if self.is_active == is_active {
            return;
        }
        self.is_active = is_active;
        self.replication
            .publish(FieldId::IsActive, ReplicatedValue::IsActive(is_active));

        if !is_active && self.state == WeaponState::Firing {
            self.set_weapon_state(WeaponState::Idle);
        }
    }

    pub fn meta_data(&self) -> &MetaData {
        &self.meta_data
    }

    pub fn set_meta_data(&mut self, meta_data: MetaData) {
        if self.meta_data == meta_data {
            return;
        }
        self.meta_data = meta_data.clone();
        self.replication
            .publish(FieldId::MetaData, ReplicatedValue::MetaData(meta_data));
    }

    /// Register a callback for changes of a replicated field, local instance included
    pub fn on_replicated_change(&mut self, field: FieldId, callback: ChangeCallback) {
        self.replication.on_change(field, callback);
    }

    /// Attach a remote observer to this weapon's replicated fields
    pub fn connect_observer(&mut self) -> Result<ReplicaObserver, &'static str> {
        self.replication.connect()
    }

    /// Replicated changes accepted since the last call
    pub fn drain_replication_events(&mut self) -> SmallEventVec {
        self.replication.drain_events()
    }

    pub fn owning_character(&self) -> Option<EntityId> {
        self.owner
    }

    /// Hand the weapon to a new owner; attachment happens on the next tick
    pub fn set_owning_character(&mut self, owner: Option<EntityId>) {
        if self.owner == owner {
            return;
        }
        match owner {
            Some(id) => {
                self.owner = Some(id);
                self.has_attached = false;
                if self.state == WeaponState::Firing {
                    self.set_weapon_state(WeaponState::Idle);
                }
            }
            None => self.detach(),
        }
    }

    /// Entity the weapon is attached to, once attachment happened
    pub fn wielder(&self) -> Option<EntityId> {
        if self.has_attached {
            self.owner
        } else {
            None
        }
    }

    pub fn has_attached(&self) -> bool {
        self.has_attached
    }

    /// Attach to the owner if not attached yet; false when nothing happened
    pub fn try_to_attach(&mut self) -> bool {
        if self.has_attached {
            return false;
        }
        let Some(owner) = self.owner else {
            return false;
        };
        self.has_attached = true;
        log::info!("Weapon '{}' attached to {}", self.config.name, owner);
        true
    }

    /// Drop the wielder reference; the weapon itself survives
    pub fn detach(&mut self) {
        if let Some(owner) = self.owner.take() {
            log::info!("Weapon '{}' detached from {}", self.config.name, owner);
        }
        self.has_attached = false;
        if self.state == WeaponState::Firing {
            self.set_weapon_state(WeaponState::Idle);
        }
    }

    pub fn set_aim(&mut self, origin: Vec3, direction: Vec3) {
        self.aim_origin = origin;
        self.aim_direction = direction;
    }

    pub fn set_stance(&mut self, stance: Stance) {
        self.stance = stance;
    }

    pub fn is_first_person(&self) -> bool {
        self.first_person
    }

    pub fn set_first_person(&mut self, first_person: bool) {
        self.first_person = first_person;
    }

    pub fn line_trace_direction(&self) -> Vec3 {
        vector::normalize(self.aim_direction).unwrap_or(self.aim_direction)
    }

    /// Muzzle position: aim origin pushed out along the aim by the barrel offset
    pub fn bullet_spawn_point(&self) -> Vec3 {
        match vector::normalize(self.aim_direction) {
            Some(dir) => vector::add(self.aim_origin, vector::scale(dir, self.config.barrel_offset)),
            None => self.aim_origin,
        }
    }

    /// Trace from the muzzle. Some when anything at all was struck.
    pub fn do_line_trace(&self, world: &dyn HitTestProvider) -> Option<HitInfo> {
        match world.probe(
            self.bullet_spawn_point(),
            self.line_trace_direction(),
            self.config.max_range,
            self.config.trace_channel,
        ) {
            Ok(hit) => hit,
            Err(e) => {
                log::warn!("Line trace failed: {}", e);
                None
            }
        }
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    pub fn shots_resolved(&self) -> u64 {
        self.shots_resolved
    }

    pub fn last_shot(&self) -> Option<&ShotResult> {
        self.last_shot.as_ref()
    }

    pub fn add_shot_listener(&mut self, listener: ShotListener) {
        self.listener.set(listener);
    }

    pub fn remove_shot_listener(&mut self) {
        self.listener.clear();
    }

    pub fn recoil_offset(&self) -> RecoilKick {
        self.recoil.offset()
    }

    /// Drain the recoil the wielder still has to apply
    pub fn take_recoil(&mut self) -> RecoilKick {
        self.recoil.take_pending()
    }

    /// Per-frame update: cooldown, recoil recovery and lazy attachment
    pub fn tick(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
        self.recoil.recover(self.config.recoil.recovery_rate, dt);
        self.try_to_attach();
    }

    /// Fire from Idle if active, off cooldown and wielded
    pub fn try_shooting(&mut self, world: &dyn HitTestProvider) -> ShotAttempt {
        if let Some(blocked) = self.check_fire(WeaponState::Idle) {
            return blocked;
        }
        self.set_weapon_state(WeaponState::Firing);
        self.fire_round(world)
    }

    /// Next round of a continuous sequence; the weapon must already be Firing
    pub fn continue_firing(&mut self, world: &dyn HitTestProvider) -> ShotAttempt {
        if let Some(blocked) = self.check_fire(WeaponState::Firing) {
            return blocked;
        }
        self.fire_round(world)
    }

    /// A discrete shot sequence completed
    pub fn finish_shot(&mut self) {
        self.set_weapon_state(WeaponState::Idle);
    }

    /// Return to Idle; safe to call when already idle
    pub fn stop_firing(&mut self) {
        self.set_weapon_state(WeaponState::Idle);
    }

    fn check_fire(&self, required: WeaponState) -> Option<ShotAttempt> {
        if !self.is_active {
            return Some(ShotAttempt::Inactive);
        }
        if self.state != required {
            return Some(ShotAttempt::NotIdle);
        }
        if self.cooldown_remaining > 0.0 {
            return Some(ShotAttempt::CoolingDown);
        }
        if self.wielder().is_none() {
            return Some(ShotAttempt::NoWielder);
        }
        None
    }

    fn fire_round(&mut self, world: &dyn HitTestProvider) -> ShotAttempt {
        let origin = self.bullet_spawn_point();
        let direction = self.line_trace_direction();
        let result = shot::resolve_shot(
            world,
            origin,
            direction,
            self.config.max_range,
            self.config.trace_channel,
        );

        if self.config.draw_debug_line_trace {
            log::debug!(
                "[{}] trace {:?} -> {:?} ({:?})",
                config::trace_tag(),
                origin,
                result.info.location,
                self.config.trace_channel
            );
        }

        self.cooldown_remaining = self.config.refire_interval();
        self.recoil.kick(&self.config.recoil, self.stance, &mut self.rng);
        self.shots_resolved += 1;
        self.last_shot = Some(result);

        log::debug!(
            "Weapon '{}' shot {}: hit={} entity={:?} distance={:?}",
            self.config.name,
            self.shots_resolved,
            result.hit,
            result.info.hit_entity,
            result.distance
        );

        self.announce_shot(result.hit);
        ShotAttempt::Fired { hit: result.hit }
    }

    fn announce_shot(&mut self, hit: bool) {
        self.listener.notify(hit);
    }
}

impl std::fmt::Debug for Weapon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Weapon")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("is_active", &self.is_active)
            .field("meta_data", &self.meta_data)
            .field("owner", &self.owner)
            .field("has_attached", &self.has_attached)
            .field("cooldown_remaining", &self.cooldown_remaining)
            .field("shots_resolved", &self.shots_resolved)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hit_test::SphereWorld;
    use std::sync::{Arc, Mutex};

    fn test_config() -> WeaponConfig {
        WeaponConfig {
            name: "Test".to_string(),
            max_range: 1000.0,
            fire_rate: 4.0,
            ..WeaponConfig::default()
        }
    }

    fn ready_weapon() -> Weapon {
        let mut weapon = Weapon::new(test_config()).with_seed(1);
        weapon.set_owning_character(Some(10));
        weapon.tick(0.0);
        weapon.set_is_active(true);
        weapon
    }

    fn world_with_target_at(distance: f32) -> SphereWorld {
        let mut world = SphereWorld::new();
        world.add_target(2, (distance + 10.0, 0.0, 0.0), 10.0);
        world
    }

    #[test]
    fn test_new_weapon_defaults() {
        let weapon = Weapon::new(test_config());
        assert_eq!(weapon.state(), WeaponState::Idle);
        assert!(!weapon.is_active());
        assert_eq!(*weapon.meta_data(), MetaData::default());
        assert_eq!(weapon.wielder(), None);
    }

    #[test]
    fn test_inactive_weapon_does_nothing() {
        let mut weapon = Weapon::new(test_config());
        weapon.set_owning_character(Some(1));
        weapon.tick(0.0);
        let world = world_with_target_at(500.0);

        assert_eq!(weapon.try_shooting(&world), ShotAttempt::Inactive);
        assert_eq!(weapon.state(), WeaponState::Idle);
        assert_eq!(weapon.shots_resolved(), 0);
    }

    #[test]
    fn test_try_shooting_enters_firing_and_arms_cooldown() {
        let mut weapon = ready_weapon();
        let world = world_with_target_at(500.0);

        assert_eq!(weapon.try_shooting(&world), ShotAttempt::Fired { hit: true });
        assert_eq!(weapon.state(), WeaponState::Firing);
        assert_eq!(weapon.cooldown_remaining(), 0.25);
        assert_eq!(weapon.shots_resolved(), 1);

        // Not idle any more
        assert_eq!(weapon.try_shooting(&world), ShotAttempt::NotIdle);

        weapon.finish_shot();
        assert_eq!(weapon.try_shooting(&world), ShotAttempt::CoolingDown);
        weapon.tick(0.25);
        assert!(weapon.try_shooting(&world).fired());
        assert_eq!(weapon.shots_resolved(), 2);
    }

    #[test]
    fn test_continue_firing_requires_firing_state() {
        let mut weapon = ready_weapon();
        let world = SphereWorld::new();

        assert_eq!(weapon.continue_firing(&world), ShotAttempt::NotIdle);
        assert!(weapon.try_shooting(&world).fired());
        assert_eq!(weapon.continue_firing(&world), ShotAttempt::CoolingDown);
        weapon.tick(0.25);
        assert_eq!(weapon.continue_firing(&world), ShotAttempt::Fired { hit: false });
    }

    #[test]
    fn test_deactivate_while_firing_goes_idle() {
        let mut weapon = ready_weapon();
        let world = SphereWorld::new();
        weapon.try_shooting(&world);
        assert_eq!(weapon.state(), WeaponState::Firing);

        weapon.set_is_active(false);
        assert_eq!(weapon.state(), WeaponState::Idle);
        assert_eq!(weapon.shots_resolved(), 1);
    }

    #[test]
    fn test_no_wielder_skips_resolution() {
        let mut weapon = Weapon::new(test_config());
        weapon.set_is_active(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        weapon.add_shot_listener(Box::new(move |hit| sink.lock().unwrap().push(hit)));

        let world = world_with_target_at(100.0);
        assert_eq!(weapon.try_shooting(&world), ShotAttempt::NoWielder);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(weapon.state(), WeaponState::Idle);

        // Recovers once an owner is attached
        weapon.set_owning_character(Some(3));
        weapon.tick(0.0);
        assert!(weapon.try_shooting(&world).fired());
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_listener_receives_range_checked_result() {
        let mut weapon = ready_weapon();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        weapon.add_shot_listener(Box::new(move |hit| sink.lock().unwrap().push(hit)));

        weapon.try_shooting(&world_with_target_at(500.0));
        weapon.finish_shot();
        weapon.tick(1.0);
        weapon.try_shooting(&SphereWorld::new());
        weapon.finish_shot();
        weapon.tick(1.0);
        weapon.try_shooting(&world_with_target_at(1500.0));

        assert_eq!(*seen.lock().unwrap(), vec![true, false, false]);
    }

    #[test]
    fn test_attach_is_lazy_and_idempotent() {
        let mut weapon = Weapon::new(test_config());
        assert!(!weapon.try_to_attach());

        weapon.set_owning_character(Some(5));
        assert_eq!(weapon.wielder(), None);
        assert!(weapon.try_to_attach());
        assert!(!weapon.try_to_attach());
        assert_eq!(weapon.wielder(), Some(5));
    }

    #[test]
    fn test_detach_keeps_weapon_usable_later() {
        let mut weapon = ready_weapon();
        let world = SphereWorld::new();
        weapon.try_shooting(&world);

        weapon.detach();
        assert_eq!(weapon.owning_character(), None);
        assert!(!weapon.has_attached());
        assert_eq!(weapon.state(), WeaponState::Idle);

        weapon.set_owning_character(Some(8));
        weapon.tick(1.0);
        assert_eq!(weapon.wielder(), Some(8));
        assert!(weapon.try_shooting(&world).fired());
    }

    #[test]
    fn test_is_active_callback_once_per_change() {
        let mut weapon = Weapon::new(test_config());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        weapon.on_replicated_change(
            FieldId::IsActive,
            Box::new(move |v| sink.lock().unwrap().push(v.clone())),
        );

        weapon.set_is_active(false);
        weapon.set_is_active(true);
        weapon.set_is_active(true);

        assert_eq!(*seen.lock().unwrap(), vec![ReplicatedValue::IsActive(true)]);
    }

    #[test]
    fn test_meta_data_replicates_to_observer() {
        let mut weapon = Weapon::new(test_config());
        let mut observer = weapon.connect_observer().unwrap();

        weapon.set_meta_data(MetaData { skin: 3 });
        weapon.set_meta_data(MetaData { skin: 3 });

        assert_eq!(observer.poll(), 1);
        assert_eq!(observer.meta_data().skin, 3);
    }

    #[test]
    fn test_bullet_spawn_point_uses_barrel_offset() {
        let mut weapon = Weapon::new(WeaponConfig {
            barrel_offset: 50.0,
            ..test_config()
        });
        weapon.set_aim((0.0, 0.0, 100.0), (0.0, 2.0, 0.0));
        assert_eq!(weapon.bullet_spawn_point(), (0.0, 50.0, 100.0));
        assert_eq!(weapon.line_trace_direction(), (0.0, 1.0, 0.0));
    }

    #[test]
    fn test_do_line_trace_reports_geometry() {
        let weapon = Weapon::new(test_config());
        let mut world = SphereWorld::new();
        world.add_blocker((100.0, 0.0, 0.0), 10.0);

        let hit = weapon.do_line_trace(&world).unwrap();
        assert_eq!(hit.hit_entity, None);
        assert!(weapon.do_line_trace(&SphereWorld::new()).is_none());
    }

    #[test]
    fn test_shot_applies_recoil() {
        let mut weapon = ready_weapon();
        weapon.try_shooting(&SphereWorld::new());

        let kick = weapon.take_recoil();
        assert!(!kick.is_zero());
        assert!(weapon.take_recoil().is_zero());
        assert!(!weapon.recoil_offset().is_zero());
    }

    #[test]
    fn test_first_person_flag() {
        let mut weapon = Weapon::new(test_config());
        assert!(!weapon.is_first_person());

        weapon.set_first_person(true);
        assert!(weapon.is_first_person());
        weapon.set_first_person(false);
        assert!(!weapon.is_first_person());
    }

    #[test]
    fn test_undrained_replication_events_stay_bounded() {
        let mut weapon = Weapon::new(test_config());
        for i in 0..10_000 {
            weapon.set_is_active(i % 2 == 0);
        }
        weapon.set_meta_data(MetaData { skin: 3 });

        let events = weapon.drain_replication_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].value, ReplicatedValue::IsActive(false));
        assert_eq!(events[0].seq, 10_000);
    }

    #[test]
    fn test_last_shot_records_resolution() {
        let mut weapon = ready_weapon();
        assert!(weapon.last_shot().is_none());

        weapon.try_shooting(&world_with_target_at(200.0));
        let shot = weapon.last_shot().unwrap();
        assert!(shot.hit);
        assert_eq!(shot.info.hit_entity, Some(2));
    }
}
