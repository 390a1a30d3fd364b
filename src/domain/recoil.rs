use rand::Rng;
use crate::utils::config::RecoilConfig;

/// Controller rotation to add after a shot, in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecoilKick {
    pub yaw: f32,
    pub pitch: f32,
}

impl RecoilKick {
    pub fn is_zero(&self) -> bool {
        self.yaw == 0.0 && self.pitch == 0.0
    }
}

/// Wielder posture that scales recoil
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stance {
    pub crouching: bool,
    pub aiming: bool,
}

/// Accumulated recoil offset plus the kick not yet applied by the wielder
#[derive(Debug, Clone, Default)]
pub struct RecoilState {
    offset: RecoilKick,
    pending: RecoilKick,
}

fn sample(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

fn toward_zero(value: f32, amount: f32) -> f32 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else {
        (value + amount).min(0.0)
    }
}

impl RecoilState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roll a kick for one shot and add it to the offset and pending kick
    pub fn kick(&mut self, cfg: &RecoilConfig, stance: Stance, rng: &mut impl Rng) -> RecoilKick {
        let mut modifier = 1.0;
        if stance.crouching {
            modifier *= cfg.crouch_modifier;
        }
        if stance.aiming {
            modifier *= cfg.aim_modifier;
        }

        let yaw = sample(rng, cfg.yaw_min, cfg.yaw_max);
        let yaw = if rng.gen::<f32>() < cfg.right_bias { yaw } else { -yaw };
        let pitch = sample(rng, cfg.pitch_min, cfg.pitch_max);
        let pitch = if rng.gen::<f32>() < cfg.up_bias { pitch } else { -pitch };

        let kick = RecoilKick {
            yaw: yaw * modifier,
            pitch: pitch * modifier,
        };

        self.offset.yaw += kick.yaw;
        self.offset.pitch += kick.pitch;
        self.pending.yaw += kick.yaw;
        self.pending.pitch += kick.pitch;
        kick
    }

    /// Move the accumulated offset back toward rest
    pub fn recover(&mut self, rate: f32, dt: f32) {
        let amount = (rate * dt).max(0.0);
        self.offset.yaw = toward_zero(self.offset.yaw, amount);
        self.offset.pitch = toward_zero(self.offset.pitch, amount);
    }

    pub fn offset(&self) -> RecoilKick {
        self.offset
    }

    /// Drain the kick the wielder has not applied yet
    pub fn take_pending(&mut self) -> RecoilKick {
        std::mem::take(&mut self.pending)
    }
}
