use crate::domain::hit_test::TraceChannel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Tag used when logging weapon line traces
pub const DEFAULT_TRACE_TAG: &str = "GDKTrace";

static TRACE_TAG: OnceLock<String> = OnceLock::new();

/// Set the process-wide trace tag. Only the first call (before any read) wins.
pub fn init_trace_tag(tag: &str) -> Result<(), &'static str> {
    TRACE_TAG
        .set(tag.to_string())
        .map_err(|_| "Trace tag already initialized")
}

/// Process-wide trace tag; falls back to the default and freezes it on first read
pub fn trace_tag() -> &'static str {
    TRACE_TAG.get_or_init(|| DEFAULT_TRACE_TAG.to_string())
}

/// Server configuration - immutable after load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_rate_hz: u32,
    pub log_level: String,
    pub trace_tag: String,
    pub weapon_id: u32,
    pub demo_duration_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            log_level: "debug".to_string(),
            trace_tag: DEFAULT_TRACE_TAG.to_string(),
            weapon_id: 1,
            demo_duration_secs: 3,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Never zero; rates above 1000 Hz run at 1 ms
    pub fn tick_interval_ms(&self) -> u64 {
        (1000 / self.tick_rate_hz.max(1) as u64).max(1)
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// How a weapon repeats shots while the trigger is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireMode {
    SingleShot,
    Automatic,
    Burst { shots: u32 },
}

/// Recoil applied as input to the wielder's controller rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoilConfig {
    pub yaw_min: f32,
    pub yaw_max: f32,
    /// Probability that a yaw kick goes right
    pub right_bias: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    /// Probability that a pitch kick goes up
    pub up_bias: f32,
    pub crouch_modifier: f32,
    pub aim_modifier: f32,
    /// Degrees per second recovered toward rest
    pub recovery_rate: f32,
}

impl Default for RecoilConfig {
    fn default() -> Self {
        Self {
            yaw_min: 0.1,
            yaw_max: 0.4,
            right_bias: 0.5,
            pitch_min: 0.5,
            pitch_max: 1.0,
            up_bias: 0.5,
            crouch_modifier: 0.5,
            aim_modifier: 0.5,
            recovery_rate: 1.0,
        }
    }
}

/// Per-weapon tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub name: String,
    /// Maximum range of the hitscan
    pub max_range: f32,
    /// Shots per second
    pub fire_rate: f32,
    pub fire_mode: FireMode,
    pub trace_channel: TraceChannel,
    pub draw_debug_line_trace: bool,
    /// Distance from the aim origin to the muzzle
    pub barrel_offset: f32,
    pub aiming_fov: f32,
    pub aiming_rotation_speed: f32,
    pub reticle_size: (f32, f32),
    pub recoil: RecoilConfig,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: "Rifle".to_string(),
            max_range: 10_000.0,
            fire_rate: 4.0,
            fire_mode: FireMode::SingleShot,
            trace_channel: TraceChannel::WorldStatic,
            draw_debug_line_trace: false,
            barrel_offset: 0.0,
            aiming_fov: 55.0,
            aiming_rotation_speed: 1.0,
            reticle_size: (16.0, 16.0),
            recoil: RecoilConfig::default(),
        }
    }
}

impl WeaponConfig {
    /// Seconds between shots
    pub fn refire_interval(&self) -> f32 {
        if self.fire_rate <= 0.0 {
            return 0.0;
        }
        1.0 / self.fire_rate
    }
}
