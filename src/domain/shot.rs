use crate::domain::hit_test::{HitInfo, HitTestProvider, TraceChannel};
use crate::utils::vector::{self, Vec3};

/// Outcome of one resolved shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotResult {
    pub hit: bool,
    pub info: HitInfo,
    /// Distance from the muzzle to the trace contact, if anything was struck
    pub distance: Option<f32>,
}

impl ShotResult {
    fn miss() -> Self {
        Self {
            hit: false,
            info: HitInfo::default(),
            distance: None,
        }
    }
}

/// Trace from the muzzle and decide hit or miss
///
/// A hit needs a struck entity within `max_range`. Plain geometry, nothing
/// at all, and a failing provider are all misses.
pub fn resolve_shot(
    provider: &dyn HitTestProvider,
    origin: Vec3,
    direction: Vec3,
    max_range: f32,
    channel: TraceChannel,
) -> ShotResult {
    let info = match provider.probe(origin, direction, max_range, channel) {
        Ok(Some(info)) => info,
        Ok(None) => return ShotResult::miss(),
        Err(e) => {
            log::warn!("Hit test failed, counting shot as a miss: {}", e);
            return ShotResult::miss();
        }
    };

    let distance = vector::distance(origin, info.location);
    let hit = info.hit_entity.is_some() && distance <= max_range;

    ShotResult {
        hit,
        info,
        distance: Some(distance),
    }
}
