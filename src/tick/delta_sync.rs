use serde_json::{json, Value};
use crate::domain::replication::ReplicatedValue;
use crate::state::weapon::Weapon;
use crate::utils::buffers::{ReplicationEvent, SmallEventVec};

/// Collect the replicated changes the weapon accepted this frame
pub fn collect_changes(weapon: &mut Weapon) -> SmallEventVec {
    weapon.drain_replication_events()
}

/// JSON form of a change, for logs and debug tooling
pub fn describe(event: &ReplicationEvent) -> Value {
    match &event.value {
        ReplicatedValue::IsActive(is_active) => json!({
            "type": "is_active_changed",
            "seq": event.seq,
            "is_active": is_active
        }),
        ReplicatedValue::MetaData(meta_data) => json!({
            "type": "meta_data_changed",
            "seq": event.seq,
            "meta_data": meta_data
        }),
    }
}
