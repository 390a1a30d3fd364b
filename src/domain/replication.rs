use bytes::Bytes;
use serde::{Deserialize, Serialize};
use crate::state::observer::ReplicaObserver;
use crate::utils::buffers::SmallEventVec;

/// Cosmetic/loadout data attached to a weapon by whoever equips it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub skin: i32,
}

/// Fields synchronized to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    IsActive,
    MetaData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicatedValue {
    IsActive(bool),
    MetaData(MetaData),
}

impl ReplicatedValue {
    pub fn field(&self) -> FieldId {
        match self {
            ReplicatedValue::IsActive(_) => FieldId::IsActive,
            ReplicatedValue::MetaData(_) => FieldId::MetaData,
        }
    }
}

/// Wire form of one accepted change. `seq` increases per field.
#[derive(Debug, Clone)]
pub struct ReplicationPacket {
    pub field: FieldId,
    pub seq: u64,
    pub payload: Bytes,
}

impl ReplicationPacket {
    pub fn decode(&self) -> Result<ReplicatedValue, &'static str> {
        let value: ReplicatedValue =
            bincode::deserialize(&self.payload).map_err(|_| "Malformed replication payload")?;
        if value.field() != self.field {
            return Err("Payload does not match packet field");
        }
        Ok(value)
    }
}

/// Change callback for one field
pub type ChangeCallback = Box<dyn FnMut(&ReplicatedValue) + Send>;

/// Propagates authoritative field writes to observers
pub trait ReplicationChannel: Send {
    /// Publish a new value; returns false when the write was suppressed
    fn publish(&mut self, field: FieldId, value: ReplicatedValue) -> bool;

    /// Register a callback invoked once per accepted change of `field`
    fn on_change(&mut self, field: FieldId, callback: ChangeCallback);

    /// Attach a remote observer, if this channel can carry updates off-instance
    fn connect(&mut self) -> Result<ReplicaObserver, &'static str> {
        Err("Channel does not support remote observers")
    }

    /// Changes accepted since the last call, oldest first
    fn drain_events(&mut self) -> SmallEventVec {
        SmallEventVec::new()
    }
}
