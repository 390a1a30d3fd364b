use bytes::Bytes;
use serde::Serialize;
use smallvec::SmallVec;
use crate::domain::replication::{FieldId, ReplicatedValue};

/// Type alias for small collections that avoid allocations
pub type SmallEventVec = SmallVec<[ReplicationEvent; 8]>;

/// One accepted change of a replicated field
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationEvent {
    pub field: FieldId,
    pub seq: u64,
    pub value: ReplicatedValue,
}

/// Reusable buffer for packet serialization
pub struct PacketBuffer {
    buffer: Vec<u8>,
}

impl PacketBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Encode `value` with bincode, reusing the allocation between calls
    pub fn encode<T: Serialize>(&mut self, value: &T) -> Result<Bytes, &'static str> {
        self.clear();
        bincode::serialize_into(&mut self.buffer, value)
            .map_err(|_| "Failed to encode packet")?;
        Ok(Bytes::copy_from_slice(&self.buffer))
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(256)
    }
}
