use std::collections::HashMap;
use smallvec::SmallVec;
use tokio::sync::mpsc;
use crate::domain::replication::{
    ChangeCallback, FieldId, ReplicatedValue, ReplicationChannel, ReplicationPacket,
};
use crate::state::observer::ReplicaObserver;
use crate::utils::buffers::{PacketBuffer, ReplicationEvent, SmallEventVec};

/// Last accepted value of one field
#[derive(Debug, Clone)]
struct FieldSlot {
    seq: u64,
    value: ReplicatedValue,
}

/// Authoritative side of replication
///
/// Suppresses writes equal to the current value, runs local callbacks once
/// per accepted change and forwards encoded packets to every connected
/// observer.
pub struct ReplicationHub {
    fields: HashMap<FieldId, FieldSlot>,
    callbacks: HashMap<FieldId, SmallVec<[ChangeCallback; 2]>>,
    links: Vec<mpsc::UnboundedSender<ReplicationPacket>>,
    pending: SmallEventVec,
    buffer: PacketBuffer,
}

impl ReplicationHub {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
            callbacks: HashMap::new(),
            links: Vec::new(),
            pending: SmallEventVec::new(),
            buffer: PacketBuffer::default(),
        }
    }

    /// Set the starting value of a field without notifying anyone
    pub fn seed(&mut self, value: ReplicatedValue) {
        self.fields.insert(value.field(), FieldSlot { seq: 0, value });
    }

    pub fn current(&self, field: FieldId) -> Option<&ReplicatedValue> {
        self.fields.get(&field).map(|slot| &slot.value)
    }

    /// Number of accepted changes for `field`
    pub fn seq(&self, field: FieldId) -> u64 {
        self.fields.get(&field).map(|slot| slot.seq).unwrap_or(0)
    }

    pub fn observer_count(&self) -> usize {
        self.links.len()
    }

    fn fan_out(&mut self, field: FieldId, seq: u64, value: &ReplicatedValue) {
        if self.links.is_empty() {
            return;
        }

        let payload = match self.buffer.encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Change of {:?} not replicated: {}", field, e);
                return;
            }
        };

        let before = self.links.len();
        self.links.retain(|link| {
            link.send(ReplicationPacket {
                field,
                seq,
                payload: payload.clone(),
            })
            .is_ok()
        });
        let dropped = before - self.links.len();
        if dropped > 0 {
            log::info!("Dropped {} disconnected observer(s)", dropped);
        }
    }
}

impl Default for ReplicationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationChannel for ReplicationHub {
    fn publish(&mut self, field: FieldId, value: ReplicatedValue) -> bool {
        if value.field() != field {
            log::warn!("Rejected publish: {:?} does not carry {:?}", value, field);
            return false;
        }

        let seq = match self.fields.get(&field) {
            Some(slot) if slot.value == value => return false,
            Some(slot) => slot.seq + 1,
            None => 1,
        };
        self.fields.insert(field, FieldSlot { seq, value: value.clone() });

        if let Some(callbacks) = self.callbacks.get_mut(&field) {
            for callback in callbacks.iter_mut() {
                callback(&value);
            }
        }

        self.fan_out(field, seq, &value);

        // At most one pending event per field
        self.pending.retain(|event| event.field != field);
        self.pending.push(ReplicationEvent { field, seq, value });
        true
    }

    fn on_change(&mut self, field: FieldId, callback: ChangeCallback) {
        self.callbacks.entry(field).or_default().push(callback);
    }

    /// New observers start with a snapshot of every field
    fn connect(&mut self) -> Result<ReplicaObserver, &'static str> {
        let (tx, rx) = mpsc::unbounded_channel();

        for (field, slot) in &self.fields {
            let payload = match self.buffer.encode(&slot.value) {
                Ok(payload) => payload,
                Err(e) => {
                    log::warn!("Snapshot of {:?} not sent: {}", field, e);
                    continue;
                }
            };
            let _ = tx.send(ReplicationPacket {
                field: *field,
                seq: slot.seq,
                payload,
            });
        }

        self.links.push(tx);
        log::info!("Observer connected ({} total)", self.links.len());
        Ok(ReplicaObserver::new(rx))
    }

    fn drain_events(&mut self) -> SmallEventVec {
        std::mem::take(&mut self.pending)
    }
}
