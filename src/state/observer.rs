use std::collections::HashMap;
use smallvec::SmallVec;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use crate::domain::replication::{
    ChangeCallback, FieldId, MetaData, ReplicatedValue, ReplicationPacket,
};

/// Remote copy of a weapon's replicated fields
///
/// Applies packets on its own update cycle. Stale packets (sequence not
/// newer than the last one applied for that field) are discarded.
pub struct ReplicaObserver {
    rx: mpsc::UnboundedReceiver<ReplicationPacket>,
    is_active: bool,
    meta_data: MetaData,
    last_seq: HashMap<FieldId, u64>,
    callbacks: HashMap<FieldId, SmallVec<[ChangeCallback; 2]>>,
}

impl ReplicaObserver {
    pub fn new(rx: mpsc::UnboundedReceiver<ReplicationPacket>) -> Self {
        Self {
            rx,
            is_active: false,
            meta_data: MetaData::default(),
            last_seq: HashMap::new(),
            callbacks: HashMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn meta_data(&self) -> &MetaData {
        &self.meta_data
    }

    pub fn on_change(&mut self, field: FieldId, callback: ChangeCallback) {
        self.callbacks.entry(field).or_default().push(callback);
    }

    /// Apply one packet; Ok(true) when the cached value changed
    pub fn apply(&mut self, packet: ReplicationPacket) -> Result<bool, &'static str> {
        if let Some(last) = self.last_seq.get(&packet.field) {
            if packet.seq <= *last {
                return Ok(false);
            }
        }

        let value = packet.decode()?;
        self.last_seq.insert(packet.field, packet.seq);

        let changed = match &value {
            ReplicatedValue::IsActive(active) => {
                let changed = self.is_active != *active;
                self.is_active = *active;
                changed
            }
            ReplicatedValue::MetaData(meta) => {
                let changed = self.meta_data != *meta;
                self.meta_data = meta.clone();
                changed
            }
        };

        if changed {
            if let Some(callbacks) = self.callbacks.get_mut(&packet.field) {
                for callback in callbacks.iter_mut() {
                    callback(&value);
                }
            }
        }
        Ok(changed)
    }

    /// Apply everything queued so far; returns how many fields changed
    pub fn poll(&mut self) -> usize {
        let mut changed = 0;
        loop {
            let packet = match self.rx.try_recv() {
                Ok(packet) => packet,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            match self.apply(packet) {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Discarded replication packet: {}", e),
            }
        }
        changed
    }

    /// Wait until a packet changes a field. None once the hub is gone.
    pub async fn next_change(&mut self) -> Option<FieldId> {
        while let Some(packet) = self.rx.recv().await {
            let field = packet.field;
            match self.apply(packet) {
                Ok(true) => return Some(field),
                Ok(false) => {}
                Err(e) => log::warn!("Discarded replication packet: {}", e),
            }
        }
        None
    }
}
