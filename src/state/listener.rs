/// Callback told whether each resolved shot hit
pub type ShotListener = Box<dyn FnMut(bool) + Send>;

/// Holds at most one shot listener
#[derive(Default)]
pub struct ShotListenerSlot {
    listener: Option<ShotListener>,
}

impl ShotListenerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, replacing any previous one
    pub fn set(&mut self, listener: ShotListener) {
        if self.listener.replace(listener).is_some() {
            log::debug!("Shot listener replaced");
        }
    }

    pub fn clear(&mut self) {
        self.listener = None;
    }

    pub fn is_set(&self) -> bool {
        self.listener.is_some()
    }

    /// Deliver a result; returns false when nobody is listening
    pub fn notify(&mut self, hit: bool) -> bool {
        match self.listener.as_mut() {
            Some(listener) => {
                listener(hit);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ShotListenerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShotListenerSlot")
            .field("is_set", &self.is_set())
            .finish()
    }
}
