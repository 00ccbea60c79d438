use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::EventType;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum CloseReason {
    Freed,
    Shutdown,
}

#[derive(Debug, Default)]
struct QueueState {
    interests: BTreeMap<u32, EventType>,
    pending: BTreeMap<u32, EventType>,
    closed: Option<CloseReason>,
}

impl QueueState {
    fn pop(&mut self) -> Option<(u32, EventType)> {
        let mut entry = self.pending.first_entry()?;
        let index = *entry.key();
        let bits = entry.get().bits();
        let lowest = EventType::from_bits_retain(bits & bits.wrapping_neg());

        entry.get_mut().remove(lowest);
        if entry.get().is_empty() {
            entry.remove();
        }
        Some((index, lowest))
    }
}

/// Interest table and pending events of one event set.
///
/// Pending events are keyed by device index, so popping yields the lowest index first
/// and, within a device, the lowest bit first.
#[derive(Debug)]
pub(crate) struct EventQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl EventQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            ready: Condvar::new(),
        }
    }

    /// Adds `mask` to the interest of the device and returns the effective interest.
    pub(crate) fn register(&self, index: u32, mask: EventType) -> EventType {
        let mut state = self.state.lock();
        let interest = state.interests.entry(index).or_insert_with(EventType::empty);
        interest.insert(mask);
        *interest
    }

    pub(crate) fn registered(&self) -> Vec<u32> {
        self.state.lock().interests.keys().copied().collect()
    }

    /// Records the fired events the set is interested in. Returns whether any was recorded.
    pub(crate) fn deliver(&self, index: u32, fired: EventType) -> bool {
        let mut state = self.state.lock();
        if state.closed.is_some() {
            return false;
        }
        let interest = match state.interests.get(&index) {
            Some(interest) => *interest & fired,
            None => return false,
        };
        if interest.is_empty() {
            return false;
        }

        state.pending.entry(index).or_insert_with(EventType::empty).insert(interest);
        self.ready.notify_all();
        true
    }

    pub(crate) fn close(&self, reason: CloseReason) {
        let mut state = self.state.lock();
        state.closed.get_or_insert(reason);
        state.pending.clear();
        self.ready.notify_all();
    }

    /// Takes the next pending event, parking up to `park` first when nothing is pending.
    pub(crate) fn pop(
        &self,
        park: Option<Duration>,
    ) -> Result<Option<(u32, EventType)>, CloseReason> {
        let mut state = self.state.lock();
        if let Some(timeout) = park {
            if state.closed.is_none() && state.pending.is_empty() {
                self.ready.wait_for(&mut state, timeout);
            }
        }

        match state.closed {
            Some(reason) => Err(reason),
            None => Ok(state.pop()),
        }
    }
}
