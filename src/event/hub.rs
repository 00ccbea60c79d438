use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{trace, warn};

use super::queue::{CloseReason, EventQueue};
use super::EventType;
use crate::error::{DeviceError, DeviceResult};

/// Event sets of one session and the fan-out of fired events to them.
#[derive(Debug)]
pub(crate) struct EventHub {
    /// backend device id -> handle index
    ordinals: HashMap<u32, u32>,
    sets: Mutex<HashMap<u64, Arc<EventQueue>>>,
    next_id: AtomicU64,
    max_sets: usize,
}

impl EventHub {
    pub(crate) fn new(ordinals: HashMap<u32, u32>, max_sets: usize) -> Self {
        Self {
            ordinals,
            sets: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            max_sets,
        }
    }

    pub(crate) fn create(&self) -> DeviceResult<u64> {
        let mut sets = self.sets.lock();
        if sets.len() >= self.max_sets {
            return Err(DeviceError::out_of_memory(format!(
                "{} event sets are already allocated",
                sets.len()
            )));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        sets.insert(id, Arc::new(EventQueue::new()));
        Ok(id)
    }

    pub(crate) fn get(&self, id: u64) -> DeviceResult<Arc<EventQueue>> {
        self.sets
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| DeviceError::invalid_argument(format!("event set {id} is not allocated")))
    }

    pub(crate) fn free(&self, id: u64) -> DeviceResult<()> {
        let queue = self
            .sets
            .lock()
            .remove(&id)
            .ok_or_else(|| DeviceError::invalid_argument(format!("event set {id} is not allocated")))?;
        queue.close(CloseReason::Freed);
        Ok(())
    }

    pub(crate) fn close_all(&self) {
        let sets: Vec<_> = self.sets.lock().drain().map(|(_, queue)| queue).collect();
        for queue in sets {
            queue.close(CloseReason::Shutdown);
        }
    }

    /// Hands the events fired on a backend device to every set interested in them.
    pub(crate) fn deliver(&self, device_id: u32, fired: EventType) {
        let index = match self.ordinals.get(&device_id) {
            Some(index) => *index,
            None => {
                warn!("Dropping events {fired:?} of unknown device {device_id}");
                return;
            }
        };

        let sets: Vec<_> = self.sets.lock().values().cloned().collect();
        let delivered = sets
            .iter()
            .filter(|queue| queue.deliver(index, fired))
            .count();
        trace!("Delivered {fired:?} of device {index} to {delivered} event set(s)");
    }
}

/// The push path from a backend into the current session's event sets.
///
/// Events pushed after the session has ended are dropped.
#[derive(Clone, Debug)]
pub struct EventSink {
    hub: Weak<EventHub>,
}

impl EventSink {
    pub(crate) fn new(hub: &Arc<EventHub>) -> Self {
        Self {
            hub: Arc::downgrade(hub),
        }
    }

    /// Reports that `events` fired on the backend device `device_id`.
    pub fn notify(&self, device_id: u32, events: EventType) {
        if events.is_empty() {
            return;
        }
        match self.hub.upgrade() {
            Some(hub) => hub.deliver(device_id, events),
            None => trace!("Session is over, dropping {events:?} of device {device_id}"),
        }
    }

    /// Whether the session this sink was handed out for is still alive.
    pub fn is_attached(&self) -> bool {
        self.hub.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> Arc<EventHub> {
        // backend ids 4 and 7 map to indexes 0 and 1
        Arc::new(EventHub::new(HashMap::from([(4, 0), (7, 1)]), 2))
    }

    #[test]
    fn test_create_limit() -> DeviceResult<()> {
        let hub = hub();
        let first = hub.create()?;
        let second = hub.create()?;
        assert_ne!(first, second);
        assert!(matches!(hub.create(), Err(DeviceError::OutOfMemory { .. })));

        hub.free(first)?;
        assert!(hub.create().is_ok());
        assert!(matches!(
            hub.free(first),
            Err(DeviceError::InvalidArgument { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_fan_out_is_independent() -> DeviceResult<()> {
        let hub = hub();
        let a = hub.get(hub.create()?)?;
        let b = hub.get(hub.create()?)?;
        a.register(1, EventType::ECC_ERR);
        b.register(1, EventType::ECC_ERR | EventType::CLOCK_RATE);

        let sink = EventSink::new(&hub);
        sink.notify(7, EventType::ECC_ERR | EventType::CLOCK_RATE);
        sink.notify(99, EventType::ECC_ERR);

        assert_eq!(a.pop(None), Ok(Some((1, EventType::ECC_ERR))));
        assert_eq!(a.pop(None), Ok(None));
        assert_eq!(b.pop(None), Ok(Some((1, EventType::ECC_ERR))));
        assert_eq!(b.pop(None), Ok(Some((1, EventType::CLOCK_RATE))));
        Ok(())
    }

    #[test]
    fn test_sink_detaches_with_hub() -> DeviceResult<()> {
        let hub = hub();
        let queue = hub.get(hub.create()?)?;
        queue.register(0, EventType::all());
        let sink = EventSink::new(&hub);
        assert!(sink.is_attached());

        hub.close_all();
        drop(hub);
        assert!(!sink.is_attached());
        sink.notify(4, EventType::ECC_ERR);
        assert_eq!(queue.pop(None), Err(CloseReason::Shutdown));
        Ok(())
    }
}
