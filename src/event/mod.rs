mod hub;
mod queue;

use std::sync::Arc;
use std::time::{Duration, Instant};

use bitflags::bitflags;
use tracing::{debug, trace};

pub(crate) use hub::EventHub;
pub use hub::EventSink;
use queue::{CloseReason, EventQueue};

use crate::backend::WakeMode;
use crate::error::{DeviceError, DeviceResult};
use crate::handle::{DeviceHandle, EventSetHandle};
use crate::library::Session;
use crate::Library;

bitflags! {
    /// Classes of hardware events a device can raise.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventType: u64 {
        const ECC_ERR = 1 << 0;
        const CRITICAL_ERR = 1 << 1;
        const CLOCK_RATE = 1 << 2;
    }
}

impl EventType {
    /// Accepts a raw mask of known, non-zero bits.
    pub fn from_raw(raw: u64) -> DeviceResult<Self> {
        Self::from_bits_retain(raw).checked()
    }

    fn checked(self) -> DeviceResult<Self> {
        if self.is_empty() {
            return Err(DeviceError::invalid_argument("empty event mask"));
        }
        let unknown = self.bits() & !Self::all().bits();
        if unknown != 0 {
            return Err(DeviceError::invalid_argument(format!(
                "unknown event bits {unknown:#x}"
            )));
        }
        Ok(self)
    }
}

/// An event returned by [`Library::event_set_wait`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EventRecord {
    pub device: DeviceHandle,
    /// Exactly one of the bits the set registered for on `device`.
    pub event_type: EventType,
}

impl From<CloseReason> for DeviceError {
    fn from(reason: CloseReason) -> Self {
        match reason {
            CloseReason::Freed => DeviceError::invalid_argument("event set was freed"),
            CloseReason::Shutdown => DeviceError::Uninitialized,
        }
    }
}

impl Session {
    fn event_queue(&self, set: EventSetHandle) -> DeviceResult<Arc<EventQueue>> {
        if set.generation != self.generation {
            return Err(DeviceError::invalid_argument(format!(
                "{set} belongs to a previous session"
            )));
        }
        self.events.get(set.id)
    }
}

impl Library {
    pub fn event_set_create(&self) -> DeviceResult<EventSetHandle> {
        self.with_session(|session| {
            let id = session.events.create()?;
            let set = EventSetHandle::new(id, session.generation);
            debug!("Created {set}");
            Ok(set)
        })
    }

    /// Frees the set. A thread blocked in [`Library::event_set_wait`] on it returns
    /// [`DeviceError::InvalidArgument`].
    pub fn event_set_free(&self, set: EventSetHandle) -> DeviceResult<()> {
        self.with_session(|session| {
            session.event_queue(set)?;
            session.events.free(set.id)?;
            debug!("Freed {set}");
            Ok(())
        })
    }

    /// Adds `mask` to the events `set` waits for on `device`, and returns the resulting
    /// interest of the set in the device.
    ///
    /// Bits the device cannot raise are dropped; if none is left, this fails with
    /// [`DeviceError::NotSupported`].
    pub fn device_register_events(
        &self,
        device: DeviceHandle,
        mask: EventType,
        set: EventSetHandle,
    ) -> DeviceResult<EventType> {
        self.with_session(|session| {
            let id = session.registry.validate(device)?.id;
            let mask = mask.checked()?;
            let queue = session.event_queue(set)?;

            let supported = mask & self.backend.supported_events(id);
            if supported.is_empty() {
                return Err(DeviceError::not_supported(format!(
                    "events {mask:?} on {device}"
                )));
            }

            // events that were pending before this registration belong to the sets registered so far
            self.poll_backend(session, id)?;
            let interest = queue.register(device.index, supported);
            debug!("Registered {supported:?} of {device} to {set}");
            Ok(interest)
        })
    }

    pub fn device_register_events_raw(
        &self,
        device: DeviceHandle,
        mask: u64,
        set: EventSetHandle,
    ) -> DeviceResult<EventType> {
        self.device_register_events(device, EventType::from_bits_retain(mask), set)
    }

    /// Blocks until one of the registered events fires on any device of `set`, or until
    /// `timeout_ms` elapses.
    ///
    /// A timeout of `0` checks once without blocking. When several events are pending,
    /// the one of the lowest device index is returned first, and within a device the
    /// lowest bit. The others stay pending for the next call.
    ///
    /// If a registered device cannot be polled (e.g. [`DeviceError::DeviceLost`]), its
    /// error is returned only when no event of another device is pending.
    pub fn event_set_wait(&self, set: EventSetHandle, timeout_ms: u32) -> DeviceResult<EventRecord> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        let queue = self.with_session(|session| session.event_queue(set))?;
        if queue.registered().is_empty() {
            return Err(DeviceError::invalid_argument(format!(
                "no device is registered to {set}"
            )));
        }

        let wake_mode = self.backend.wake_mode();
        loop {
            if let Some(record) = queue.pop(None)? {
                return Ok(self.record(set, record));
            }

            // a device failing to poll must not hide the events of the others
            let poll_error = self.with_session(|session| {
                if session.generation != set.generation {
                    return Err(DeviceError::Uninitialized);
                }
                let mut first_error = None;
                for index in queue.registered() {
                    let id = session.registry.identity(index)?.id;
                    if let Err(e) = self.poll_backend(session, id) {
                        debug!("Polling device {id} for {set} failed: {e}");
                        first_error.get_or_insert(e);
                    }
                }
                Ok(first_error)
            })?;

            if let Some(record) = queue.pop(None)? {
                return Ok(self.record(set, record));
            }
            if let Some(e) = poll_error {
                return Err(e);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DeviceError::Timeout { timeout_ms });
            }
            let park = match wake_mode {
                WakeMode::Native => remaining,
                WakeMode::Polling(interval) => remaining.min(interval),
            };
            if let Some(record) = queue.pop(Some(park))? {
                return Ok(self.record(set, record));
            }
        }
    }

    /// Runs [`Library::event_set_wait`] on the blocking thread pool of the tokio runtime.
    pub async fn event_set_wait_async(
        self: Arc<Self>,
        set: EventSetHandle,
        timeout_ms: u32,
    ) -> DeviceResult<EventRecord> {
        tokio::task::spawn_blocking(move || self.event_set_wait(set, timeout_ms))
            .await
            .map_err(|e| DeviceError::Unknown {
                message: e.to_string(),
            })?
    }

    fn poll_backend(&self, session: &Session, id: u32) -> DeviceResult<()> {
        let fired = self.backend.poll_events(id)?;
        if !fired.is_empty() {
            session.events.deliver(id, fired);
        }
        Ok(())
    }

    fn record(&self, set: EventSetHandle, (index, event_type): (u32, EventType)) -> EventRecord {
        let record = EventRecord {
            device: DeviceHandle::new(index, set.generation),
            event_type,
        };
        trace!("{set} observed {event_type:?} of {}", record.device);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_values() {
        assert_eq!(EventType::ECC_ERR.bits(), 1);
        assert_eq!(EventType::CRITICAL_ERR.bits(), 2);
        assert_eq!(EventType::CLOCK_RATE.bits(), 4);
    }

    #[test]
    fn test_from_raw() -> DeviceResult<()> {
        assert_eq!(
            EventType::from_raw(0x5)?,
            EventType::ECC_ERR | EventType::CLOCK_RATE
        );
        assert!(matches!(
            EventType::from_raw(0),
            Err(DeviceError::InvalidArgument { .. })
        ));
        assert!(matches!(
            EventType::from_raw(0x9),
            Err(DeviceError::InvalidArgument { .. })
        ));
        Ok(())
    }
}
