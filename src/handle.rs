use std::fmt::Display;

/// An opaque reference to one accelerator device.
///
/// A handle is only meaningful within the session (the interval between
/// [`Library::init`](crate::Library::init) and [`Library::shutdown`](crate::Library::shutdown))
/// that issued it. Every session carries a fresh generation, so a handle kept across a
/// shutdown is rejected even when its index collides with a newly issued one.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DeviceHandle {
    pub(crate) index: u32,
    pub(crate) generation: u64,
}

impl DeviceHandle {
    pub(crate) fn new(index: u32, generation: u64) -> Self {
        Self { index, generation }
    }

    /// Returns the ordinal index of the device, stable within a session.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Display for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "device{}@{}", self.index, self.generation)
    }
}

/// An opaque reference to an event set created by
/// [`Library::event_set_create`](crate::Library::event_set_create).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EventSetHandle {
    pub(crate) id: u64,
    pub(crate) generation: u64,
}

impl EventSetHandle {
    pub(crate) fn new(id: u64, generation: u64) -> Self {
        Self { id, generation }
    }
}

impl Display for EventSetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event_set{}@{}", self.id, self.generation)
    }
}
