//! The seam between the library and the hardware.
//!
//! A [`Backend`] answers point-in-time metric reads for a device and reports hardware
//! events, either by pushing them into an [`EventSink`] or by returning them from
//! [`Backend::poll_events`]. The library owns all session state; a backend only has to
//! know its own device ids.

use std::fmt::Debug;
use std::time::Duration;

use strum_macros::AsRefStr;

pub use crate::event::EventSink;
use crate::error::{DeviceError, DeviceResult};
use crate::event::EventType;
use crate::pci::{PciAddress, PciInfo};
use crate::telemetry::{
    ClockType, EccCounterType, EccMode, MacAddress, MemoryErrorType, PcieUtilCounter,
    PerformanceState, TemperatureSensor, TemperatureThreshold,
};

mod mock;
mod sysfs;

pub use mock::{MockBackend, MockBackendBuilder, MockDevice};
pub use sysfs::SysfsBackend;

/// What discovery reports about one device. Cached by the library for the whole session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceIdentity {
    /// The backend's own id for the device (e.g. `3` for `hl3`).
    pub id: u32,
    pub pci_address: PciAddress,
    pub uuid: String,
    pub minor: u32,
    pub serial: Option<String>,
}

/// A metric a backend may be asked to read.
#[derive(AsRefStr, Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Metric {
    Name,
    PciInfo,
    Clock(ClockType),
    MaxClock(ClockType),
    Utilization,
    Memory,
    Temperature(TemperatureSensor),
    TemperatureThreshold(TemperatureThreshold),
    PersistenceMode,
    PerformanceState,
    PowerUsage,
    PowerDefaultLimit,
    EccMode,
    TotalEccErrors(MemoryErrorType, EccCounterType),
    Serial,
    BoardId,
    MacAddresses,
    PcieThroughput(PcieUtilCounter),
    PcieReplayCounter,
    ClockThrottleReasons,
    EnergyConsumption,
}

/// A value read from a backend. The expected shape depends on the [`Metric`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MetricValue {
    Text(String),
    U32(u32),
    U64(u64),
    Enabled(bool),
    EccMode(EccMode),
    PState(PerformanceState),
    Pci(PciInfo),
    Memory { total: u64, used: u64 },
    Macs(Vec<MacAddress>),
}

impl MetricValue {
    pub(crate) fn unexpected(metric: Metric, value: &MetricValue) -> DeviceError {
        DeviceError::unexpected_value(format!("{} returned {:?}", metric.as_ref(), value))
    }
}

/// How a backend wakes up waiters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WakeMode {
    /// Events are pushed through the [`EventSink`] as they happen.
    Native,
    /// Events only show up in [`Backend::poll_events`], which is polled at this period.
    Polling(Duration),
}

pub trait Backend: Send + Sync + Debug {
    /// Enumerates the devices present. Called once per session.
    fn discover(&self) -> DeviceResult<Vec<DeviceIdentity>>;

    fn read_metric(&self, device: u32, metric: Metric) -> DeviceResult<MetricValue>;

    /// Event classes the device is able to raise.
    fn supported_events(&self, device: u32) -> EventType;

    /// Returns and consumes the events that became pending since the previous call.
    fn poll_events(&self, device: u32) -> DeviceResult<EventType>;

    fn wake_mode(&self) -> WakeMode;

    /// Called when a session starts.
    fn attach(&self, sink: EventSink) -> DeviceResult<()>;

    /// Called when a session ends.
    fn release(&self);

    fn driver_version(&self) -> DeviceResult<String> {
        Err(DeviceError::not_supported("driver version"))
    }
}
