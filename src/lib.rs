//! A set of APIs to enumerate AI accelerator devices, read their telemetry and wait for
//! their hardware events.
//!
//! # Usage
//!
//! Add this to your 'Cargo.toml':
//! ```toml
//! [dependencies]
//! accel-device = "0.1"
//! ```
//!
//! ## Sessions and handles
//!
//! Everything starts from a [`Library`], which wraps a [`Backend`]. [`SysfsBackend`] reads
//! the sysfs tree of the habanalabs driver; [`MockBackend`] keeps devices in memory for
//! testing. A session lasts from [`Library::init`] to [`Library::shutdown`]; the
//! [`DeviceHandle`]s and [`EventSetHandle`]s issued in a session are rejected after it.
//! ```rust,no_run
//! # fn main() -> accel_device::DeviceResult<()> {
//! let library = accel_device::Library::from_env()?;
//! library.init()?;
//! let device = library.handle_by_pci_bus_id("0000:19:00.0")?;
//! println!("{} MHz", library.clock_info(device, accel_device::ClockType::Soc)?);
//! library.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Waiting for events
//!
//! An event set collects interest in [`EventType`]s of any number of devices.
//! [`Library::event_set_wait`] blocks until one of them fires or the timeout elapses.
//! ```rust,no_run
//! use accel_device::{DeviceError, EventType, Library};
//!
//! # fn main() -> accel_device::DeviceResult<()> {
//! let library = Library::from_env()?;
//! library.init()?;
//! let set = library.event_set_create()?;
//! for device in library.devices()? {
//!     library.device_register_events(device, EventType::CRITICAL_ERR, set)?;
//! }
//! match library.event_set_wait(set, 5000) {
//!     Ok(record) => println!("{:?} on {}", record.event_type, record.device),
//!     Err(DeviceError::Timeout { .. }) => println!("all healthy"),
//!     Err(e) => return Err(e),
//! }
//! library.event_set_free(set)?;
//! # Ok(())
//! # }
//! ```

// Allows displaying feature flags in the documentation.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use crate::backend::{
    Backend, DeviceIdentity, EventSink, Metric, MetricValue, MockBackend, MockBackendBuilder,
    MockDevice, SysfsBackend, WakeMode,
};
pub use crate::config::{InitFlags, LibraryConfig, LibraryConfigBuilder};
pub use crate::error::{DeviceError, DeviceResult, ReturnCode};
pub use crate::event::{EventRecord, EventType};
pub use crate::handle::{DeviceHandle, EventSetHandle};
pub use crate::library::Library;
pub use crate::pci::{PciAddress, PciInfo};
pub use crate::telemetry::{
    write_c_str, ClockType, EccCounterType, EccMode, EnableState, MacAddress, MacRecord,
    MemoryErrorType, MemoryInfo, PcieUtilCounter, PerformanceState, TemperatureSensor,
    TemperatureThreshold, Utilization,
};

mod backend;
mod config;
mod error;
mod event;
mod handle;
pub mod hwmon;
mod library;
mod pci;
mod registry;
mod sysfs;
mod telemetry;
