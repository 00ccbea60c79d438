use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use parking_lot::Mutex;

use super::{Backend, DeviceIdentity, Metric, MetricValue, WakeMode};
use crate::error::{DeviceError, DeviceResult};
use crate::event::{EventSink, EventType};
use crate::pci::PciAddress;

/// An in-memory device of a [`MockBackend`].
#[derive(Clone, Debug)]
pub struct MockDevice {
    identity: DeviceIdentity,
    metrics: HashMap<Metric, MetricValue>,
    supported_events: EventType,
}

impl MockDevice {
    /// A device supporting every event class and no metric.
    pub fn new(id: u32, pci_address: PciAddress, uuid: &str) -> Self {
        Self {
            identity: DeviceIdentity {
                id,
                pci_address,
                uuid: uuid.to_string(),
                minor: id,
                serial: None,
            },
            metrics: HashMap::new(),
            supported_events: EventType::all(),
        }
    }

    pub fn minor(mut self, minor: u32) -> Self {
        self.identity.minor = minor;
        self
    }

    pub fn serial(mut self, serial: &str) -> Self {
        self.identity.serial = Some(serial.to_string());
        self
    }

    pub fn metric(mut self, metric: Metric, value: MetricValue) -> Self {
        self.metrics.insert(metric, value);
        self
    }

    pub fn supported_events(mut self, events: EventType) -> Self {
        self.supported_events = events;
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    sink: Option<EventSink>,
    /// events injected in polling mode, waiting for `poll_events`
    queued: HashMap<u32, EventType>,
    lost: Vec<u32>,
}

/// A [`Backend`] whose devices, metrics and events are set up by the caller.
///
/// Events are raised with [`MockBackend::inject_event`]. In [`WakeMode::Native`] they are
/// pushed to the session at once; in [`WakeMode::Polling`] they wait for the next poll.
#[derive(Debug)]
pub struct MockBackend {
    devices: Mutex<BTreeMap<u32, MockDevice>>,
    wake_mode: WakeMode,
    driver_loaded: bool,
    driver_version: Option<String>,
    state: Mutex<MockState>,
}

#[derive(Debug)]
pub struct MockBackendBuilder {
    devices: Vec<MockDevice>,
    wake_mode: WakeMode,
    driver_loaded: bool,
    driver_version: Option<String>,
}

impl MockBackendBuilder {
    pub fn device(mut self, device: MockDevice) -> Self {
        self.devices.push(device);
        self
    }

    pub fn wake_mode(mut self, wake_mode: WakeMode) -> Self {
        self.wake_mode = wake_mode;
        self
    }

    pub fn polling(self, interval: Duration) -> Self {
        self.wake_mode(WakeMode::Polling(interval))
    }

    /// Makes discovery fail with [`DeviceError::DriverNotLoaded`].
    pub fn driver_not_loaded(mut self) -> Self {
        self.driver_loaded = false;
        self
    }

    pub fn driver_version(mut self, version: &str) -> Self {
        self.driver_version = Some(version.to_string());
        self
    }

    pub fn build(self) -> MockBackend {
        MockBackend {
            devices: Mutex::new(
                self.devices
                    .into_iter()
                    .map(|d| (d.identity.id, d))
                    .collect(),
            ),
            wake_mode: self.wake_mode,
            driver_loaded: self.driver_loaded,
            driver_version: self.driver_version,
            state: Mutex::new(MockState::default()),
        }
    }
}

impl MockBackend {
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder {
            devices: vec![],
            wake_mode: WakeMode::Native,
            driver_loaded: true,
            driver_version: None,
        }
    }

    /// Raises `events` on the device with backend id `device`.
    pub fn inject_event(&self, device: u32, events: EventType) {
        match self.wake_mode {
            WakeMode::Native => {
                let sink = self.state.lock().sink.clone();
                if let Some(sink) = sink {
                    sink.notify(device, events);
                }
            }
            WakeMode::Polling(_) => {
                self.state
                    .lock()
                    .queued
                    .entry(device)
                    .or_insert_with(EventType::empty)
                    .insert(events);
            }
        }
    }

    pub fn set_metric(&self, device: u32, metric: Metric, value: MetricValue) {
        if let Some(d) = self.devices.lock().get_mut(&device) {
            d.metrics.insert(metric, value);
        }
    }

    /// Makes every further read of the device fail with [`DeviceError::DeviceLost`].
    pub fn lose_device(&self, device: u32) {
        self.state.lock().lost.push(device);
    }

    pub fn is_attached(&self) -> bool {
        self.state
            .lock()
            .sink
            .as_ref()
            .map(EventSink::is_attached)
            .unwrap_or(false)
    }

    fn check_present(&self, device: u32) -> DeviceResult<()> {
        if self.state.lock().lost.contains(&device) {
            return Err(DeviceError::DeviceLost { id: device });
        }
        if !self.devices.lock().contains_key(&device) {
            return Err(DeviceError::DeviceLost { id: device });
        }
        Ok(())
    }
}

impl Backend for MockBackend {
    fn discover(&self) -> DeviceResult<Vec<DeviceIdentity>> {
        if !self.driver_loaded {
            return Err(DeviceError::driver_not_loaded("mock driver is unloaded"));
        }
        let lost = self.state.lock().lost.clone();
        Ok(self
            .devices
            .lock()
            .values()
            .filter(|d| !lost.contains(&d.identity.id))
            .map(|d| d.identity.clone())
            .collect())
    }

    fn read_metric(&self, device: u32, metric: Metric) -> DeviceResult<MetricValue> {
        self.check_present(device)?;
        self.devices
            .lock()
            .get(&device)
            .and_then(|d| d.metrics.get(&metric).cloned())
            .ok_or_else(|| DeviceError::not_supported(metric.as_ref()))
    }

    fn supported_events(&self, device: u32) -> EventType {
        self.devices
            .lock()
            .get(&device)
            .map(|d| d.supported_events)
            .unwrap_or_else(EventType::empty)
    }

    fn poll_events(&self, device: u32) -> DeviceResult<EventType> {
        self.check_present(device)?;
        Ok(self
            .state
            .lock()
            .queued
            .remove(&device)
            .unwrap_or_else(EventType::empty))
    }

    fn wake_mode(&self) -> WakeMode {
        self.wake_mode
    }

    fn attach(&self, sink: EventSink) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.sink = Some(sink);
        state.queued.clear();
        Ok(())
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.sink = None;
        state.queued.clear();
    }

    fn driver_version(&self) -> DeviceResult<String> {
        self.driver_version
            .clone()
            .ok_or_else(|| DeviceError::not_supported("driver version"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(wake_mode: WakeMode) -> MockBackend {
        MockBackend::builder()
            .device(
                MockDevice::new(0, PciAddress::new(0, 0x19, 0, 0), "uuid-0")
                    .metric(Metric::Name, MetricValue::Text(String::from("HL-205")))
                    .supported_events(EventType::ECC_ERR),
            )
            .wake_mode(wake_mode)
            .build()
    }

    #[test]
    fn test_read_metric() -> DeviceResult<()> {
        let backend = backend(WakeMode::Native);
        assert_eq!(
            backend.read_metric(0, Metric::Name)?,
            MetricValue::Text(String::from("HL-205"))
        );
        assert!(matches!(
            backend.read_metric(0, Metric::PowerUsage),
            Err(DeviceError::NotSupported { .. })
        ));

        backend.lose_device(0);
        assert!(matches!(
            backend.read_metric(0, Metric::Name),
            Err(DeviceError::DeviceLost { id: 0 })
        ));
        assert!(backend.discover()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_polling_queue() -> DeviceResult<()> {
        let backend = backend(WakeMode::Polling(Duration::from_millis(10)));
        backend.inject_event(0, EventType::ECC_ERR);
        backend.inject_event(0, EventType::CLOCK_RATE);
        assert_eq!(
            backend.poll_events(0)?,
            EventType::ECC_ERR | EventType::CLOCK_RATE
        );
        assert_eq!(backend.poll_events(0)?, EventType::empty());
        Ok(())
    }

    #[test]
    fn test_driver_not_loaded() {
        let backend = MockBackend::builder().driver_not_loaded().build();
        assert!(matches!(
            backend.discover(),
            Err(DeviceError::DriverNotLoaded { .. })
        ));
    }
}
