use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use parking_lot::Mutex;
use rayon::prelude::*;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use super::{Backend, DeviceIdentity, Metric, MetricValue, WakeMode};
use crate::config::{LibraryConfig, DEFAULT_POLL_INTERVAL};
use crate::error::{DeviceError, DeviceResult};
use crate::event::{EventSink, EventType};
use crate::hwmon::error::HwmonError;
use crate::hwmon::{HwmonType, SensorContainer};
use crate::pci::{PciAddress, PciInfo};
use crate::sysfs::habanalabs::{self, file};
use crate::sysfs::pci;
use crate::telemetry::{ClockType, EccMode, EnableState, MacAddress, PcieUtilCounter, PerformanceState};

/// Readings compared between two polls to detect events.
#[derive(Clone, Debug, Default, PartialEq)]
struct Snapshot {
    operational: Option<bool>,
    clocks: Vec<Option<u32>>,
    ecc_errors: Option<u64>,
}

impl Snapshot {
    fn fired_since(&self, previous: &Snapshot) -> EventType {
        let mut fired = EventType::empty();
        if previous.operational == Some(true) && self.operational != Some(true) {
            fired |= EventType::CRITICAL_ERR;
        }
        let clock_changed = self
            .clocks
            .iter()
            .zip(previous.clocks.iter())
            .any(|(now, before)| now.is_some() && before.is_some() && now != before);
        if clock_changed {
            fired |= EventType::CLOCK_RATE;
        }
        if let (Some(now), Some(before)) = (self.ecc_errors, previous.ecc_errors) {
            if now > before {
                fired |= EventType::ECC_ERR;
            }
        }
        fired
    }
}

/// A [`Backend`] reading the sysfs tree of the habanalabs driver.
///
/// The driver raises no interrupts to user space, so events are detected by polling:
/// the `status` of a device leaving `Operational` is a critical error, any change of a
/// current clock is a clock rate event and growth of the ECC error counters is an ECC error.
#[derive(Debug)]
pub struct SysfsBackend {
    sysfs: PathBuf,
    poll_interval: Duration,
    snapshots: Mutex<HashMap<u32, Snapshot>>,
}

impl SysfsBackend {
    pub fn new<P: Into<PathBuf>>(sysfs: P) -> Self {
        Self {
            sysfs: sysfs.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(config.sysfs_root()).with_poll_interval(config.poll_interval())
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn sysfs(&self) -> &Path {
        &self.sysfs
    }

    fn check_driver(&self) -> DeviceResult<PathBuf> {
        let module = habanalabs::module_root(&self.sysfs);
        if module.is_dir() {
            Ok(module)
        } else {
            Err(DeviceError::driver_not_loaded(format!(
                "{} does not exist",
                module.display()
            )))
        }
    }

    fn device_ids(&self) -> DeviceResult<Vec<u32>> {
        let class = habanalabs::class_root(&self.sysfs);
        let entries = match std::fs::read_dir(&class) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut ids = vec![];
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().to_string();
            if let Some(id) = habanalabs::parse_device_dir(&name) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn read(&self, device: u32, file: &str) -> DeviceResult<String> {
        let root = habanalabs::device_root(&self.sysfs, device);
        habanalabs::read_to_string(&root, file).map_err(|e| {
            if e.kind() != io::ErrorKind::NotFound {
                DeviceError::from(e)
            } else if root.is_dir() {
                DeviceError::not_supported(format!("{file} of device {device}"))
            } else {
                DeviceError::DeviceLost { id: device }
            }
        })
    }

    fn read_parsed<T: FromStr>(&self, device: u32, file: &str) -> DeviceResult<T> {
        let contents = self.read(device, file)?;
        contents.trim().parse().map_err(|_| {
            DeviceError::unexpected_value(format!(
                "{file} of device {device} contains '{contents}'"
            ))
        })
    }

    fn read_number(&self, device: u32, file: &str) -> DeviceResult<u64> {
        let contents = self.read(device, file)?;
        habanalabs::parse_number(&contents).ok_or_else(|| {
            DeviceError::unexpected_value(format!(
                "{file} of device {device} contains '{contents}'"
            ))
        })
    }

    fn read_counter(&self, device: u32, file: &str, key: &str) -> DeviceResult<u64> {
        let counters = habanalabs::build_counter_map(self.read(device, file)?);
        counters
            .get(key)
            .copied()
            .ok_or_else(|| DeviceError::not_supported(format!("{key} in {file} of device {device}")))
    }

    fn read_flag(&self, device: u32, file: &str) -> DeviceResult<bool> {
        let contents = self.read(device, file)?;
        habanalabs::parse_zero_or_one_to_bool(&contents).ok_or_else(|| {
            DeviceError::unexpected_value(format!(
                "{file} of device {device} contains '{contents}'"
            ))
        })
    }

    fn read_identity(&self, device: u32) -> DeviceResult<DeviceIdentity> {
        let pci_address = self.pci_address(device)?;
        let uuid = self.read(device, file::UUID)?.trim().to_string();
        let dev = self.read(device, file::DEV)?;
        let minor = habanalabs::parse_minor(&dev).ok_or_else(|| {
            DeviceError::unexpected_value(format!("dev of device {device} contains '{dev}'"))
        })?;
        let serial = match self.read(device, file::SERIAL_NUMBER) {
            Ok(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(DeviceError::NotSupported { .. }) => None,
            Err(e) => return Err(e),
        };

        Ok(DeviceIdentity {
            id: device,
            pci_address,
            uuid,
            minor,
            serial,
        })
    }

    fn pci_address(&self, device: u32) -> DeviceResult<PciAddress> {
        self.read(device, file::PCI_ADDR)?
            .parse()
            .map_err(|e: DeviceError| DeviceError::unexpected_value(e))
    }

    fn pci_info(&self, device: u32) -> DeviceResult<PciInfo> {
        let address = self.pci_address(device)?;
        let bdf = address.to_string();
        let link = |attribute: &str| {
            pci::read_attribute(&self.sysfs, &bdf, attribute).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    DeviceError::not_supported(format!("{attribute} of {bdf}"))
                }
                _ => DeviceError::from(e),
            })
        };
        let link_width = link(pci::CURRENT_LINK_WIDTH)?;

        Ok(PciInfo {
            bus: address.bus as u32,
            bus_id: bdf.clone(),
            device: address.device as u32,
            domain: address.domain,
            pci_device_id: self.read_number(device, file::PCI_DEVICE_ID)? as u32,
            link_speed: link(pci::CURRENT_LINK_SPEED)?,
            link_width: link_width.parse().map_err(|_| {
                DeviceError::unexpected_value(format!("link width of {bdf} is '{link_width}'"))
            })?,
        })
    }

    fn sensors(&self, device: u32) -> DeviceResult<SensorContainer> {
        let bdf = self.pci_address(device)?.to_string();
        SensorContainer::new(&self.sysfs, &bdf).map_err(|e| match e {
            HwmonError::IoError { cause } if cause.kind() == io::ErrorKind::NotFound => {
                DeviceError::not_supported(format!("hwmon sensors of device {device}"))
            }
            e => DeviceError::hwmon_error(device, e),
        })
    }

    fn read_sensor(&self, device: u32, hwmon_type: HwmonType, label: Option<&str>) -> DeviceResult<i64> {
        let sensors = self.sensors(device)?;
        let sensor = match label {
            Some(label) => sensors.find(hwmon_type, label),
            None => sensors.get(hwmon_type).first().ok_or_else(|| HwmonError::SensorNotFound {
                label: format!("{hwmon_type:?}"),
            }),
        }
        .map_err(|e| DeviceError::hwmon_error(device, e))?;

        sensor
            .read_item("input")
            .map_err(|e| DeviceError::hwmon_error(device, e))
    }

    fn snapshot(&self, device: u32) -> Snapshot {
        Snapshot {
            operational: self
                .read(device, file::STATUS)
                .ok()
                .map(|s| s.trim() == habanalabs::STATUS_OPERATIONAL),
            clocks: ClockType::iter()
                .map(|clock| self.read_parsed(device, &format!("{}_clk_curr", clock.sysfs_prefix())).ok())
                .collect(),
            ecc_errors: self
                .read(device, file::ECC_ERRORS)
                .ok()
                .map(|contents| habanalabs::build_counter_map(contents).values().sum()),
        }
    }
}

fn to_u32(metric: Metric, value: u64) -> DeviceResult<MetricValue> {
    u32::try_from(value)
        .map(MetricValue::U32)
        .map_err(|_| DeviceError::unexpected_value(format!("{} of {value} overflows", metric.as_ref())))
}

/// Scales a hwmon reading down by 1000. Negative readings are rejected.
fn from_milli(metric: Metric, device: u32, raw: i64) -> DeviceResult<MetricValue> {
    let value = u64::try_from(raw).map_err(|_| {
        DeviceError::unexpected_value(format!(
            "{} of device {device} reads {raw}",
            metric.as_ref()
        ))
    })?;
    to_u32(metric, value / 1000)
}

impl Backend for SysfsBackend {
    fn discover(&self) -> DeviceResult<Vec<DeviceIdentity>> {
        self.check_driver()?;
        let ids = self.device_ids()?;
        let devices = ids
            .par_iter()
            .map(|id| self.read_identity(*id))
            .collect::<DeviceResult<Vec<_>>>()?;
        debug!("Discovered {} device(s) under {}", devices.len(), self.sysfs.display());
        Ok(devices)
    }

    fn read_metric(&self, device: u32, metric: Metric) -> DeviceResult<MetricValue> {
        let value = match metric {
            Metric::Name => MetricValue::Text(self.read(device, file::DEVICE_TYPE)?.trim().to_string()),
            Metric::PciInfo => MetricValue::Pci(self.pci_info(device)?),
            Metric::Clock(clock) => MetricValue::U32(
                self.read_parsed(device, &format!("{}_clk_curr", clock.sysfs_prefix()))?,
            ),
            Metric::MaxClock(clock) => {
                MetricValue::U32(self.read_parsed(device, &format!("{}_clk", clock.sysfs_prefix()))?)
            }
            Metric::Utilization => MetricValue::U32(self.read_parsed(device, file::UTILIZATION)?),
            Metric::Memory => MetricValue::Memory {
                total: self.read_parsed(device, file::DRAM_TOTAL)?,
                used: self.read_parsed(device, file::DRAM_USED)?,
            },
            Metric::Temperature(sensor) => {
                // millidegree Celsius
                let value = self.read_sensor(device, HwmonType::Temperature, Some(sensor.label()))?;
                from_milli(metric, device, value)?
            }
            Metric::TemperatureThreshold(threshold) => {
                to_u32(metric, self.read_counter(device, file::TEMP_THRESHOLDS, threshold.key())?)?
            }
            Metric::PersistenceMode => MetricValue::Enabled(self.read_flag(device, file::PERSISTENCE_MODE)?),
            Metric::PerformanceState => {
                let contents = self.read(device, file::PERF_STATE)?;
                let state = PerformanceState::from_str(contents.trim())
                    .ok()
                    .or_else(|| {
                        habanalabs::parse_number(&contents)
                            .and_then(|n| PerformanceState::try_from(n as u32).ok())
                    })
                    .unwrap_or(PerformanceState::Unknown);
                MetricValue::PState(state)
            }
            Metric::PowerUsage => {
                // microwatt
                let value = self.read_sensor(device, HwmonType::Power, None)?;
                from_milli(metric, device, value)?
            }
            Metric::PowerDefaultLimit => {
                // microwatt
                to_u32(metric, self.read_number(device, file::MAX_POWER)? / 1000)?
            }
            Metric::EccMode => {
                let current = self.read_flag(device, file::ECC_MODE)?;
                let pending = match self.read_flag(device, file::ECC_MODE_PENDING) {
                    Err(DeviceError::NotSupported { .. }) => current,
                    res => res?,
                };
                MetricValue::EccMode(EccMode {
                    current: EnableState::from(current),
                    pending: EnableState::from(pending),
                })
            }
            Metric::TotalEccErrors(error_type, counter_type) => {
                let key = format!(
                    "{}_{}",
                    error_type.as_ref().to_lowercase(),
                    counter_type.as_ref().to_lowercase()
                );
                MetricValue::U64(self.read_counter(device, file::ECC_ERRORS, &key)?)
            }
            Metric::Serial => MetricValue::Text(self.read(device, file::SERIAL_NUMBER)?.trim().to_string()),
            Metric::BoardId => to_u32(metric, self.read_number(device, file::BOARD_ID)?)?,
            Metric::MacAddresses => MetricValue::Macs(
                self.read(device, file::MAC_ADDR)?
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(MacAddress::from_str)
                    .collect::<DeviceResult<Vec<_>>>()?,
            ),
            Metric::PcieThroughput(counter) => {
                let file = match counter {
                    PcieUtilCounter::TxBytes => file::PCIE_TX_BYTES,
                    PcieUtilCounter::RxBytes => file::PCIE_RX_BYTES,
                };
                MetricValue::U64(self.read_number(device, file)?)
            }
            Metric::PcieReplayCounter => to_u32(metric, self.read_number(device, file::PCIE_REPLAY_COUNT)?)?,
            Metric::ClockThrottleReasons => MetricValue::U64(self.read_number(device, file::CLK_THROTTLE_REASON)?),
            Metric::EnergyConsumption => MetricValue::U64(self.read_number(device, file::ENERGY_CONSUMPTION)?),
        };
        Ok(value)
    }

    fn supported_events(&self, device: u32) -> EventType {
        let root = habanalabs::device_root(&self.sysfs, device);
        let mut supported = EventType::empty();
        if root.join(file::STATUS).is_file() {
            supported |= EventType::CRITICAL_ERR;
        }
        if ClockType::iter().any(|c| root.join(format!("{}_clk_curr", c.sysfs_prefix())).is_file()) {
            supported |= EventType::CLOCK_RATE;
        }
        if root.join(file::ECC_ERRORS).is_file() {
            supported |= EventType::ECC_ERR;
        }
        supported
    }

    fn poll_events(&self, device: u32) -> DeviceResult<EventType> {
        if !habanalabs::device_root(&self.sysfs, device).is_dir() {
            return Err(DeviceError::DeviceLost { id: device });
        }

        let current = self.snapshot(device);
        let previous = self.snapshots.lock().insert(device, current.clone());
        Ok(previous
            .map(|previous| current.fired_since(&previous))
            .unwrap_or_else(EventType::empty))
    }

    fn wake_mode(&self) -> WakeMode {
        WakeMode::Polling(self.poll_interval)
    }

    fn attach(&self, _sink: EventSink) -> DeviceResult<()> {
        let ids = self.device_ids()?;
        let snapshots: HashMap<u32, Snapshot> = ids
            .par_iter()
            .map(|id| (*id, self.snapshot(*id)))
            .collect();
        for (id, snapshot) in snapshots.iter() {
            if snapshot.operational == Some(false) {
                warn!("Device {id} is not operational");
            }
        }
        *self.snapshots.lock() = snapshots;
        Ok(())
    }

    fn release(&self) {
        self.snapshots.lock().clear();
    }

    fn driver_version(&self) -> DeviceResult<String> {
        let module = self.check_driver()?;
        habanalabs::read_to_string(module, file::VERSION)
            .map(|v| v.trim().to_string())
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => DeviceError::not_supported("driver version"),
                _ => DeviceError::from(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::telemetry::{
        EccCounterType, MemoryErrorType, TemperatureSensor, TemperatureThreshold,
    };

    const SYSFS: &str = "test_data/test-0/sys";

    fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
        fs::create_dir_all(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            let target = to.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                copy_dir(&entry.path(), &target)?;
            } else {
                fs::copy(entry.path(), target)?;
            }
        }
        Ok(())
    }

    fn fixture() -> io::Result<(TempDir, SysfsBackend)> {
        let dir = tempfile::tempdir()?;
        copy_dir(Path::new(SYSFS), dir.path())?;
        let backend = SysfsBackend::new(dir.path());
        Ok((dir, backend))
    }

    #[test]
    fn test_discover() -> DeviceResult<()> {
        let backend = SysfsBackend::new(SYSFS);
        let devices = backend.discover()?;
        assert_eq!(devices.len(), 2);

        assert_eq!(devices[0].id, 0);
        assert_eq!(devices[0].pci_address.to_string(), "0000:19:00.0");
        assert_eq!(devices[0].minor, 0);
        assert_eq!(devices[0].serial.as_deref(), Some("AM12345678"));

        assert_eq!(devices[1].id, 1);
        assert_eq!(devices[1].pci_address.to_string(), "0000:b3:00.0");
        assert_eq!(devices[1].minor, 2);
        assert_eq!(devices[1].serial, None);
        Ok(())
    }

    #[test]
    fn test_driver_not_loaded() -> io::Result<()> {
        let (dir, backend) = fixture()?;
        fs::remove_dir_all(dir.path().join("module/habanalabs"))?;
        assert!(matches!(
            backend.discover(),
            Err(DeviceError::DriverNotLoaded { .. })
        ));
        assert!(matches!(
            backend.driver_version(),
            Err(DeviceError::DriverNotLoaded { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_read_metrics() -> DeviceResult<()> {
        let backend = SysfsBackend::new(SYSFS);
        assert_eq!(backend.driver_version()?, "1.10.0-fw-44.0.1");
        assert_eq!(
            backend.read_metric(0, Metric::Name)?,
            MetricValue::Text(String::from("HL-205"))
        );
        assert_eq!(
            backend.read_metric(0, Metric::Clock(ClockType::Mme))?,
            MetricValue::U32(1800)
        );
        assert_eq!(
            backend.read_metric(0, Metric::MaxClock(ClockType::Mme))?,
            MetricValue::U32(2000)
        );
        assert_eq!(
            backend.read_metric(0, Metric::Memory)?,
            MetricValue::Memory {
                total: 34359738368,
                used: 1073741824
            }
        );
        assert_eq!(
            backend.read_metric(0, Metric::Temperature(TemperatureSensor::OnAip))?,
            MetricValue::U32(41)
        );
        assert_eq!(
            backend.read_metric(0, Metric::Temperature(TemperatureSensor::OnBoard))?,
            MetricValue::U32(33)
        );
        assert_eq!(
            backend.read_metric(0, Metric::TemperatureThreshold(TemperatureThreshold::Slowdown))?,
            MetricValue::U32(95)
        );
        assert_eq!(backend.read_metric(0, Metric::PowerUsage)?, MetricValue::U32(96500));
        assert_eq!(
            backend.read_metric(0, Metric::PowerDefaultLimit)?,
            MetricValue::U32(350000)
        );
        assert_eq!(
            backend.read_metric(0, Metric::PerformanceState)?,
            MetricValue::PState(PerformanceState::P0)
        );
        assert_eq!(
            backend.read_metric(0, Metric::EccMode)?,
            MetricValue::EccMode(EccMode {
                current: EnableState::Enabled,
                pending: EnableState::Disabled
            })
        );
        assert_eq!(
            backend.read_metric(
                0,
                Metric::TotalEccErrors(MemoryErrorType::Corrected, EccCounterType::Aggregate)
            )?,
            MetricValue::U64(12)
        );
        assert_eq!(
            backend.read_metric(0, Metric::ClockThrottleReasons)?,
            MetricValue::U64(0x4)
        );
        match backend.read_metric(0, Metric::MacAddresses)? {
            MetricValue::Macs(macs) => {
                assert_eq!(macs.len(), 4);
                assert_eq!(macs[3].to_string(), "b4:96:91:0a:1c:03");
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_pci_info() -> DeviceResult<()> {
        let backend = SysfsBackend::new(SYSFS);
        match backend.read_metric(0, Metric::PciInfo)? {
            MetricValue::Pci(info) => {
                assert_eq!(info.bus_id, "0000:19:00.0");
                assert_eq!(info.bus, 0x19);
                assert_eq!(info.device, 0);
                assert_eq!(info.domain, 0);
                assert_eq!(info.pci_device_id, 0x10001da3);
                assert_eq!(info.link_speed, "16.0 GT/s PCIe");
                assert_eq!(info.link_width, 16);
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_missing_files_are_not_supported() {
        let backend = SysfsBackend::new(SYSFS);
        for metric in [
            Metric::MacAddresses,
            Metric::Serial,
            Metric::Temperature(TemperatureSensor::OnAip),
            Metric::TotalEccErrors(MemoryErrorType::Uncorrected, EccCounterType::Volatile),
        ] {
            assert!(
                matches!(
                    backend.read_metric(1, metric),
                    Err(DeviceError::NotSupported { .. })
                ),
                "{metric:?}"
            );
        }
        assert!(matches!(
            backend.read_metric(9, Metric::Name),
            Err(DeviceError::DeviceLost { id: 9 })
        ));
    }

    #[test]
    fn test_supported_events() {
        let backend = SysfsBackend::new(SYSFS);
        assert_eq!(backend.supported_events(0), EventType::all());
        assert_eq!(
            backend.supported_events(1),
            EventType::CRITICAL_ERR | EventType::CLOCK_RATE
        );
        assert_eq!(backend.supported_events(9), EventType::empty());
    }

    #[test]
    fn test_poll_events() -> eyre::Result<()> {
        let (dir, backend) = fixture()?;
        let hl0 = dir.path().join("class/habanalabs/hl0");
        let hub = std::sync::Arc::new(crate::event::EventHub::new(HashMap::new(), 1));
        backend.attach(EventSink::new(&hub))?;
        assert_eq!(backend.poll_events(0)?, EventType::empty());

        fs::write(hl0.join("tpc_clk_curr"), "1200\n")?;
        fs::write(
            hl0.join("ecc_errors"),
            "corrected volatile: 4\ncorrected aggregate: 13\nuncorrected volatile: 0\nuncorrected aggregate: 0\n",
        )?;
        assert_eq!(
            backend.poll_events(0)?,
            EventType::CLOCK_RATE | EventType::ECC_ERR
        );
        assert_eq!(backend.poll_events(0)?, EventType::empty());

        fs::write(hl0.join("status"), "In reset\n")?;
        assert_eq!(backend.poll_events(0)?, EventType::CRITICAL_ERR);

        fs::remove_dir_all(&hl0)?;
        assert!(matches!(
            backend.poll_events(0),
            Err(DeviceError::DeviceLost { id: 0 })
        ));
        Ok(())
    }

    #[test]
    fn test_unreadable_serial_fails_discovery() -> eyre::Result<()> {
        let (dir, backend) = fixture()?;
        let serial = dir.path().join("class/habanalabs/hl0/serial_number");
        fs::remove_file(&serial)?;
        fs::create_dir(&serial)?;
        assert!(matches!(
            backend.discover(),
            Err(DeviceError::IoError { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_negative_sensor_reading() -> eyre::Result<()> {
        let (dir, backend) = fixture()?;
        let hwmon = dir.path().join("bus/pci/devices/0000:19:00.0/hwmon/hwmon0");
        fs::write(hwmon.join("temp1_input"), "-5000\n")?;
        assert!(matches!(
            backend.read_metric(0, Metric::Temperature(TemperatureSensor::OnAip)),
            Err(DeviceError::UnexpectedValue { .. })
        ));
        assert_eq!(
            backend.read_metric(0, Metric::Temperature(TemperatureSensor::OnBoard))?,
            MetricValue::U32(33)
        );
        Ok(())
    }
}
