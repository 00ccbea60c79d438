//! Point-in-time reads of device metrics.
//!
//! Every read validates the handle against the current session, then delegates to the
//! [`Backend`](crate::Backend). Nothing is cached except the identity captured at discovery.

use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

use crate::backend::{Metric, MetricValue};
use crate::error::{DeviceError, DeviceResult};
use crate::handle::DeviceHandle;
use crate::pci::PciInfo;
use crate::Library;

macro_rules! impl_selector {
    ($ty:ident) => {
        impl TryFrom<u32> for $ty {
            type Error = DeviceError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                $ty::iter()
                    .find(|s| *s as u32 == value)
                    .ok_or_else(|| {
                        DeviceError::invalid_argument(format!(
                            "{value} is not a valid {}",
                            stringify!($ty)
                        ))
                    })
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_ref())
            }
        }
    };
}

/// Clock domains of a device.
#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum ClockType {
    Soc = 0,
    Ic = 1,
    Mme = 2,
    Tpc = 3,
}

impl ClockType {
    pub(crate) fn sysfs_prefix(&self) -> &'static str {
        match self {
            ClockType::Soc => "soc",
            ClockType::Ic => "ic",
            ClockType::Mme => "mme",
            ClockType::Tpc => "tpc",
        }
    }
}

#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum TemperatureSensor {
    #[enumeration(alias = "on_die")]
    OnAip = 0,
    #[enumeration(alias = "on_board")]
    OnBoard = 1,
}

impl TemperatureSensor {
    /// The hwmon label of the sensor.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            TemperatureSensor::OnAip => "on_die",
            TemperatureSensor::OnBoard => "on_board",
        }
    }
}

#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum TemperatureThreshold {
    Shutdown = 0,
    Slowdown = 1,
    #[enumeration(alias = "mem_max")]
    MemMax = 2,
    #[enumeration(alias = "gpu_max")]
    GpuMax = 3,
}

impl TemperatureThreshold {
    pub(crate) fn key(&self) -> &'static str {
        match self {
            TemperatureThreshold::Shutdown => "shutdown",
            TemperatureThreshold::Slowdown => "slowdown",
            TemperatureThreshold::MemMax => "mem_max",
            TemperatureThreshold::GpuMax => "gpu_max",
        }
    }
}

#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum EnableState {
    Disabled = 0,
    Enabled = 1,
}

impl From<bool> for EnableState {
    fn from(enabled: bool) -> Self {
        if enabled {
            EnableState::Enabled
        } else {
            EnableState::Disabled
        }
    }
}

#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum PerformanceState {
    P0 = 0,
    Unknown = 32,
}

#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum MemoryErrorType {
    Corrected = 0,
    Uncorrected = 1,
}

#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum EccCounterType {
    Volatile = 0,
    Aggregate = 1,
}

#[derive(AsRefStr, Clone, Copy, Debug, enum_utils::FromStr, EnumIter, Eq, Hash, PartialEq)]
#[enumeration(case_insensitive)]
#[repr(u32)]
pub enum PcieUtilCounter {
    #[enumeration(alias = "tx")]
    TxBytes = 0,
    #[enumeration(alias = "rx")]
    RxBytes = 1,
}

impl_selector!(ClockType);
impl_selector!(TemperatureSensor);
impl_selector!(TemperatureThreshold);
impl_selector!(EnableState);
impl_selector!(PerformanceState);
impl_selector!(MemoryErrorType);
impl_selector!(EccCounterType);
impl_selector!(PcieUtilCounter);

/// Device memory in bytes. `used + free == total` always holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MemoryInfo {
    pub free: u64,
    pub total: u64,
    pub used: u64,
}

impl MemoryInfo {
    pub fn new(total: u64, used: u64) -> DeviceResult<Self> {
        if used > total {
            return Err(DeviceError::unexpected_value(format!(
                "used memory {used} exceeds total {total}"
            )));
        }
        Ok(Self {
            free: total - used,
            total,
            used,
        })
    }
}

/// Utilization of the compute engine over the last sample period, in percent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Utilization {
    pub aip: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EccMode {
    pub current: EnableState,
    /// The mode that takes effect on the next reset.
    pub pending: EnableState,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MacAddress(pub [u8; 6]);

impl FromStr for MacAddress {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets = s
            .trim()
            .split(':')
            .map(|o| match o.len() {
                2 => u8::from_str_radix(o, 16).ok(),
                _ => None,
            })
            .collect::<Option<Vec<u8>>>()
            .and_then(|v| <[u8; 6]>::try_from(v).ok())
            .ok_or_else(|| DeviceError::unexpected_value(format!("malformed MAC address '{s}'")))?;
        Ok(MacAddress(octets))
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}", self.0.iter().format(":"))
    }
}

/// One entry of a device's MAC address table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MacRecord {
    pub id: u32,
    pub addr: [u8; 6],
}

/// Copies `value` and a terminating NUL into `buf`.
///
/// Fails with [`DeviceError::InsufficientSize`] and leaves `buf` untouched if it cannot
/// hold the whole string.
pub fn write_c_str(value: &str, buf: &mut [u8]) -> DeviceResult<usize> {
    let required = value.len() + 1;
    if buf.len() < required {
        return Err(DeviceError::InsufficientSize {
            required,
            available: buf.len(),
        });
    }
    buf[..value.len()].copy_from_slice(value.as_bytes());
    buf[value.len()] = 0;
    Ok(required)
}

macro_rules! expect_value {
    ($value:expr, $metric:expr, $pattern:pat => $out:expr) => {
        match $value {
            $pattern => Ok($out),
            other => Err(MetricValue::unexpected($metric, &other)),
        }
    };
}

impl Library {
    fn read_u32(&self, handle: DeviceHandle, metric: Metric) -> DeviceResult<u32> {
        expect_value!(self.read_metric(handle, metric)?, metric, MetricValue::U32(v) => v)
    }

    fn read_u64(&self, handle: DeviceHandle, metric: Metric) -> DeviceResult<u64> {
        expect_value!(self.read_metric(handle, metric)?, metric, MetricValue::U64(v) => v)
    }

    fn read_text(&self, handle: DeviceHandle, metric: Metric) -> DeviceResult<String> {
        expect_value!(self.read_metric(handle, metric)?, metric, MetricValue::Text(v) => v)
    }

    pub fn device_name(&self, handle: DeviceHandle) -> DeviceResult<String> {
        self.read_text(handle, Metric::Name)
    }

    pub fn pci_info(&self, handle: DeviceHandle) -> DeviceResult<PciInfo> {
        let metric = Metric::PciInfo;
        expect_value!(self.read_metric(handle, metric)?, metric, MetricValue::Pci(v) => v)
    }

    /// Current clock frequency of the domain, in MHz.
    pub fn clock_info(&self, handle: DeviceHandle, clock: ClockType) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::Clock(clock))
    }

    /// Maximum clock frequency of the domain, in MHz.
    pub fn max_clock_info(&self, handle: DeviceHandle, clock: ClockType) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::MaxClock(clock))
    }

    pub fn utilization_rates(&self, handle: DeviceHandle) -> DeviceResult<Utilization> {
        self.read_u32(handle, Metric::Utilization)
            .map(|aip| Utilization { aip })
    }

    pub fn memory_info(&self, handle: DeviceHandle) -> DeviceResult<MemoryInfo> {
        let metric = Metric::Memory;
        let (total, used) = expect_value!(
            self.read_metric(handle, metric)?,
            metric,
            MetricValue::Memory { total, used } => (total, used)
        )?;
        MemoryInfo::new(total, used)
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(
        &self,
        handle: DeviceHandle,
        sensor: TemperatureSensor,
    ) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::Temperature(sensor))
    }

    /// Temperature threshold in degrees Celsius.
    pub fn temperature_threshold(
        &self,
        handle: DeviceHandle,
        threshold: TemperatureThreshold,
    ) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::TemperatureThreshold(threshold))
    }

    pub fn persistence_mode(&self, handle: DeviceHandle) -> DeviceResult<EnableState> {
        let metric = Metric::PersistenceMode;
        expect_value!(
            self.read_metric(handle, metric)?,
            metric,
            MetricValue::Enabled(v) => EnableState::from(v)
        )
    }

    pub fn performance_state(&self, handle: DeviceHandle) -> DeviceResult<PerformanceState> {
        let metric = Metric::PerformanceState;
        expect_value!(self.read_metric(handle, metric)?, metric, MetricValue::PState(v) => v)
    }

    /// Power draw in milliwatts.
    pub fn power_usage(&self, handle: DeviceHandle) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::PowerUsage)
    }

    /// Default power limit in milliwatts.
    pub fn power_management_default_limit(&self, handle: DeviceHandle) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::PowerDefaultLimit)
    }

    pub fn ecc_mode(&self, handle: DeviceHandle) -> DeviceResult<EccMode> {
        let metric = Metric::EccMode;
        expect_value!(self.read_metric(handle, metric)?, metric, MetricValue::EccMode(v) => v)
    }

    pub fn total_ecc_errors(
        &self,
        handle: DeviceHandle,
        error_type: MemoryErrorType,
        counter_type: EccCounterType,
    ) -> DeviceResult<u64> {
        self.read_u64(handle, Metric::TotalEccErrors(error_type, counter_type))
    }

    pub fn uuid(&self, handle: DeviceHandle) -> DeviceResult<String> {
        self.with_device(handle, |identity| identity.uuid.clone())
    }

    pub fn minor_number(&self, handle: DeviceHandle) -> DeviceResult<u32> {
        self.with_device(handle, |identity| identity.minor)
    }

    pub fn serial(&self, handle: DeviceHandle) -> DeviceResult<String> {
        self.read_text(handle, Metric::Serial)
    }

    pub fn board_id(&self, handle: DeviceHandle) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::BoardId)
    }

    /// Bytes moved over the PCIe link in the given direction.
    pub fn pcie_throughput(
        &self,
        handle: DeviceHandle,
        counter: PcieUtilCounter,
    ) -> DeviceResult<u64> {
        self.read_u64(handle, Metric::PcieThroughput(counter))
    }

    pub fn pcie_replay_counter(&self, handle: DeviceHandle) -> DeviceResult<u32> {
        self.read_u32(handle, Metric::PcieReplayCounter)
    }

    /// Bit mask of the reasons the clocks are currently throttled.
    pub fn clock_throttle_reasons(&self, handle: DeviceHandle) -> DeviceResult<u64> {
        self.read_u64(handle, Metric::ClockThrottleReasons)
    }

    /// Energy consumed since the driver was loaded, in millijoules.
    pub fn total_energy_consumption(&self, handle: DeviceHandle) -> DeviceResult<u64> {
        self.read_u64(handle, Metric::EnergyConsumption)
    }

    pub fn mac_address_table(&self, handle: DeviceHandle) -> DeviceResult<Vec<MacAddress>> {
        let metric = Metric::MacAddresses;
        expect_value!(self.read_metric(handle, metric)?, metric, MetricValue::Macs(v) => v)
    }

    /// Copies the MAC address table, starting at record `start_id`, into `records`.
    ///
    /// Returns the number of records written and the number of records the device has.
    pub fn mac_addresses(
        &self,
        handle: DeviceHandle,
        start_id: u32,
        records: &mut [MacRecord],
    ) -> DeviceResult<(usize, usize)> {
        let table = self.mac_address_table(handle)?;
        let actual_count = table.len();
        let start = start_id as usize;
        if start > actual_count {
            return Err(DeviceError::invalid_argument(format!(
                "start id {start_id} exceeds the {actual_count} MAC addresses"
            )));
        }

        let mut written = 0;
        for (slot, (id, mac)) in records
            .iter_mut()
            .zip(table.iter().enumerate().skip(start))
        {
            *slot = MacRecord {
                id: id as u32,
                addr: mac.0,
            };
            written += 1;
        }

        Ok((written, actual_count))
    }
}
