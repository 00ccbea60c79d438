/* https://www.kernel.org/doc/Documentation/hwmon/sysfs-interface */
/* The common scheme for files naming is: <type><number>_<item>. */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use itertools::Itertools;

use crate::sysfs::pci;

pub mod error {
    use std::io;

    use thiserror::Error;

    pub type HwmonResult<T> = Result<T, HwmonError>;

    /// An error that occurred during parsing or retrieving hwmon sensors.
    #[derive(Debug, Error)]
    pub enum HwmonError {
        #[error("IoError: {cause}")]
        IoError { cause: io::Error },
        #[error("Unsupported type: {name}")]
        UnsupportedType { name: String },
        #[error("Invalid file name: {name}")]
        InvalidFileName { name: String },
        #[error("Sensor not found: {label}")]
        SensorNotFound { label: String },
        #[error("Item Not found: {sensor_name} {item_name}")]
        ItemNotFound {
            sensor_name: String,
            item_name: String,
        },
        #[error("Unexpected value format: {sensor_name} {value}")]
        UnexpectedValueFormat { sensor_name: String, value: String },
    }

    impl From<io::Error> for HwmonError {
        fn from(e: io::Error) -> Self {
            Self::IoError { cause: e }
        }
    }
}

use error::{HwmonError, HwmonResult};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum HwmonType {
    Power,
    Temperature,
}

impl FromStr for HwmonType {
    type Err = HwmonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power" => Ok(HwmonType::Power),
            "temp" => Ok(HwmonType::Temperature),
            _ => Err(HwmonError::UnsupportedType {
                name: String::from(s),
            }),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
struct MetricType {
    hwmon_type: HwmonType,
    idx: u8,
}

impl TryFrom<&str> for MetricType {
    type Error = HwmonError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let idx_pos = value
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| HwmonError::InvalidFileName {
                name: value.to_string(),
            })?;

        let (name_str, idx_str) = value.split_at(idx_pos);
        let hwmon_type = HwmonType::from_str(name_str)?;
        let idx = idx_str
            .parse::<u8>()
            .map_err(|_| HwmonError::InvalidFileName {
                name: value.to_string(),
            })?;

        Ok(MetricType { hwmon_type, idx })
    }
}

#[derive(Debug)]
struct MetricEntry {
    metric_type: MetricType,
    item_name: String,
    path: PathBuf,
}

impl TryFrom<std::fs::DirEntry> for MetricEntry {
    type Error = HwmonError;

    fn try_from(value: std::fs::DirEntry) -> Result<Self, Self::Error> {
        let filename = value.file_name().to_string_lossy().to_string();
        let (metric_type_str, item_name) =
            filename
                .split_once('_')
                .ok_or_else(|| HwmonError::InvalidFileName {
                    name: filename.clone(),
                })?;

        Ok(MetricEntry {
            metric_type: MetricType::try_from(metric_type_str)?,
            item_name: item_name.to_string(),
            path: value.path(),
        })
    }
}

/// A single labelled hwmon channel, e.g. `temp1_*` labelled `on_die`.
#[derive(Debug)]
pub struct Sensor {
    name: String,
    items: HashMap<String, PathBuf>,
}

impl Sensor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_item(&self, item_name: &str) -> HwmonResult<i64> {
        let path = self
            .items
            .get(item_name)
            .ok_or_else(|| HwmonError::ItemNotFound {
                sensor_name: self.name.clone(),
                item_name: item_name.to_string(),
            })?;
        let value = std::fs::read_to_string(path)?;
        let value = value.trim();

        value
            .parse()
            .map_err(|_| HwmonError::UnexpectedValueFormat {
                sensor_name: self.name.clone(),
                value: value.to_string(),
            })
    }
}

/// Sensors of one device, grouped by type and ordered by channel index.
#[derive(Debug)]
pub struct SensorContainer(HashMap<HwmonType, Vec<Sensor>>);

impl SensorContainer {
    pub fn new<P: AsRef<Path>>(sysfs: P, bdf: &str) -> HwmonResult<Self> {
        let entries = Self::fetch_entries(pci::hwmon::path(sysfs, bdf))?;
        Ok(Self::build(entries))
    }

    pub fn get(&self, t: HwmonType) -> &[Sensor] {
        self.0.get(&t).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn find(&self, t: HwmonType, label: &str) -> HwmonResult<&Sensor> {
        self.get(t)
            .iter()
            .find(|sensor| sensor.name == label)
            .ok_or_else(|| HwmonError::SensorNotFound {
                label: label.to_string(),
            })
    }

    fn fetch_entries(path: PathBuf) -> HwmonResult<Vec<MetricEntry>> {
        let mut entries = vec![];

        // Caution: Assume that there is only one 'hwmon' per device
        if let Some(hwmon_dir) = std::fs::read_dir(&path)?.next() {
            for entry in std::fs::read_dir(hwmon_dir?.path())? {
                // ignore error: not subject to collection
                if let Ok(metric) = MetricEntry::try_from(entry?) {
                    entries.push(metric);
                }
            }
        }

        Ok(entries)
    }

    fn build(entries: Vec<MetricEntry>) -> Self {
        let (labels, metrics): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.item_name == "label");

        let label_map: HashMap<MetricType, String> = labels
            .into_iter()
            .filter_map(|entry| {
                std::fs::read_to_string(&entry.path)
                    .ok()
                    .map(|text| (entry.metric_type, text.trim().to_string()))
            })
            .collect();

        let mut items_by_type: HashMap<MetricType, HashMap<String, PathBuf>> = HashMap::new();
        for entry in metrics {
            items_by_type
                .entry(entry.metric_type)
                .or_default()
                .insert(entry.item_name, entry.path);
        }

        let mut sensors: HashMap<HwmonType, Vec<Sensor>> = HashMap::new();
        for (metric_type, items) in items_by_type
            .into_iter()
            .sorted_by_key(|(metric_type, _)| metric_type.idx)
        {
            let name = label_map
                .get(&metric_type)
                .cloned()
                .unwrap_or_else(|| metric_type.idx.to_string());
            sensors
                .entry(metric_type.hwmon_type)
                .or_default()
                .push(Sensor { name, items });
        }

        SensorContainer(sensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSFS: &str = "test_data/test-0/sys";

    #[test]
    fn metric_type_try_from_test() {
        assert_eq!(
            MetricType::try_from("temp2").ok(),
            Some(MetricType {
                hwmon_type: HwmonType::Temperature,
                idx: 2
            })
        );
        assert!(MetricType::try_from("temp").is_err());
        assert!(MetricType::try_from("fan1").is_err());
        assert!(MetricType::try_from("curr1").is_err());
    }

    #[test]
    fn sensor_container_test() -> HwmonResult<()> {
        let sensors = SensorContainer::new(SYSFS, "0000:19:00.0")?;

        let temperatures = sensors.get(HwmonType::Temperature);
        assert_eq!(temperatures.len(), 2);
        assert_eq!(temperatures[0].name(), "on_die");
        assert_eq!(temperatures[1].name(), "on_board");

        let on_die = sensors.find(HwmonType::Temperature, "on_die")?;
        assert_eq!(on_die.read_item("input")?, 41000);
        assert_eq!(on_die.read_item("crit")?, 105000);
        assert!(matches!(
            on_die.read_item("emergency"),
            Err(HwmonError::ItemNotFound { .. })
        ));

        let power = &sensors.get(HwmonType::Power)[0];
        assert_eq!(power.read_item("input")?, 96500000);

        assert!(matches!(
            sensors.find(HwmonType::Temperature, "memory"),
            Err(HwmonError::SensorNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn sensor_container_missing_dir_test() {
        assert!(matches!(
            SensorContainer::new(SYSFS, "0000:ff:00.0"),
            Err(HwmonError::IoError { .. })
        ));
    }
}
