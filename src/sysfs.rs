pub(crate) mod habanalabs {
    use std::collections::HashMap;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    use lazy_static::lazy_static;
    use regex::Regex;

    pub const DRIVER_NAME: &str = "habanalabs";

    pub mod file {
        pub const BOARD_ID: &str = "board_id";
        pub const CLK_THROTTLE_REASON: &str = "clk_throttle_reason";
        pub const DEV: &str = "dev";
        pub const DEVICE_TYPE: &str = "device_type";
        pub const DRAM_TOTAL: &str = "dram_total";
        pub const DRAM_USED: &str = "dram_used";
        pub const ECC_ERRORS: &str = "ecc_errors";
        pub const ECC_MODE: &str = "ecc_mode";
        pub const ECC_MODE_PENDING: &str = "ecc_mode_pending";
        pub const ENERGY_CONSUMPTION: &str = "energy_consumption";
        pub const MAC_ADDR: &str = "mac_addr";
        pub const MAX_POWER: &str = "max_power";
        pub const PCI_ADDR: &str = "pci_addr";
        pub const PCI_DEVICE_ID: &str = "pci_device_id";
        pub const PCIE_REPLAY_COUNT: &str = "pcie_replay_count";
        pub const PCIE_RX_BYTES: &str = "pcie_rx_bytes";
        pub const PCIE_TX_BYTES: &str = "pcie_tx_bytes";
        pub const PERF_STATE: &str = "perf_state";
        pub const PERSISTENCE_MODE: &str = "persistence_mode";
        pub const SERIAL_NUMBER: &str = "serial_number";
        pub const STATUS: &str = "status";
        pub const TEMP_THRESHOLDS: &str = "temp_thresholds";
        pub const UTILIZATION: &str = "utilization";
        pub const UUID: &str = "uuid";
        pub const VERSION: &str = "version";
    }

    /// Value of the `status` file while the device is healthy.
    pub const STATUS_OPERATIONAL: &str = "Operational";

    lazy_static! {
        static ref DEVICE_DIR_PATTERN: Regex = Regex::new(r"^hl(?P<id>\d+)$").unwrap();
    }

    pub(crate) fn class_root<P: AsRef<Path>>(sysfs: P) -> PathBuf {
        sysfs.as_ref().join(format!("class/{DRIVER_NAME}"))
    }

    pub(crate) fn device_root<P: AsRef<Path>>(sysfs: P, id: u32) -> PathBuf {
        class_root(sysfs).join(format!("hl{id}"))
    }

    pub(crate) fn module_root<P: AsRef<Path>>(sysfs: P) -> PathBuf {
        sysfs.as_ref().join(format!("module/{DRIVER_NAME}"))
    }

    /// Returns the device id of a class directory entry (e.g., 3 for `hl3`).
    pub(crate) fn parse_device_dir<S: AsRef<str>>(name: S) -> Option<u32> {
        DEVICE_DIR_PATTERN
            .captures(name.as_ref())
            .and_then(|c| c.name("id"))
            .and_then(|m| m.as_str().parse().ok())
    }

    pub(crate) fn read_to_string<P: AsRef<Path>, F: AsRef<Path>>(
        root: P,
        file: F,
    ) -> io::Result<String> {
        let path = root.as_ref().join(file);
        fs::read_to_string(path).map(|s| s.trim_end().to_string())
    }

    /// Parses `key: value` lines (e.g. `corrected volatile: 3`) into a map keyed by
    /// lowercase, underscore-joined names (e.g. `corrected_volatile`).
    pub(crate) fn build_counter_map<S: AsRef<str>>(contents: S) -> HashMap<String, u64> {
        let mut map = HashMap::new();

        for line in contents.as_ref().trim().lines() {
            if let Some((key, value)) = line.trim().split_once(':') {
                if let Ok(value) = value.trim().parse::<u64>() {
                    let key = key.trim().to_lowercase().replace(' ', "_");
                    map.insert(key, value);
                }
            }
        }

        map
    }

    pub(crate) fn parse_zero_or_one_to_bool<S: AsRef<str>>(contents: S) -> Option<bool> {
        match contents.as_ref().trim() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        }
    }

    /// Parses the `major:minor` contents of a `dev` file and returns the minor number.
    pub(crate) fn parse_minor<S: AsRef<str>>(contents: S) -> Option<u32> {
        contents
            .as_ref()
            .trim()
            .split_once(':')
            .and_then(|(_, minor)| minor.parse().ok())
    }

    /// Parses decimal or `0x`-prefixed hexadecimal numbers.
    pub(crate) fn parse_number<S: AsRef<str>>(contents: S) -> Option<u64> {
        let contents = contents.as_ref().trim();
        match contents.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => contents.parse().ok(),
        }
    }
}

pub(crate) mod pci {
    use std::io;
    use std::path::{Path, PathBuf};

    pub const CURRENT_LINK_SPEED: &str = "current_link_speed";
    pub const CURRENT_LINK_WIDTH: &str = "current_link_width";

    pub(crate) fn device_path<P: AsRef<Path>>(sysfs: P, bdf: &str) -> PathBuf {
        sysfs
            .as_ref()
            .join(format!("bus/pci/devices/{}", bdf.trim()))
    }

    pub(crate) fn read_attribute<P: AsRef<Path>>(
        sysfs: P,
        bdf: &str,
        attribute: &str,
    ) -> io::Result<String> {
        std::fs::read_to_string(device_path(sysfs, bdf).join(attribute))
            .map(|s| s.trim().to_string())
    }

    pub(crate) mod hwmon {
        use std::path::{Path, PathBuf};

        pub fn path<P: AsRef<Path>>(sysfs: P, bdf: &str) -> PathBuf {
            super::device_path(sysfs, bdf).join("hwmon")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_counter_map() {
        let contents = r"corrected volatile: 3
corrected aggregate: 12
uncorrected volatile: 0
uncorrected aggregate: 1
garbage line";

        let res = habanalabs::build_counter_map(contents);
        assert_eq!(res.len(), 4);
        assert_eq!(res.get("corrected_volatile"), Some(&3));
        assert_eq!(res.get("uncorrected_aggregate"), Some(&1));
    }

    #[test]
    fn test_parse_zero_or_one_to_bool() {
        assert_eq!(habanalabs::parse_zero_or_one_to_bool("1\n"), Some(true));
        assert_eq!(habanalabs::parse_zero_or_one_to_bool("0"), Some(false));
        assert_eq!(habanalabs::parse_zero_or_one_to_bool(""), None);
    }

    #[test]
    fn test_parse_device_dir() {
        assert_eq!(habanalabs::parse_device_dir("hl0"), Some(0));
        assert_eq!(habanalabs::parse_device_dir("hl12"), Some(12));
        assert_eq!(habanalabs::parse_device_dir("hl_controlD0"), None);
        assert_eq!(habanalabs::parse_device_dir("hl"), None);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(habanalabs::parse_minor("508:2\n"), Some(2));
        assert_eq!(habanalabs::parse_minor("508"), None);
        assert_eq!(habanalabs::parse_number("0x1da3"), Some(0x1da3));
        assert_eq!(habanalabs::parse_number(" 42 "), Some(42));
        assert_eq!(habanalabs::parse_number("x42"), None);
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            habanalabs::device_root("/sys", 1),
            std::path::PathBuf::from("/sys/class/habanalabs/hl1")
        );
        assert_eq!(
            pci::hwmon::path("/sys", "0000:19:00.0\n"),
            std::path::PathBuf::from("/sys/bus/pci/devices/0000:19:00.0/hwmon")
        );
    }
}
