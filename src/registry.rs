use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::backend::DeviceIdentity;
use crate::error::{DeviceError, DeviceResult};
use crate::handle::DeviceHandle;
use crate::pci::PciAddress;

lazy_static! {
    // e.g. 01P0-HL2080A0-15-TNAP24-22-07-05
    static ref UUID_FMT: Regex = Regex::new(r"^[[:alnum:]]+(-[[:alnum:]]+)*$").unwrap();
}

/// Devices discovered at the start of a session, ordered by backend id.
///
/// The position of a device in this list is the index of its handle.
#[derive(Debug)]
pub(crate) struct Registry {
    generation: u64,
    devices: Vec<DeviceIdentity>,
}

impl Registry {
    pub(crate) fn new(generation: u64, mut devices: Vec<DeviceIdentity>) -> DeviceResult<Self> {
        devices.sort_by_key(|d| d.id);

        let mut ids = HashSet::new();
        let mut addresses = HashSet::new();
        let mut uuids = HashSet::new();
        for device in devices.iter() {
            if !ids.insert(device.id)
                || !addresses.insert(device.pci_address)
                || !uuids.insert(device.uuid.to_lowercase())
            {
                return Err(DeviceError::unexpected_value(format!(
                    "device {} ({}, {}) was discovered twice",
                    device.id, device.pci_address, device.uuid
                )));
            }
        }

        for (index, device) in devices.iter().enumerate() {
            debug!(
                "Found device {} as index {index} at {} ({})",
                device.id, device.pci_address, device.uuid
            );
        }

        Ok(Self {
            generation,
            devices,
        })
    }

    pub(crate) fn count(&self) -> u32 {
        self.devices.len() as u32
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (DeviceHandle, &DeviceIdentity)> + '_ {
        self.devices
            .iter()
            .enumerate()
            .map(|(index, device)| (self.handle(index), device))
    }

    fn handle(&self, index: usize) -> DeviceHandle {
        DeviceHandle::new(index as u32, self.generation)
    }

    pub(crate) fn handle_by_index(&self, index: u32) -> DeviceResult<DeviceHandle> {
        if index < self.count() {
            Ok(self.handle(index as usize))
        } else {
            Err(DeviceError::not_found(format!("device index {index}")))
        }
    }

    pub(crate) fn handle_by_pci_bus_id(&self, bus_id: &str) -> DeviceResult<DeviceHandle> {
        let address: PciAddress = bus_id.parse()?;
        self.find(|device| device.pci_address == address)
            .ok_or_else(|| DeviceError::not_found(format!("device at {address}")))
    }

    pub(crate) fn handle_by_uuid(&self, uuid: &str) -> DeviceResult<DeviceHandle> {
        let uuid = uuid.trim();
        if !UUID_FMT.is_match(uuid) {
            return Err(DeviceError::invalid_argument(format!(
                "malformed UUID '{uuid}'"
            )));
        }
        self.find(|device| device.uuid.eq_ignore_ascii_case(uuid))
            .ok_or_else(|| DeviceError::not_found(format!("device {uuid}")))
    }

    pub(crate) fn handle_by_serial(&self, serial: &str) -> DeviceResult<DeviceHandle> {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(DeviceError::invalid_argument("empty serial number"));
        }
        self.find(|device| device.serial.as_deref() == Some(serial))
            .ok_or_else(|| DeviceError::not_found(format!("device with serial {serial}")))
    }

    fn find<F: Fn(&DeviceIdentity) -> bool>(&self, predicate: F) -> Option<DeviceHandle> {
        self.devices
            .iter()
            .position(predicate)
            .map(|index| self.handle(index))
    }

    /// Resolves a handle of this session to the identity of its device.
    pub(crate) fn validate(&self, handle: DeviceHandle) -> DeviceResult<&DeviceIdentity> {
        if handle.generation != self.generation {
            return Err(DeviceError::invalid_argument(format!(
                "{handle} belongs to a previous session"
            )));
        }
        self.identity(handle.index)
    }

    pub(crate) fn identity(&self, index: u32) -> DeviceResult<&DeviceIdentity> {
        self.devices
            .get(index as usize)
            .ok_or_else(|| DeviceError::invalid_argument(format!("no device has index {index}")))
    }
}
