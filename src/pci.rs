use std::fmt::Display;
use std::str::FromStr;

use nom::bytes::complete::{tag, take_while_m_n};
use nom::combinator::{all_consuming, map_res};
use nom::sequence::{terminated, tuple};

use crate::error::DeviceError;

/// A PCI bus address in `domain:bus:device.function` form, e.g. `0000:19:00.0`.
///
/// The domain may be omitted when parsing, in which case it is `0`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PciAddress {
    pub domain: u32,
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciAddress {
    pub fn new(domain: u32, bus: u8, device: u8, function: u8) -> Self {
        Self {
            domain,
            bus,
            device,
            function,
        }
    }
}

impl FromStr for PciAddress {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn hex<'a, O, const MAX: usize>(
        ) -> impl FnMut(&'a str) -> nom::IResult<&'a str, O, nom::error::Error<&'a str>>
        where
            O: TryFrom<u32>,
        {
            map_res(
                take_while_m_n(1, MAX, |c: char| c.is_ascii_hexdigit()),
                |s: &str| {
                    u32::from_str_radix(s, 16)
                        .map_err(|_| ())
                        .and_then(|v| O::try_from(v).map_err(|_| ()))
                },
            )
        }

        let input = s.trim();
        let parsed = all_consuming(tuple((
            terminated(hex::<u32, 8>(), tag(":")),
            terminated(hex::<u8, 2>(), tag(":")),
            terminated(hex::<u8, 2>(), tag(".")),
            hex::<u8, 1>(),
        )))(input)
        .or_else(|_| {
            all_consuming(tuple((
                terminated(hex::<u8, 2>(), tag(":")),
                terminated(hex::<u8, 2>(), tag(".")),
                hex::<u8, 1>(),
            )))(input)
            .map(|(rest, (bus, device, function))| (rest, (0, bus, device, function)))
        });

        match parsed {
            Ok((_, (domain, bus, device, function))) if device < 32 && function < 8 => {
                Ok(PciAddress::new(domain, bus, device, function))
            }
            _ => Err(DeviceError::invalid_argument(format!(
                "malformed PCI bus id '{s}'"
            ))),
        }
    }
}

impl Display for PciAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

/// PCI attributes of a device.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PciInfo {
    pub bus: u32,
    /// Normalized `domain:bus:device.function` string.
    pub bus_id: String,
    pub device: u32,
    pub domain: u32,
    /// The combined 16-bit device id and 16-bit vendor id.
    pub pci_device_id: u32,
    /// e.g. `16.0 GT/s PCIe`
    pub link_speed: String,
    pub link_width: u32,
}
