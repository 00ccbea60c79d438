use std::fmt::Display;
use std::io;

use strum_macros::{AsRefStr, EnumIter};
use thiserror::Error;

use crate::hwmon::error::HwmonError;

/// Type alias for `Result<T, DeviceError>`.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// An error that occurred while managing devices or reading from them.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Library is not initialized")]
    Uninitialized,
    #[error("Library is already initialized")]
    AlreadyInitialized,
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("Not supported: {feature}")]
    NotSupported { feature: String },
    #[error("{name} not found")]
    NotFound { name: String },
    #[error("Insufficient size: {required} bytes required, {available} bytes given")]
    InsufficientSize { required: usize, available: usize },
    #[error("Driver not loaded: {cause}")]
    DriverNotLoaded { cause: String },
    #[error("Timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u32 },
    #[error("Device {id} is lost")]
    DeviceLost { id: u32 },
    #[error("Out of memory: {message}")]
    OutOfMemory { message: String },
    #[error("No data: {message}")]
    NoData { message: String },
    #[error("IoError: {cause}")]
    IoError { cause: io::Error },
    #[error("HwmonError: [device {device_id}] {cause}")]
    HwmonError { device_id: u32, cause: HwmonError },
    #[error("Unexpected value: {message}")]
    UnexpectedValue { message: String },
    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl DeviceError {
    pub(crate) fn invalid_argument<S: ToString>(message: S) -> DeviceError {
        DeviceError::InvalidArgument {
            message: message.to_string(),
        }
    }

    pub(crate) fn not_supported<D: Display>(feature: D) -> DeviceError {
        DeviceError::NotSupported {
            feature: feature.to_string(),
        }
    }

    pub(crate) fn not_found<D: Display>(name: D) -> DeviceError {
        DeviceError::NotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn driver_not_loaded<S: ToString>(cause: S) -> DeviceError {
        DeviceError::DriverNotLoaded {
            cause: cause.to_string(),
        }
    }

    pub(crate) fn out_of_memory<S: ToString>(message: S) -> DeviceError {
        DeviceError::OutOfMemory {
            message: message.to_string(),
        }
    }

    pub(crate) fn unexpected_value<S: ToString>(message: S) -> DeviceError {
        DeviceError::UnexpectedValue {
            message: message.to_string(),
        }
    }

    pub(crate) fn hwmon_error(device_id: u32, cause: HwmonError) -> DeviceError {
        DeviceError::HwmonError { device_id, cause }
    }

    /// Returns the status code this error is reported as.
    pub fn code(&self) -> ReturnCode {
        match self {
            DeviceError::Uninitialized => ReturnCode::Uninitialized,
            DeviceError::AlreadyInitialized => ReturnCode::AlreadyInitialized,
            DeviceError::InvalidArgument { .. } => ReturnCode::InvalidArgument,
            DeviceError::NotSupported { .. } => ReturnCode::NotSupported,
            DeviceError::NotFound { .. } => ReturnCode::NotFound,
            DeviceError::InsufficientSize { .. } => ReturnCode::InsufficientSize,
            DeviceError::DriverNotLoaded { .. } => ReturnCode::DriverNotLoaded,
            DeviceError::Timeout { .. } => ReturnCode::Timeout,
            DeviceError::DeviceLost { .. } => ReturnCode::DeviceLost,
            DeviceError::OutOfMemory { .. } => ReturnCode::OutOfMemory,
            DeviceError::NoData { .. } => ReturnCode::NoData,
            DeviceError::HwmonError { cause, .. } => match cause {
                HwmonError::ItemNotFound { .. } | HwmonError::SensorNotFound { .. } => {
                    ReturnCode::NotSupported
                }
                _ => ReturnCode::Unknown,
            },
            DeviceError::IoError { .. }
            | DeviceError::UnexpectedValue { .. }
            | DeviceError::Unknown { .. } => ReturnCode::Unknown,
        }
    }
}

impl From<io::Error> for DeviceError {
    fn from(e: io::Error) -> Self {
        Self::IoError { cause: e }
    }
}

/// Closed set of status codes every operation reports, numbered as in the driver's C header.
#[derive(AsRefStr, Clone, Copy, Debug, EnumIter, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum ReturnCode {
    Success = 0,
    Uninitialized = 1,
    InvalidArgument = 2,
    NotSupported = 3,
    AlreadyInitialized = 5,
    NotFound = 6,
    InsufficientSize = 7,
    DriverNotLoaded = 9,
    Timeout = 10,
    DeviceLost = 15,
    OutOfMemory = 20,
    NoData = 21,
    Unknown = 49,
}

impl ReturnCode {
    pub fn value(&self) -> u32 {
        *self as u32
    }
}

impl<T> From<&DeviceResult<T>> for ReturnCode {
    fn from(result: &DeviceResult<T>) -> Self {
        match result {
            Ok(_) => ReturnCode::Success,
            Err(e) => e.code(),
        }
    }
}

impl TryFrom<u32> for ReturnCode {
    type Error = DeviceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use strum::IntoEnumIterator;

        ReturnCode::iter()
            .find(|code| code.value() == value)
            .ok_or_else(|| DeviceError::invalid_argument(format!("unknown return code {value}")))
    }
}
