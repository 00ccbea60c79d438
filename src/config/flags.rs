use bitflags::bitflags;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{DeviceError, DeviceResult};

bitflags! {
    /// Flags accepted by [`Library::init_with_flags`](crate::Library::init_with_flags).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InitFlags: u32 {
        /// Install a log subscriber at `info` level.
        const LOG = 0x2;
        /// Raise the installed subscriber to `debug` level.
        const VERBOSE = 0x4;
    }
}

impl InitFlags {
    pub fn from_raw(raw: u32) -> DeviceResult<Self> {
        Self::from_bits(raw)
            .ok_or_else(|| DeviceError::invalid_argument(format!("unknown init flags {raw:#x}")))
    }

    /// Installs a global subscriber when [`InitFlags::LOG`] is set. `RUST_LOG` takes
    /// precedence over the level derived from the flags. A subscriber that is already
    /// installed is left in place.
    pub(crate) fn install_subscriber(&self) {
        if !self.contains(InitFlags::LOG) {
            return;
        }

        let level = if self.contains(InitFlags::VERBOSE) {
            "debug"
        } else {
            "info"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() -> DeviceResult<()> {
        assert_eq!(InitFlags::from_raw(0)?, InitFlags::empty());
        assert_eq!(
            InitFlags::from_raw(0x6)?,
            InitFlags::LOG | InitFlags::VERBOSE
        );
        assert!(matches!(
            InitFlags::from_raw(0x1),
            Err(DeviceError::InvalidArgument { .. })
        ));
        Ok(())
    }
}
