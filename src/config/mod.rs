mod env;
mod flags;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use flags::InitFlags;

use crate::error::{DeviceError, DeviceResult};

pub const DEFAULT_SYSFS_ROOT: &str = "/sys";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_EVENT_SETS: usize = 64;

/// Settings of a [`Library`](crate::Library) instance.
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use accel_device::LibraryConfig;
///
/// let config = LibraryConfig::builder()
///     .sysfs_root("/sys")
///     .poll_interval(Duration::from_millis(50))
///     .build()
///     .unwrap();
/// assert_eq!(config.max_event_sets(), 64);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LibraryConfig {
    sysfs_root: PathBuf,
    poll_interval: Duration,
    max_event_sets: usize,
}

impl LibraryConfig {
    pub fn builder() -> LibraryConfigBuilder {
        LibraryConfigBuilder::default()
    }

    /// Default settings overlaid with `ACCEL_*` environment variables.
    pub fn from_env() -> DeviceResult<Self> {
        Self::builder().or_env().build()
    }

    pub fn sysfs_root(&self) -> &Path {
        &self.sysfs_root
    }

    /// Period of the internal polling used while waiting on a backend without native wake-ups.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_event_sets(&self) -> usize {
        self.max_event_sets
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_event_sets: DEFAULT_MAX_EVENT_SETS,
        }
    }
}

#[derive(Debug, Default)]
pub struct LibraryConfigBuilder {
    sysfs_root: Option<PathBuf>,
    poll_interval: Option<Duration>,
    max_event_sets: Option<usize>,
    use_env: bool,
}

impl LibraryConfigBuilder {
    pub fn sysfs_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.sysfs_root = Some(path.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn max_event_sets(mut self, count: usize) -> Self {
        self.max_event_sets = Some(count);
        self
    }

    /// Lets environment variables, when present, take precedence over the values given so far.
    pub fn or_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    pub fn build(self) -> DeviceResult<LibraryConfig> {
        self.build_with(|key| std::env::var(key))
    }

    fn build_with<F>(self, lookup: F) -> DeviceResult<LibraryConfig>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut builder = self;
        if builder.use_env {
            builder = env::overlay(builder, lookup)?;
        }

        let defaults = LibraryConfig::default();
        let config = LibraryConfig {
            sysfs_root: builder.sysfs_root.unwrap_or(defaults.sysfs_root),
            poll_interval: builder.poll_interval.unwrap_or(defaults.poll_interval),
            max_event_sets: builder.max_event_sets.unwrap_or(defaults.max_event_sets),
        };

        if config.poll_interval.is_zero() {
            return Err(DeviceError::invalid_argument("poll interval must be positive"));
        }
        if config.max_event_sets == 0 {
            return Err(DeviceError::invalid_argument(
                "at least one event set must be allowed",
            ));
        }

        Ok(config)
    }
}
