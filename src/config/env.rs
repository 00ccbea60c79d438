use std::env::VarError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::LibraryConfigBuilder;
use crate::error::{DeviceError, DeviceResult};

pub(crate) const ENV_SYSFS_ROOT: &str = "ACCEL_SYSFS_ROOT";
pub(crate) const ENV_POLL_INTERVAL_MS: &str = "ACCEL_POLL_INTERVAL_MS";
pub(crate) const ENV_MAX_EVENT_SETS: &str = "ACCEL_MAX_EVENT_SETS";

fn lookup<T, F>(lookup: &F, key: &str) -> DeviceResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DeviceError::invalid_argument(format!("{key}='{value}' is not valid"))),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(DeviceError::invalid_argument(format!("{key}: {err}"))),
    }
}

pub(super) fn overlay<F>(mut builder: LibraryConfigBuilder, env: F) -> DeviceResult<LibraryConfigBuilder>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    if let Some(root) = lookup::<PathBuf, _>(&env, ENV_SYSFS_ROOT)? {
        builder.sysfs_root = Some(root);
    }
    if let Some(ms) = lookup::<u64, _>(&env, ENV_POLL_INTERVAL_MS)? {
        builder.poll_interval = Some(Duration::from_millis(ms));
    }
    if let Some(count) = lookup::<usize, _>(&env, ENV_MAX_EVENT_SETS)? {
        builder.max_event_sets = Some(count);
    }

    Ok(builder)
}
