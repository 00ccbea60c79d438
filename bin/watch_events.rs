use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use accel_device::{DeviceError, EventType, Library};

const WAIT_TIMEOUT_MS: u32 = 5000;

fn init_logging(json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Prints the hardware events of all devices until interrupted.
///
/// Only critical errors are watched unless `--all` is given. `--json` switches the log
/// output to JSON lines.
#[tokio::main]
async fn main() -> Result<(), DeviceError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    init_logging(args.iter().any(|a| a == "--json"));
    let mask = if args.iter().any(|a| a == "--all") {
        EventType::all()
    } else {
        EventType::CRITICAL_ERR
    };

    let library = Arc::new(Library::from_env()?);
    library.init()?;
    let set = library.event_set_create()?;
    for device in library.devices()? {
        match library.device_register_events(device, mask, set) {
            Ok(events) => info!("Watching {events:?} on {device}"),
            Err(DeviceError::NotSupported { .. }) => warn!("{device} raises none of {mask:?}"),
            Err(e) => return Err(e),
        }
    }

    loop {
        tokio::select! {
            res = library.clone().event_set_wait_async(set, WAIT_TIMEOUT_MS) => match res {
                Ok(record) => {
                    let bus_id = library
                        .pci_info(record.device)
                        .map(|p| p.bus_id)
                        .unwrap_or_else(|_| record.device.to_string());
                    info!("{:?} on {bus_id}", record.event_type);
                }
                Err(DeviceError::Timeout { .. }) => continue,
                Err(DeviceError::DeviceLost { id }) => {
                    warn!("Device {id} is lost");
                    tokio::time::sleep(Duration::from_millis(WAIT_TIMEOUT_MS as u64)).await;
                }
                Err(DeviceError::InvalidArgument { message }) => {
                    warn!("Nothing to watch: {message}");
                    break;
                }
                Err(e) => return Err(e),
            },
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    library.event_set_free(set)?;
    library.shutdown()
}
