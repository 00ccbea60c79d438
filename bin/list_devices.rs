use cli_table::{print_stdout, Cell, Style, Table};
use itertools::Itertools;
use strum::IntoEnumIterator;

use accel_device::{
    ClockType, DeviceError, DeviceResult, Library, MemoryInfo, TemperatureSensor,
};

fn or_na<T: ToString>(value: DeviceResult<T>) -> String {
    match value {
        Ok(v) => v.to_string(),
        Err(DeviceError::NotSupported { .. }) => String::from("N/A"),
        Err(e) => format!("error ({})", e.code().as_ref()),
    }
}

fn memory(info: DeviceResult<MemoryInfo>) -> String {
    or_na(info.map(|m| format!("{} / {} MiB", m.used >> 20, m.total >> 20)))
}

fn main() -> Result<(), DeviceError> {
    tracing_subscriber::fmt::init();

    let library = Library::from_env()?;
    library.init()?;
    println!("Driver version: {}", or_na(library.driver_version()));

    let mut rows = vec![];
    for device in library.devices()? {
        let clocks = ClockType::iter()
            .map(|c| format!("{c} {}", or_na(library.clock_info(device, c))))
            .join(", ");
        let temperatures = TemperatureSensor::iter()
            .map(|s| format!("{s} {}", or_na(library.temperature(device, s))))
            .join(", ");
        rows.push(vec![
            device.index().cell(),
            or_na(library.pci_info(device).map(|p| p.bus_id)).cell(),
            or_na(library.device_name(device)).cell(),
            or_na(library.uuid(device)).cell(),
            or_na(library.minor_number(device)).cell(),
            temperatures.cell(),
            or_na(library.power_usage(device).map(|mw| mw / 1000)).cell(),
            memory(library.memory_info(device)).cell(),
            clocks.cell(),
        ]);
    }

    let table = rows.table().title(vec![
        "Index".cell().bold(true),
        "PCI".cell().bold(true),
        "Name".cell().bold(true),
        "UUID".cell().bold(true),
        "Minor".cell().bold(true),
        "Temp (C)".cell().bold(true),
        "Power (W)".cell().bold(true),
        "Memory".cell().bold(true),
        "Clocks (MHz)".cell().bold(true),
    ]);
    print_stdout(table)?;

    library.shutdown()
}
