use std::sync::Arc;

use accel_device::{DeviceError, InitFlags, Library, MockBackend, MockDevice, PciAddress};

// The global subscriber can be set once per process, so this file holds a single test.
#[test]
fn test_subscriber_installed_only_by_successful_init() {
    let unloaded = Library::new(Arc::new(MockBackend::builder().driver_not_loaded().build()));
    assert!(matches!(
        unloaded.init_with_flags(InitFlags::LOG.bits()),
        Err(DeviceError::DriverNotLoaded { .. })
    ));
    assert!(!tracing::dispatcher::has_been_set());

    let backend = MockBackend::builder()
        .device(MockDevice::new(0, PciAddress::new(0, 0x19, 0, 0), "hl-0"))
        .build();
    let library = Library::new(Arc::new(backend));
    library.init_with_flags(InitFlags::LOG.bits()).unwrap();
    assert!(tracing::dispatcher::has_been_set());
}
