use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::backend::{Backend, DeviceIdentity, Metric, MetricValue, SysfsBackend};
use crate::config::{InitFlags, LibraryConfig};
use crate::error::{DeviceError, DeviceResult};
use crate::event::{EventHub, EventSink};
use crate::handle::DeviceHandle;
use crate::registry::Registry;

/// State of one initialized session.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) generation: u64,
    pub(crate) flags: InitFlags,
    pub(crate) registry: Registry,
    pub(crate) events: Arc<EventHub>,
}

#[derive(Debug)]
enum LibraryState {
    Uninitialized,
    Initialized(Session),
}

/// Entry point to the devices of a [`Backend`].
///
/// Nothing but [`Library::init`] works before the library is initialized. Handles and
/// event sets are issued per session and stop working once [`Library::shutdown`] is
/// called, even if the library is initialized again.
///
/// # Examples
/// ```rust,no_run
/// use accel_device::{DeviceResult, Library};
///
/// fn main() -> DeviceResult<()> {
///     let library = Library::from_env()?;
///     library.init()?;
///     for index in 0..library.device_count()? {
///         let device = library.handle_by_index(index)?;
///         println!("{}: {}", library.pci_info(device)?.bus_id, library.device_name(device)?);
///     }
///     library.shutdown()
/// }
/// ```
#[derive(Debug)]
pub struct Library {
    pub(crate) backend: Arc<dyn Backend>,
    config: LibraryConfig,
    state: RwLock<LibraryState>,
    generations: AtomicU64,
}

impl Library {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_config(backend, LibraryConfig::default())
    }

    pub fn with_config(backend: Arc<dyn Backend>, config: LibraryConfig) -> Self {
        Self {
            backend,
            config,
            state: RwLock::new(LibraryState::Uninitialized),
            generations: AtomicU64::new(0),
        }
    }

    /// A library reading the sysfs tree, configured from `ACCEL_*` environment variables.
    pub fn from_env() -> DeviceResult<Self> {
        let config = LibraryConfig::from_env()?;
        let backend = SysfsBackend::from_config(&config);
        Ok(Self::with_config(Arc::new(backend), config))
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn init(&self) -> DeviceResult<()> {
        self.init_with_flags(0)
    }

    /// Starts a session: discovers the devices and attaches the backend.
    ///
    /// Fails with [`DeviceError::AlreadyInitialized`], leaving the running session as it
    /// is, when called twice without a [`Library::shutdown`] in between.
    pub fn init_with_flags(&self, flags: u32) -> DeviceResult<()> {
        let flags = InitFlags::from_raw(flags)?;

        let mut state = self.state.write();
        if let LibraryState::Initialized(_) = *state {
            return Err(DeviceError::AlreadyInitialized);
        }

        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let registry = Registry::new(generation, self.backend.discover()?)?;
        let ordinals: HashMap<u32, u32> = registry
            .iter()
            .map(|(handle, device)| (device.id, handle.index()))
            .collect();
        let events = Arc::new(EventHub::new(ordinals, self.config.max_event_sets()));
        self.backend.attach(EventSink::new(&events))?;

        let count = registry.count();
        *state = LibraryState::Initialized(Session {
            generation,
            flags,
            registry,
            events,
        });
        flags.install_subscriber();
        info!("Initialized session {generation} with {count} device(s)");
        Ok(())
    }

    /// Ends the session. Outstanding handles become invalid, event sets are freed and
    /// their waiters return [`DeviceError::Uninitialized`].
    pub fn shutdown(&self) -> DeviceResult<()> {
        let mut state = self.state.write();
        let session = match std::mem::replace(&mut *state, LibraryState::Uninitialized) {
            LibraryState::Initialized(session) => session,
            LibraryState::Uninitialized => return Err(DeviceError::Uninitialized),
        };

        session.events.close_all();
        self.backend.release();
        info!("Shut down session {}", session.generation);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.state.read(), LibraryState::Initialized(_))
    }

    pub(crate) fn with_session<T, F>(&self, f: F) -> DeviceResult<T>
    where
        F: FnOnce(&Session) -> DeviceResult<T>,
    {
        match &*self.state.read() {
            LibraryState::Initialized(session) => f(session),
            LibraryState::Uninitialized => Err(DeviceError::Uninitialized),
        }
    }

    pub(crate) fn with_device<T, F>(&self, handle: DeviceHandle, f: F) -> DeviceResult<T>
    where
        F: FnOnce(&DeviceIdentity) -> T,
    {
        self.with_session(|session| session.registry.validate(handle).map(f))
    }

    pub(crate) fn read_metric(&self, handle: DeviceHandle, metric: Metric) -> DeviceResult<MetricValue> {
        self.with_session(|session| {
            let id = session.registry.validate(handle)?.id;
            self.backend.read_metric(id, metric)
        })
    }

    pub fn device_count(&self) -> DeviceResult<u32> {
        self.with_session(|session| Ok(session.registry.count()))
    }

    pub fn handle_by_index(&self, index: u32) -> DeviceResult<DeviceHandle> {
        self.with_session(|session| session.registry.handle_by_index(index))
    }

    pub fn handle_by_pci_bus_id(&self, bus_id: &str) -> DeviceResult<DeviceHandle> {
        self.with_session(|session| session.registry.handle_by_pci_bus_id(bus_id))
    }

    pub fn handle_by_uuid(&self, uuid: &str) -> DeviceResult<DeviceHandle> {
        self.with_session(|session| session.registry.handle_by_uuid(uuid))
    }

    pub fn handle_by_serial(&self, serial: &str) -> DeviceResult<DeviceHandle> {
        self.with_session(|session| session.registry.handle_by_serial(serial))
    }

    /// Checks that `handle` was issued by the running session.
    pub fn validate(&self, handle: DeviceHandle) -> DeviceResult<()> {
        self.with_device(handle, |_| ())
    }

    /// Handles of all devices, in index order.
    pub fn devices(&self) -> DeviceResult<Vec<DeviceHandle>> {
        self.with_session(|session| Ok(session.registry.iter().map(|(h, _)| h).collect()))
    }

    pub fn driver_version(&self) -> DeviceResult<String> {
        self.with_session(|_| self.backend.driver_version())
    }

    /// Flags the running session was initialized with.
    pub fn init_flags(&self) -> DeviceResult<InitFlags> {
        self.with_session(|session| Ok(session.flags))
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if let LibraryState::Initialized(session) = &*self.state.get_mut() {
            session.events.close_all();
            self.backend.release();
        }
    }
}
