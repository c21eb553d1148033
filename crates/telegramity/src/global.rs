//! Process-wide client registry.
//!
//! Applications that prefer ambient access over passing a [`Client`] around
//! call [`init_global`] once at startup and [`global`] wherever they report.
//! Tests should build their own [`Registry`] or use
//! [`Client::with_transport`] directly.
//!
//! Policy:
//! - `init` builds a client at most once; later calls return the same
//!   instance, or the first failure, until the registry is closed.
//! - `close` closes the held client and resets the registry, so the next
//!   `init` builds a fresh client. It also clears a remembered failure.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::{Client, Error, Result};

enum RegistryState {
    Uninitialized,
    Ready(Arc<Client>),
    Failed(String),
}

/// One-time-initialized holder of a shared [`Client`].
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            state: parking_lot::const_mutex(RegistryState::Uninitialized),
        }
    }

    /// Build the shared client unless one was already built.
    pub fn init(&self, config: ClientConfig) -> Result<Arc<Client>> {
        let mut state = self.state.lock();
        match &*state {
            RegistryState::Ready(client) => {
                debug!("Global client already initialized");
                return Ok(Arc::clone(client));
            }
            RegistryState::Failed(reason) => return Err(Error::InitFailed(reason.clone())),
            RegistryState::Uninitialized => {}
        }

        match Client::new(config) {
            Ok(client) => {
                let client = Arc::new(client);
                *state = RegistryState::Ready(Arc::clone(&client));
                info!("Global error reporting client initialized");
                Ok(client)
            }
            Err(e) => {
                *state = RegistryState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The shared client.
    ///
    /// # Panics
    ///
    /// Panics if [`init`](Self::init) has not succeeded. Use
    /// [`try_get`](Self::try_get) to handle that case.
    pub fn get(&self) -> Arc<Client> {
        match self.try_get() {
            Ok(client) => client,
            Err(e) => panic!("telegramity: {e}"),
        }
    }

    pub fn try_get(&self) -> Result<Arc<Client>> {
        match &*self.state.lock() {
            RegistryState::Ready(client) => Ok(Arc::clone(client)),
            RegistryState::Failed(reason) => Err(Error::InitFailed(reason.clone())),
            RegistryState::Uninitialized => Err(Error::NotInitialized),
        }
    }

    /// Close the shared client, if any, and reset the registry.
    pub fn close(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), RegistryState::Uninitialized);
        match previous {
            RegistryState::Ready(client) => {
                info!("Closing global error reporting client");
                client.close()
            }
            RegistryState::Failed(_) | RegistryState::Uninitialized => Ok(()),
        }
    }
}

static GLOBAL: Registry = Registry::new();

/// Initialize the process-wide client. See [`Registry::init`].
pub fn init_global(config: ClientConfig) -> Result<Arc<Client>> {
    GLOBAL.init(config)
}

/// The process-wide client.
///
/// # Panics
///
/// Panics if [`init_global`] has not succeeded.
pub fn global() -> Arc<Client> {
    GLOBAL.get()
}

/// The process-wide client, or [`Error::NotInitialized`].
pub fn try_global() -> Result<Arc<Client>> {
    GLOBAL.try_get()
}

/// Close and reset the process-wide client.
pub fn close_global() -> Result<()> {
    GLOBAL.close()
}
