//! Thread-safe registry handle

use std::sync::{Arc, LazyLock, Mutex};

use crate::registry::Registry;

/// A [`Registry`] behind a lock
///
/// Every operation runs under the lock, so the dirty-propagation walk that
/// follows an assignment is never observed half done.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

static GLOBAL: LazyLock<SharedRegistry> = LazyLock::new(SharedRegistry::default);

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// The process-wide registry, for composition roots that do not want to
    /// thread their own through
    pub fn global() -> &'static SharedRegistry {
        &GLOBAL
    }

    /// Run `f` with exclusive access to the registry
    pub fn with<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        let mut registry = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut registry)
    }
}
