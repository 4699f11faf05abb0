//! Provider bookkeeping shared by the feature modules.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{IdCounter, ProviderId};
use crate::rpc::Proxy;

// ============================================================================
// ProviderMap
// ============================================================================

/// Providers registered by the extension, keyed by the id sent to the host.
pub(crate) struct ProviderMap<T> {
    ids: IdCounter,
    entries: Mutex<FxHashMap<ProviderId, T>>,
}

impl<T> Default for ProviderMap<T> {
    fn default() -> Self {
        Self {
            ids: IdCounter::default(),
            entries: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<T: Clone + Send + 'static> ProviderMap<T> {
    /// Stores `provider` under a fresh id.
    pub(crate) fn insert(&self, provider: T) -> Result<ProviderId> {
        let id = ProviderId::new(self.ids.next()?);
        self.entries.lock().insert(id, provider);
        Ok(id)
    }

    /// Returns the provider for `id`.
    pub(crate) fn get(&self, id: ProviderId) -> Result<T> {
        self.entries
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::provider_not_found(id))
    }

    /// Removes `id`; returns `false` if it was not registered.
    pub(crate) fn remove(&self, id: ProviderId) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

// ============================================================================
// Registration
// ============================================================================

/// Handle returned when a provider, transformer or command is registered.
///
/// Dropping the handle keeps the registration alive; call
/// [`Registration::unsubscribe`] to remove it on both sides.
pub struct Registration {
    id: ProviderId,
    proxy: Proxy,
    remove_local: Box<dyn FnOnce() -> bool + Send + Sync>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Registration {
    pub(crate) fn new<T: Clone + Send + 'static>(
        id: ProviderId,
        proxy: Proxy,
        map: &Arc<ProviderMap<T>>,
    ) -> Self {
        let map = Arc::clone(map);
        Self {
            id,
            proxy,
            remove_local: Box::new(move || map.remove(id)),
        }
    }

    /// Id the host knows this registration by.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// Removes the registration locally, then asks the host to drop it.
    ///
    /// # Errors
    ///
    /// Returns the error of the remote `unregister` call. The local entry
    /// is removed regardless.
    pub async fn unsubscribe(self) -> Result<()> {
        let Self {
            id,
            proxy,
            remove_local,
        } = self;

        if remove_local() {
            debug!(%id, "Registration removed");
        }
        proxy.call_void("unregister", vec![json!(id)]).await
    }
}

// ============================================================================
// Tests
// ============================================================================
