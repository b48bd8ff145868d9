//! Loaded Asset Manager - Default in-memory asset loader
//!
//! Assets are registered in a catalog by reference. Loading a registered
//! reference makes it resident and hands out the shared handle; each
//! unload drops one reference and the last one evicts the asset.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use schem_core::EntityIdentity;

use crate::handle::{AssetHandle, AssetId, HandleData, LoadState};
use crate::loader::{AssetLoader, LoadError, LoadResult};
use crate::reference::AssetRef;

/// Event from the asset manager
#[derive(Clone, Debug, PartialEq)]
pub enum AssetEvent {
    /// Asset became resident
    Loaded(AssetId),
    /// Last reference was released and the asset evicted
    Unloaded(AssetId),
    /// A load request failed
    Failed(AssetRef, String),
}

/// Catalog entry for a loadable asset
#[derive(Clone, Debug, PartialEq)]
pub struct AssetMeta {
    /// Asset name (usually its path in the project)
    pub name: String,
    /// Asset type name
    pub type_name: String,
}

impl AssetMeta {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Load/unload counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Successful loads
    pub loads: u64,
    /// Accepted unloads
    pub unloads: u64,
    /// Currently resident assets
    pub resident: usize,
}

/// In-memory asset loader shared between entities
pub struct LoadedAssetManager {
    /// Registered assets
    catalog: RwLock<BTreeMap<AssetRef, AssetMeta>>,
    /// Resident assets by reference
    resident: RwLock<BTreeMap<AssetRef, Arc<HandleData>>>,
    next_id: AtomicU64,
    loads: AtomicU64,
    unloads: AtomicU64,
    events: RwLock<Vec<AssetEvent>>,
}

impl LoadedAssetManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(BTreeMap::new()),
            resident: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            loads: AtomicU64::new(0),
            unloads: AtomicU64::new(0),
            events: RwLock::new(Vec::new()),
        }
    }

    /// Register an asset so it can be loaded
    pub fn register(&self, reference: AssetRef, meta: AssetMeta) {
        self.catalog.write().insert(reference, meta);
    }

    /// Remove an asset from the catalog. Resident copies stay until released.
    pub fn unregister(&self, reference: &AssetRef) -> Option<AssetMeta> {
        self.catalog.write().remove(reference)
    }

    /// Get catalog metadata
    pub fn meta(&self, reference: &AssetRef) -> Option<AssetMeta> {
        self.catalog.read().get(reference).cloned()
    }

    /// Check if an asset is currently resident
    pub fn is_resident(&self, reference: &AssetRef) -> bool {
        self.resident.read().contains_key(reference)
    }

    /// Outstanding loads of a reference (0 when not resident)
    pub fn ref_count(&self, reference: &AssetRef) -> usize {
        self.resident
            .read()
            .get(reference)
            .map(|data| data.ref_count())
            .unwrap_or(0)
    }

    /// Number of resident assets
    pub fn resident_count(&self) -> usize {
        self.resident.read().len()
    }

    /// Get counters
    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            loads: self.loads.load(Ordering::Relaxed),
            unloads: self.unloads.load(Ordering::Relaxed),
            resident: self.resident_count(),
        }
    }

    /// Drain events
    pub fn drain_events(&self) -> Vec<AssetEvent> {
        self.events.write().drain(..).collect()
    }

    fn fail(&self, error: LoadError) -> LoadError {
        let (reference, reason) = match &error {
            LoadError::NotFound(reference) => (*reference, error.to_string()),
            LoadError::Failed { reference, reason } => (*reference, reason.clone()),
        };
        self.events.write().push(AssetEvent::Failed(reference, reason));
        error
    }
}

impl Default for LoadedAssetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader for LoadedAssetManager {
    fn load_asset(&self, owner: &EntityIdentity, reference: &AssetRef) -> LoadResult<AssetHandle> {
        let meta = match self.meta(reference) {
            Some(meta) => meta,
            None => return Err(self.fail(LoadError::NotFound(*reference))),
        };

        let mut resident = self.resident.write();
        let data = resident
            .entry(*reference)
            .or_insert_with(|| {
                let id = AssetId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
                let data = Arc::new(HandleData::new(id, *reference, meta.type_name.clone()));
                data.set_state(LoadState::Loaded);
                log::debug!("Loaded asset '{}' ({:?}) for {}", meta.name, id, owner);
                self.events.write().push(AssetEvent::Loaded(id));
                data
            })
            .clone();
        // Counted under the lock so a concurrent unload cannot evict it first
        data.add_ref();
        drop(resident);

        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(AssetHandle::from_data(data))
    }

    fn unload_asset(&self, handle: &AssetHandle) {
        let mut resident = self.resident.write();

        let data = match resident.get(handle.reference()) {
            Some(data) if Arc::ptr_eq(data, handle.data()) => data.clone(),
            _ => {
                log::warn!(
                    "Unload of asset {:?} ({}) that is not resident",
                    handle.id(),
                    handle.reference()
                );
                return;
            }
        };

        self.unloads.fetch_add(1, Ordering::Relaxed);
        if data.release() == 0 {
            resident.remove(handle.reference());
            data.set_state(LoadState::NotLoaded);
            log::debug!("Evicted asset {:?} ({})", data.id, data.reference);
            self.events.write().push(AssetEvent::Unloaded(data.id));
        }
    }
}
