//! Asset Handle - Reference to loaded assets
//!
//! A handle is shared by every owner that loaded the same reference.
//! Cloning a handle is cheap and does not touch the reference count;
//! only the loader acquires and releases.

use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::reference::AssetRef;

/// Unique identifier for an asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(pub u64);

impl AssetId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Residency of an asset with its loader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LoadState {
    /// Evicted, or never loaded
    NotLoaded = 0,
    /// Resident and ready
    Loaded = 1,
}

impl From<u8> for LoadState {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Loaded,
            _ => Self::NotLoaded,
        }
    }
}

/// Internal handle data
pub struct HandleData {
    /// Asset ID
    pub id: AssetId,
    /// The reference this handle was loaded from
    pub reference: AssetRef,
    /// Asset type name, as registered with the loader
    pub type_name: String,
    state: AtomicU32,
    /// Number of outstanding loads
    ref_count: AtomicUsize,
}

impl HandleData {
    /// Create new handle data
    pub fn new(id: AssetId, reference: AssetRef, type_name: impl Into<String>) -> Self {
        Self {
            id,
            reference,
            type_name: type_name.into(),
            state: AtomicU32::new(LoadState::NotLoaded as u32),
            ref_count: AtomicUsize::new(0),
        }
    }

    /// Get current load state
    pub fn state(&self) -> LoadState {
        LoadState::from(self.state.load(Ordering::Acquire) as u8)
    }

    /// Set load state
    pub fn set_state(&self, state: LoadState) {
        self.state.store(state as u32, Ordering::Release);
    }

    /// Get reference count
    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Increment reference count
    pub fn add_ref(&self) -> usize {
        self.ref_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement reference count, saturating at zero
    pub fn release(&self) -> usize {
        let mut current = self.ref_count.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return 0;
            }
            match self.ref_count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current - 1,
                Err(actual) => current = actual,
            }
        }
    }

    /// Check if loaded
    pub fn is_loaded(&self) -> bool {
        self.state() == LoadState::Loaded
    }
}

/// Handle to a loaded asset
#[derive(Clone)]
pub struct AssetHandle {
    data: Arc<HandleData>,
}

impl AssetHandle {
    /// Create a handle around shared data
    pub fn from_data(data: Arc<HandleData>) -> Self {
        Self { data }
    }

    /// Get the asset ID
    pub fn id(&self) -> AssetId {
        self.data.id
    }

    /// Get the reference this handle was loaded from
    pub fn reference(&self) -> &AssetRef {
        &self.data.reference
    }

    /// Get the asset type name
    pub fn type_name(&self) -> &str {
        &self.data.type_name
    }

    /// Get the load state
    pub fn state(&self) -> LoadState {
        self.data.state()
    }

    /// Check if the asset is loaded
    pub fn is_loaded(&self) -> bool {
        self.data.is_loaded()
    }

    /// Number of outstanding loads of this asset
    pub fn ref_count(&self) -> usize {
        self.data.ref_count()
    }

    /// Get the underlying handle data
    pub fn data(&self) -> &Arc<HandleData> {
        &self.data
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.data.id == other.data.id
    }
}

impl Eq for AssetHandle {}

impl Hash for AssetHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.id.hash(state);
    }
}

impl core::fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AssetHandle")
            .field("id", &self.data.id)
            .field("type", &self.data.type_name)
            .field("state", &self.state())
            .field("refs", &self.ref_count())
            .finish()
    }
}
