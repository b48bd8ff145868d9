//! Asset Loader - The capability entities use to acquire external resources
//!
//! Entities never reach for a global manager: the loader is passed into
//! construction and the simulation lifecycle, so tests can substitute their own.

use schem_core::EntityIdentity;
use thiserror::Error;

use crate::handle::AssetHandle;
use crate::reference::AssetRef;

/// Error during asset loading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Asset not known to the loader
    #[error("Asset not found: {0}")]
    NotFound(AssetRef),
    /// Asset is known but could not be loaded
    #[error("Failed to load {reference}: {reason}")]
    Failed { reference: AssetRef, reason: String },
}

impl From<LoadError> for schem_core::Error {
    fn from(e: LoadError) -> Self {
        schem_core::Error::AssetLoad(e.to_string())
    }
}

/// Result type for asset loading
pub type LoadResult<T> = Result<T, LoadError>;

/// Loads and releases assets by reference
pub trait AssetLoader: Send + Sync {
    /// Acquire the asset named by `reference` on behalf of `owner`.
    ///
    /// Every successful call must be paired with one [`AssetLoader::unload_asset`].
    fn load_asset(&self, owner: &EntityIdentity, reference: &AssetRef) -> LoadResult<AssetHandle>;

    /// Release one acquisition of `handle`
    fn unload_asset(&self, handle: &AssetHandle);
}
