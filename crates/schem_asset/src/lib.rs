//! # schem_asset - Asset Handles and Loading
//!
//! Asset access for simulated entities:
//! - Typed pointer references (null, internal, external)
//! - Reference-counted handles shared per external reference
//! - An [`AssetLoader`] capability passed explicitly to entities
//! - [`LoadedAssetManager`], the default in-memory loader
//!
//! ## Example
//!
//! ```ignore
//! use schem_asset::prelude::*;
//!
//! let manager = LoadedAssetManager::new();
//! manager.register(mesh_ref, AssetMeta::new("Cloth/Cape", "MeshAsset"));
//!
//! let handle = manager.load_asset(&owner, &mesh_ref)?;
//! assert!(handle.is_loaded());
//!
//! manager.unload_asset(&handle);
//! ```

pub mod handle;
pub mod loader;
pub mod manager;
pub mod reference;

pub use handle::{AssetHandle, AssetId, HandleData, LoadState};
pub use loader::{AssetLoader, LoadError, LoadResult};
pub use manager::{AssetEvent, AssetMeta, LoadedAssetManager, LoaderStats};
pub use reference::{AssetRef, PointerRef};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::handle::{AssetHandle, AssetId, LoadState};
    pub use crate::loader::{AssetLoader, LoadError, LoadResult};
    pub use crate::manager::{AssetEvent, AssetMeta, LoadedAssetManager};
    pub use crate::reference::{AssetRef, PointerRef};
}
