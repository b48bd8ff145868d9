//! # schem_core - Schematics Core
//!
//! Shared primitives for the entity simulation crates:
//! - **Identity**: file/instance guids and the pair that names an entity
//! - **Name hashes**: 32-bit hashes that key properties, events and links
//! - **Entity keys**: generational indices into a world-owned entity table
//! - **Errors**: the error type surfaced to callers

pub mod error;
pub mod id;

pub use error::*;
pub use id::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::id::{EntityIdentity, EntityKey, Guid, NameHash};
}
