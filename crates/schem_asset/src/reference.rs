//! Pointer references from serialized data

use core::fmt;
use schem_core::{EntityIdentity, Guid};
use serde::{Deserialize, Serialize};

/// Names an external resource: the file it lives in and its instance within it
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub file_guid: Guid,
    pub instance_guid: Guid,
}

impl AssetRef {
    pub const fn new(file_guid: Guid, instance_guid: Guid) -> Self {
        Self {
            file_guid,
            instance_guid,
        }
    }

    /// Reference the entity with the given identity
    pub fn from_identity(identity: &EntityIdentity) -> Self {
        Self::new(identity.file_guid, identity.instance_guid)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.file_guid, self.instance_guid)
    }
}

/// Typed pointer reference held by a serialized field
///
/// `T` is the payload of an internal reference: a value stored inline in
/// the same record, resolved without going through the loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target")]
pub enum PointerRef<T> {
    Null,
    Internal(T),
    External(AssetRef),
}

impl<T> PointerRef<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, PointerRef::Null)
    }

    /// Get the external reference, if any
    pub fn external(&self) -> Option<&AssetRef> {
        match self {
            PointerRef::External(reference) => Some(reference),
            _ => None,
        }
    }

    /// Get the inline payload, if any
    pub fn internal(&self) -> Option<&T> {
        match self {
            PointerRef::Internal(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for PointerRef<T> {
    fn default() -> Self {
        PointerRef::Null
    }
}
