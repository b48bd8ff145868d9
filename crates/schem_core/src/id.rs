//! Identifiers: guids, name hashes and generational entity keys

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A globally unique identifier for files and instances
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Guid(Uuid);

impl Guid {
    /// The all-zero guid, used for root scopes
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Create from a UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a new random guid
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from a string, failing on malformed input
    pub fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| Error::MalformedGuid {
                input: input.to_string(),
            })
    }

    /// Check if this is the nil guid
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::nil()
    }
}

impl FromStr for Guid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self.0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 32-bit hash naming a property, event or link
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameHash(pub i32);

impl NameHash {
    /// Wrap a precomputed hash
    #[inline]
    pub const fn new(hash: i32) -> Self {
        Self(hash)
    }

    /// Hash a name the way the serialized data does (seed 5381, x33, xor)
    pub fn from_name(name: &str) -> Self {
        let mut hash: u32 = 5381;
        for byte in name.bytes() {
            hash = hash.wrapping_mul(33) ^ byte as u32;
        }
        Self(hash as i32)
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(&self) -> i32 {
        self.0
    }
}

impl From<i32> for NameHash {
    fn from(hash: i32) -> Self {
        Self(hash)
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash(0x{:08x})", self.0 as u32)
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0 as u32)
    }
}

/// Identity of an entity: the file it was loaded from and its instance within it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityIdentity {
    pub file_guid: Guid,
    pub instance_guid: Guid,
}

impl EntityIdentity {
    pub const fn new(file_guid: Guid, instance_guid: Guid) -> Self {
        Self {
            file_guid,
            instance_guid,
        }
    }
}

impl fmt::Display for EntityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.file_guid, self.instance_guid)
    }
}

/// Non-owning key into a world's entity table, with a generation counter for safe reuse
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    /// Lower 32 bits: index, Upper 32 bits: generation
    bits: u64,
}

impl EntityKey {
    /// Create a key from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
        }
    }

    /// Create a null/invalid key
    #[inline]
    pub const fn null() -> Self {
        Self { bits: u64::MAX }
    }

    /// Check if this key is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == u64::MAX
    }

    /// Get the index portion
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    /// Get the generation portion
    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    /// Get the raw bits
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }
}

impl Default for EntityKey {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "EntityKey(null)")
        } else {
            write!(f, "EntityKey({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}
