//! Endpoints - Properties, events and links
//!
//! Each endpoint is a named, hashed connection point with an append-only
//! fan-out list. Targets are referenced by world key, never owned.

use std::collections::HashMap;

use schem_core::{EntityKey, NameHash};

use crate::value::{Value, ValueType};

/// Fan-out edge to a port on another (or the same) entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Target entity
    pub target: EntityKey,
    /// Port hash on the target
    pub port: NameHash,
}

impl Connection {
    pub const fn new(target: EntityKey, port: NameHash) -> Self {
        Self { target, port }
    }
}

/// Common endpoint behaviour
pub trait Endpoint {
    fn name_hash(&self) -> NameHash;

    /// Fan-out list in insertion order
    fn connections(&self) -> &[Connection];

    /// Append to the fan-out list
    fn add_connection(&mut self, connection: Connection);
}

macro_rules! impl_endpoint {
    ($ty:ty) => {
        impl Endpoint for $ty {
            fn name_hash(&self) -> NameHash {
                self.name_hash
            }

            fn connections(&self) -> &[Connection] {
                &self.connections
            }

            fn add_connection(&mut self, connection: Connection) {
                self.connections.push(connection);
            }
        }
    };
}

/// A value slot
#[derive(Clone, Debug)]
pub struct Property {
    pub name_hash: NameHash,
    pub name: String,
    /// Declared type; textual writes are coerced to it
    pub value_type: ValueType,
    pub value: Value,
    connections: Vec<Connection>,
}

impl Property {
    /// Create a property with no value
    pub fn new(name_hash: NameHash, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name_hash,
            name: name.into(),
            value_type,
            value: Value::None,
            connections: Vec::new(),
        }
    }
}

impl_endpoint!(Property);

/// Direction of an interface event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventDirection {
    /// Triggered from outside the interface; no observer notification
    Input,
    /// Leaves the interface; observers are notified before fan-out
    Output,
}

/// A trigger point
#[derive(Clone, Debug)]
pub struct Event {
    pub name_hash: NameHash,
    pub direction: EventDirection,
    connections: Vec<Connection>,
}

impl Event {
    pub fn new(name_hash: NameHash, direction: EventDirection) -> Self {
        Self {
            name_hash,
            direction,
            connections: Vec::new(),
        }
    }

    pub fn is_output(&self) -> bool {
        self.direction == EventDirection::Output
    }
}

impl_endpoint!(Event);

/// Direction of an interface link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkDirection {
    Input,
    Output,
}

/// An object reference port
#[derive(Clone, Debug)]
pub struct Link {
    pub name_hash: NameHash,
    pub direction: LinkDirection,
    connections: Vec<Connection>,
}

impl Link {
    pub fn new(name_hash: NameHash, direction: LinkDirection) -> Self {
        Self {
            name_hash,
            direction,
            connections: Vec::new(),
        }
    }
}

impl_endpoint!(Link);

/// Declaration-ordered endpoints keyed by name hash
#[derive(Clone, Debug)]
pub struct EndpointTable<E> {
    entries: Vec<E>,
    index: HashMap<NameHash, usize>,
}

impl<E: Endpoint> EndpointTable<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert an endpoint. A hash already present keeps its first declaration.
    pub fn insert(&mut self, endpoint: E) -> bool {
        let hash = endpoint.name_hash();
        if self.index.contains_key(&hash) {
            log::warn!("Duplicate endpoint {} ignored", hash);
            return false;
        }
        self.index.insert(hash, self.entries.len());
        self.entries.push(endpoint);
        true
    }

    pub fn get(&self, hash: NameHash) -> Option<&E> {
        self.index.get(&hash).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, hash: NameHash) -> Option<&mut E> {
        match self.index.get(&hash) {
            Some(&i) => self.entries.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, hash: NameHash) -> bool {
        self.index.contains_key(&hash)
    }

    /// Hashes in declaration order
    pub fn hashes(&self) -> Vec<NameHash> {
        self.entries.iter().map(Endpoint::name_hash).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: Endpoint> Default for EndpointTable<E> {
    fn default() -> Self {
        Self::new()
    }
}
