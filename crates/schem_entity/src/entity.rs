//! Entity traits
//!
//! [`SchematicsType`] is the port surface other entities signal into;
//! [`Entity`] adds identity and the simulation lifecycle. Both take `&self`:
//! entities live in the world as shared `Arc`s and guard their own state.

use std::any::Any;
use std::sync::Arc;

use schem_asset::AssetLoader;
use schem_core::{EntityIdentity, EntityKey, Guid, NameHash};

use crate::endpoint::Connection;
use crate::value::Value;

/// Delivers signals to entities by key
pub trait SignalRouter {
    /// Trigger `port` on `target`
    fn route_event(&self, target: EntityKey, port: NameHash);

    /// Deliver `value` to property `port` on `target`
    fn route_property(&self, target: EntityKey, port: NameHash, value: Value);

    /// Notify `target` that link `port` changed
    fn route_link(&self, target: EntityKey, port: NameHash);
}

/// Router that delivers nothing, for entities simulated outside a world
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRouter;

impl SignalRouter for NullRouter {
    fn route_event(&self, _target: EntityKey, _port: NameHash) {}

    fn route_property(&self, _target: EntityKey, _port: NameHash, _value: Value) {}

    fn route_link(&self, _target: EntityKey, _port: NameHash) {}
}

/// Port surface of anything that can be wired into a schematic.
///
/// Every method defaults to a no-op: an unknown port is not an error.
pub trait SchematicsType {
    /// Event `port` was triggered
    fn on_event(&self, _port: NameHash, _router: &dyn SignalRouter) {}

    /// Property `port` changed
    fn on_property_changed(&self, _port: NameHash) {}

    /// Link `port` changed
    fn on_link_changed(&self, _port: NameHash) {}

    /// A value arrived along a property connection into `port`
    fn receive_property(&self, _port: NameHash, _value: Value, _router: &dyn SignalRouter) {}

    fn add_property_connection(&self, _src_port: NameHash, _connection: Connection) {}

    fn add_event_connection(&self, _src_port: NameHash, _connection: Connection) {}

    fn add_link_connection(&self, _src_port: NameHash, _connection: Connection) {}
}

/// A runtime object instantiated from a serialized record
pub trait Entity: SchematicsType + Send + Sync + 'static {
    /// File and instance guids
    fn identity(&self) -> EntityIdentity;

    /// Parent entity, if any
    fn parent(&self) -> Option<EntityKey>;

    /// Name of the concrete type, for diagnostics
    fn type_name(&self) -> &'static str;

    fn begin_simulation(&self, _loader: &dyn AssetLoader) {}

    fn end_simulation(&self, _loader: &dyn AssetLoader) {}

    /// Called once per tick before the frame
    fn update_pre_frame(&self, _router: &dyn SignalRouter) {}

    /// Called once per tick after the frame
    fn update_post_frame(&self, _router: &dyn SignalRouter) {}

    /// Release everything the entity acquired
    fn destroy(&self, _loader: &dyn AssetLoader) {}

    /// Upcast for downcasting to the concrete type
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Where a new entity is created: its parent and the file it belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityScope {
    pub parent: Option<EntityKey>,
    pub file_guid: Guid,
}

impl EntityScope {
    /// Top-level scope of a file
    pub fn root(file_guid: Guid) -> Self {
        Self {
            parent: None,
            file_guid,
        }
    }

    /// Scope below `parent`, inheriting its file
    pub fn child_of(parent: EntityKey, file_guid: Guid) -> Self {
        Self {
            parent: Some(parent),
            file_guid,
        }
    }
}
