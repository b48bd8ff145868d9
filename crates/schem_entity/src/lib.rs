//! # schem_entity - Schematics Entities
//!
//! Runtime side of the level editor's schematics:
//! - **Values**: typed property values and text coercion
//! - **Endpoints**: properties, events and links with fan-out connections
//! - **Interface Descriptor**: the exposed port surface of a schematic,
//!   with a thread-safe command queue drained one command per tick
//! - **Entity World**: owns entities by generational key and routes
//!   signals along connections
//!
//! ## Example
//!
//! ```ignore
//! use schem_entity::prelude::*;
//!
//! let mut world = EntityWorld::default();
//! let loader = LoadedAssetManager::new();
//!
//! let record = InterfaceDescriptorData::new("7d2c1b3a-5f44-4c2e-9a61-0b8e3f5d9c10")
//!     .with_field(DataField::new("Speed", ValueType::Float).with_value("2.5"))
//!     .with_input_event("Start");
//! let key = world.spawn_descriptor(record, None)?;
//!
//! world.begin_simulation(&loader);
//! let interface = world.get_as::<InterfaceDescriptor>(key).unwrap();
//! interface.queue_event(NameHash::from_name("Start"))?;
//! world.tick();
//! world.end_simulation(&loader);
//! ```

pub mod convert;
pub mod descriptor;
pub mod endpoint;
pub mod entity;
pub mod mesh;
pub mod record;
pub mod value;
pub mod world;

pub use convert::FieldConverter;
pub use descriptor::{
    InterfaceDescriptor, OutputEventTriggered, PropertyChanged, QueuedCommand, SimulationState,
};
pub use endpoint::{
    Connection, Endpoint, EndpointTable, Event, EventDirection, Link, LinkDirection, Property,
};
pub use entity::{Entity, EntityScope, NullRouter, SchematicsType, SignalRouter};
pub use mesh::{MeshEntity, MeshEntityData};
pub use record::{DataField, DynamicEvent, DynamicLink, InterfaceDescriptorData};
pub use value::{Value, ValueType};
pub use world::{EntityWorld, WorldConfig};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::descriptor::{InterfaceDescriptor, PropertyChanged, OutputEventTriggered};
    pub use crate::entity::{Entity, EntityScope, SchematicsType, SignalRouter};
    pub use crate::record::{DataField, InterfaceDescriptorData};
    pub use crate::value::{Value, ValueType};
    pub use crate::world::{EntityWorld, WorldConfig};
    pub use schem_asset::prelude::*;
    pub use schem_core::prelude::*;
}
