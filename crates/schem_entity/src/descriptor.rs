//! Interface Descriptor - the exposed port surface of a schematic
//!
//! A descriptor owns the properties, events and links declared by its
//! record, resolves property values when simulation begins, and drains
//! externally queued commands one per tick.

use std::any::Any;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use schem_asset::{AssetHandle, AssetLoader, PointerRef};
use schem_core::{EntityIdentity, EntityKey, Guid, NameHash, Result};
use schem_event::{CommandQueue, ObserverList, QueueConfig, QueueError, QueueSender, SubscriberId};

use crate::convert::FieldConverter;
use crate::endpoint::{
    Connection, Endpoint, EndpointTable, Event, EventDirection, Link, LinkDirection, Property,
};
use crate::entity::{Entity, EntityScope, SchematicsType, SignalRouter};
use crate::record::InterfaceDescriptorData;
use crate::value::Value;

/// Notification: an interface property changed
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChanged {
    pub hash: NameHash,
    pub value: Value,
}

/// Notification: an output event fired
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputEventTriggered {
    pub hash: NameHash,
}

/// Command delivered through the descriptor's queue
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueuedCommand {
    /// Trigger an event
    RaiseEvent(NameHash),
    /// Coerce text to the property's type and assign it
    SetProperty(NameHash, String),
}

/// Simulation lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Constructed,
    Simulating,
    Stopped,
}

/// An entity exposing a typed graph of properties, events and links
pub struct InterfaceDescriptor {
    data: InterfaceDescriptorData,
    identity: EntityIdentity,
    parent: Option<EntityKey>,
    properties: RwLock<EndpointTable<Property>>,
    events: RwLock<EndpointTable<Event>>,
    links: RwLock<EndpointTable<Link>>,
    queue: CommandQueue<QueuedCommand>,
    loaded_assets: Mutex<Vec<AssetHandle>>,
    state: Mutex<SimulationState>,
    converter: FieldConverter,
    property_changed: ObserverList<PropertyChanged>,
    output_event_triggered: ObserverList<OutputEventTriggered>,
}

impl InterfaceDescriptor {
    /// Construct from a record with an unbounded command queue
    pub fn new(data: InterfaceDescriptorData, scope: &EntityScope) -> Result<Self> {
        Self::with_queue_config(data, scope, QueueConfig::default())
    }

    /// Construct from a record.
    ///
    /// Fails only if the record's instance guid is malformed. No values are
    /// resolved and the asset loader is not touched.
    pub fn with_queue_config(
        data: InterfaceDescriptorData,
        scope: &EntityScope,
        queue: QueueConfig,
    ) -> Result<Self> {
        let instance_guid = Guid::parse(&data.instance_guid)?;
        let identity = EntityIdentity::new(scope.file_guid, instance_guid);

        let mut properties = EndpointTable::new();
        for field in &data.fields {
            properties.insert(Property::new(field.id, field.name.clone(), field.value_type));
        }

        let mut events = EndpointTable::new();
        for event in &data.input_events {
            events.insert(Event::new(event.id, EventDirection::Input));
        }
        for event in &data.output_events {
            events.insert(Event::new(event.id, EventDirection::Output));
        }

        let mut links = EndpointTable::new();
        for link in &data.input_links {
            links.insert(Link::new(link.id, LinkDirection::Input));
        }
        for link in &data.output_links {
            links.insert(Link::new(link.id, LinkDirection::Output));
        }

        log::debug!(
            "Created interface {} ({} properties, {} events, {} links)",
            identity,
            properties.len(),
            events.len(),
            links.len()
        );

        Ok(Self {
            data,
            identity,
            parent: scope.parent,
            properties: RwLock::new(properties),
            events: RwLock::new(events),
            links: RwLock::new(links),
            queue: CommandQueue::new(queue),
            loaded_assets: Mutex::new(Vec::new()),
            state: Mutex::new(SimulationState::Constructed),
            converter: FieldConverter::new(),
            property_changed: ObserverList::new(),
            output_event_triggered: ObserverList::new(),
        })
    }

    /// The record this descriptor was built from
    pub fn data(&self) -> &InterfaceDescriptorData {
        &self.data
    }

    pub fn identity(&self) -> EntityIdentity {
        self.identity
    }

    pub fn state(&self) -> SimulationState {
        *self.state.lock()
    }

    // ========== Simulation ==========

    /// Resolve every property's value from its record field.
    ///
    /// Values left over from a previous run are cleared first.
    ///
    /// External references are acquired through `loader` and owned until
    /// [`end_simulation`](Self::end_simulation). Failed loads and malformed
    /// inline values are logged and leave the property empty.
    pub fn begin_simulation(&self, loader: &dyn AssetLoader) {
        {
            let mut state = self.state.lock();
            if *state == SimulationState::Simulating {
                log::warn!("Interface {} is already simulating", self.identity);
                return;
            }
            *state = SimulationState::Simulating;
        }

        let mut acquired = Vec::new();
        let mut properties = self.properties.write();
        for property in properties.iter_mut() {
            property.value = Value::None;
            let field = match self.data.field(property.name_hash) {
                Some(field) => field,
                None => continue,
            };

            match &field.value_ref {
                PointerRef::External(reference) => {
                    match loader.load_asset(&self.identity, reference) {
                        Ok(handle) => {
                            property.value = Value::Asset(handle.clone());
                            acquired.push(handle);
                        }
                        Err(e) => {
                            log::warn!("Property '{}' on {}: {}", property.name, self.identity, e);
                        }
                    }
                }
                PointerRef::Internal(value) => property.value = value.clone(),
                PointerRef::Null if !field.value.is_empty() => {
                    match self.converter.convert_field(field) {
                        Ok(value) => property.value = value,
                        Err(e) => {
                            log::warn!("Property '{}' on {}: {}", property.name, self.identity, e);
                        }
                    }
                }
                PointerRef::Null => {}
            }
        }
        drop(properties);

        self.loaded_assets.lock().extend(acquired);
    }

    /// Release every asset acquired by [`begin_simulation`](Self::begin_simulation)
    pub fn end_simulation(&self, loader: &dyn AssetLoader) {
        {
            let mut state = self.state.lock();
            if *state != SimulationState::Simulating {
                log::warn!("Interface {} ended simulation while {:?}", self.identity, *state);
                return;
            }
            *state = SimulationState::Stopped;
        }

        let handles = std::mem::take(&mut *self.loaded_assets.lock());
        for handle in &handles {
            loader.unload_asset(handle);
        }
    }

    /// Execute at most one queued command
    pub fn update_pre_frame(&self, router: &dyn SignalRouter) {
        if let Some(command) = self.queue.pop() {
            self.dispatch(command, router);
        }
    }

    pub fn update_post_frame(&self, _router: &dyn SignalRouter) {}

    fn dispatch(&self, command: QueuedCommand, router: &dyn SignalRouter) {
        match command {
            QueuedCommand::RaiseEvent(hash) => self.on_event(hash, router),
            QueuedCommand::SetProperty(hash, raw) => {
                let value_type = match self.properties.read().get(hash) {
                    Some(property) => property.value_type,
                    None => return,
                };
                match self.converter.convert(&raw, value_type) {
                    Ok(value) => {
                        self.set_property(hash, value, router);
                    }
                    Err(e) => log::debug!("Dropped queued write to {}: {}", hash, e),
                }
            }
        }
    }

    /// Release resources and discard pending commands
    pub fn destroy(&self, loader: &dyn AssetLoader) {
        if self.state() == SimulationState::Simulating {
            self.end_simulation(loader);
        }
        let discarded = self.queue.clear();
        if discarded > 0 {
            log::debug!("Discarded {} queued commands on {}", discarded, self.identity);
        }
    }

    // ========== Queue ==========

    /// Queue an event trigger for a later tick
    pub fn queue_event(&self, hash: NameHash) -> core::result::Result<(), QueueError> {
        self.queue.push(QueuedCommand::RaiseEvent(hash))
    }

    /// Queue a textual property write for a later tick
    pub fn queue_property(
        &self,
        hash: NameHash,
        value: impl Into<String>,
    ) -> core::result::Result<(), QueueError> {
        self.queue.push(QueuedCommand::SetProperty(hash, value.into()))
    }

    /// Producer handle for other threads
    pub fn command_sender(&self) -> QueueSender<QueuedCommand> {
        self.queue.sender()
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    // ========== Dispatch ==========

    /// Trigger an event. Output events notify observers before fan-out.
    pub fn on_event(&self, hash: NameHash, router: &dyn SignalRouter) {
        let (is_output, connections) = match self.events.read().get(hash) {
            Some(event) => (event.is_output(), event.connections().to_vec()),
            None => return,
        };

        if is_output {
            self.output_event_triggered.notify(&OutputEventTriggered { hash });
        }
        for connection in connections {
            router.route_event(connection.target, connection.port);
        }
    }

    /// Notify observers of a property's current value
    pub fn on_property_changed(&self, hash: NameHash) {
        let value = match self.properties.read().get(hash) {
            Some(property) => property.value.clone(),
            None => return,
        };
        self.property_changed.notify(&PropertyChanged { hash, value });
    }

    pub fn on_link_changed(&self, _hash: NameHash) {}

    /// Assign a property, notify observers, then propagate along its connections.
    ///
    /// Returns false if the property does not exist.
    pub fn set_property(&self, hash: NameHash, value: Value, router: &dyn SignalRouter) -> bool {
        let connections = {
            let mut properties = self.properties.write();
            match properties.get_mut(hash) {
                Some(property) => {
                    property.value = value.clone();
                    property.connections().to_vec()
                }
                None => return false,
            }
        };

        self.on_property_changed(hash);
        for connection in connections {
            router.route_property(connection.target, connection.port, value.clone());
        }
        true
    }

    /// Signal every target connected to a link
    pub fn trigger_link(&self, hash: NameHash, router: &dyn SignalRouter) {
        let connections = match self.links.read().get(hash) {
            Some(link) => link.connections().to_vec(),
            None => return,
        };
        for connection in connections {
            router.route_link(connection.target, connection.port);
        }
    }

    // ========== Wiring ==========

    pub fn add_property_connection(&self, src_port: NameHash, target: EntityKey, dst_port: NameHash) {
        if let Some(property) = self.properties.write().get_mut(src_port) {
            property.add_connection(Connection::new(target, dst_port));
        }
    }

    pub fn add_event_connection(&self, src_port: NameHash, target: EntityKey, dst_port: NameHash) {
        if let Some(event) = self.events.write().get_mut(src_port) {
            event.add_connection(Connection::new(target, dst_port));
        }
    }

    pub fn add_link_connection(&self, src_port: NameHash, target: EntityKey, dst_port: NameHash) {
        if let Some(link) = self.links.write().get_mut(src_port) {
            link.add_connection(Connection::new(target, dst_port));
        }
    }

    // ========== Observers ==========

    pub fn on_output_property_changed<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&PropertyChanged) + Send + Sync + 'static,
    {
        self.property_changed.subscribe(handler)
    }

    pub fn on_output_event_triggered<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&OutputEventTriggered) + Send + Sync + 'static,
    {
        self.output_event_triggered.subscribe(handler)
    }

    /// Remove a subscriber from either channel
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.property_changed.unsubscribe(id) | self.output_event_triggered.unsubscribe(id)
    }

    // ========== Inspection ==========

    pub fn property_value(&self, hash: NameHash) -> Option<Value> {
        self.properties.read().get(hash).map(|p| p.value.clone())
    }

    pub fn property_hashes(&self) -> Vec<NameHash> {
        self.properties.read().hashes()
    }

    pub fn event_hashes(&self) -> Vec<NameHash> {
        self.events.read().hashes()
    }

    pub fn link_hashes(&self) -> Vec<NameHash> {
        self.links.read().hashes()
    }

    pub fn event_direction(&self, hash: NameHash) -> Option<EventDirection> {
        self.events.read().get(hash).map(|e| e.direction)
    }

    pub fn property_connections(&self, hash: NameHash) -> Vec<Connection> {
        self.properties
            .read()
            .get(hash)
            .map(|p| p.connections().to_vec())
            .unwrap_or_default()
    }

    pub fn event_connections(&self, hash: NameHash) -> Vec<Connection> {
        self.events
            .read()
            .get(hash)
            .map(|e| e.connections().to_vec())
            .unwrap_or_default()
    }

    pub fn link_connections(&self, hash: NameHash) -> Vec<Connection> {
        self.links
            .read()
            .get(hash)
            .map(|l| l.connections().to_vec())
            .unwrap_or_default()
    }

    /// Assets currently owned through simulation
    pub fn loaded_asset_count(&self) -> usize {
        self.loaded_assets.lock().len()
    }
}

impl SchematicsType for InterfaceDescriptor {
    fn on_event(&self, port: NameHash, router: &dyn SignalRouter) {
        InterfaceDescriptor::on_event(self, port, router);
    }

    fn on_property_changed(&self, port: NameHash) {
        InterfaceDescriptor::on_property_changed(self, port);
    }

    fn on_link_changed(&self, port: NameHash) {
        InterfaceDescriptor::on_link_changed(self, port);
    }

    fn receive_property(&self, port: NameHash, value: Value, router: &dyn SignalRouter) {
        let declared = match self.properties.read().get(port) {
            Some(property) => property.value_type,
            None => return,
        };
        if !value.value_type().is_compatible_with(&declared) {
            log::debug!(
                "Interface {} dropped {} value for {} property {}",
                self.identity,
                value.value_type(),
                declared,
                port
            );
            return;
        }
        self.set_property(port, value, router);
    }

    fn add_property_connection(&self, src_port: NameHash, connection: Connection) {
        InterfaceDescriptor::add_property_connection(self, src_port, connection.target, connection.port);
    }

    fn add_event_connection(&self, src_port: NameHash, connection: Connection) {
        InterfaceDescriptor::add_event_connection(self, src_port, connection.target, connection.port);
    }

    fn add_link_connection(&self, src_port: NameHash, connection: Connection) {
        InterfaceDescriptor::add_link_connection(self, src_port, connection.target, connection.port);
    }
}

impl Entity for InterfaceDescriptor {
    fn identity(&self) -> EntityIdentity {
        self.identity
    }

    fn parent(&self) -> Option<EntityKey> {
        self.parent
    }

    fn type_name(&self) -> &'static str {
        "InterfaceDescriptor"
    }

    fn begin_simulation(&self, loader: &dyn AssetLoader) {
        InterfaceDescriptor::begin_simulation(self, loader);
    }

    fn end_simulation(&self, loader: &dyn AssetLoader) {
        InterfaceDescriptor::end_simulation(self, loader);
    }

    fn update_pre_frame(&self, router: &dyn SignalRouter) {
        InterfaceDescriptor::update_pre_frame(self, router);
    }

    fn update_post_frame(&self, router: &dyn SignalRouter) {
        InterfaceDescriptor::update_post_frame(self, router);
    }

    fn destroy(&self, loader: &dyn AssetLoader) {
        InterfaceDescriptor::destroy(self, loader);
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
