//! Entity World - owns entities and routes signals between them
//!
//! Entities are stored in a generational table and referenced everywhere
//! else by [`EntityKey`]. Keys of despawned entities go stale; routing to
//! a stale key is a silent no-op.

use std::cell::Cell;
use std::sync::Arc;

use schem_asset::AssetLoader;
use schem_core::{EntityKey, Error, Guid, NameHash, Result};
use schem_event::QueueConfig;
use serde::{Deserialize, Serialize};

use crate::descriptor::InterfaceDescriptor;
use crate::endpoint::Connection;
use crate::entity::{Entity, EntityScope, SignalRouter};
use crate::record::InterfaceDescriptorData;
use crate::value::Value;

/// World configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// File scope of top-level entities
    pub file_guid: Guid,
    /// Maximum nesting of routed signals before propagation is cut
    pub max_signal_depth: usize,
    /// Command queue settings for spawned interface descriptors
    pub queue: QueueConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            file_guid: Guid::nil(),
            max_signal_depth: 64,
            queue: QueueConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parse from JSON; missing keys take their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}

struct Slot {
    entity: Option<Arc<dyn Entity>>,
    generation: u32,
    /// Entity has begun simulation and not yet ended it
    started: bool,
}

/// Generational storage for entities
#[derive(Default)]
struct EntityTable {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    len: usize,
}

impl EntityTable {
    fn insert(&mut self, entity: Arc<dyn Entity>) -> EntityKey {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            slot.started = false;
            EntityKey::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                entity: Some(entity),
                generation: 0,
                started: false,
            });
            EntityKey::new(index, 0)
        }
    }

    fn get(&self, key: EntityKey) -> Option<&Arc<dyn Entity>> {
        if key.is_null() {
            return None;
        }
        self.slots
            .get(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.entity.as_ref())
    }

    fn remove(&mut self, key: EntityKey) -> Option<Arc<dyn Entity>> {
        if key.is_null() {
            return None;
        }
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.started = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(key.index());
        self.len -= 1;
        Some(entity)
    }

    /// Flip every live entity whose started flag differs from `started`
    /// and return them
    fn set_started(&mut self, started: bool) -> Vec<Arc<dyn Entity>> {
        self.slots
            .iter_mut()
            .filter(|slot| slot.started != started)
            .filter_map(|slot| {
                let entity = slot.entity.clone()?;
                slot.started = started;
                Some(entity)
            })
            .collect()
    }

    fn iter(&self) -> impl Iterator<Item = (EntityKey, &Arc<dyn Entity>)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity
                .as_ref()
                .map(|entity| (EntityKey::new(index as u32, slot.generation), entity))
        })
    }
}

/// Owner of a scene's entities and driver of the simulation
pub struct EntityWorld {
    config: WorldConfig,
    entities: EntityTable,
    frame: u64,
    simulating: bool,
    depth: Cell<usize>,
}

impl EntityWorld {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            entities: EntityTable::default(),
            frame: 0,
            simulating: false,
            depth: Cell::new(0),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Ticks run since creation
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    // ========== Entities ==========

    /// Scope for top-level entities
    pub fn root_scope(&self) -> EntityScope {
        EntityScope::root(self.config.file_guid)
    }

    /// Scope for children of `parent`, or None if the key is stale
    pub fn scope(&self, parent: EntityKey) -> Option<EntityScope> {
        self.entities
            .get(parent)
            .map(|entity| EntityScope::child_of(parent, entity.identity().file_guid))
    }

    /// Take ownership of an entity
    pub fn spawn<E: Entity>(&mut self, entity: E) -> EntityKey {
        self.spawn_arc(Arc::new(entity))
    }

    pub fn spawn_arc(&mut self, entity: Arc<dyn Entity>) -> EntityKey {
        let type_name = entity.type_name();
        let key = self.entities.insert(entity);
        if self.simulating {
            log::debug!("Spawned {} as {}; it starts on the next begin_simulation", type_name, key);
        } else {
            log::debug!("Spawned {} as {}", type_name, key);
        }
        key
    }

    /// Build an interface descriptor from a record and spawn it
    pub fn spawn_descriptor(
        &mut self,
        data: InterfaceDescriptorData,
        parent: Option<EntityKey>,
    ) -> Result<EntityKey> {
        let scope = match parent {
            Some(key) => self
                .scope(key)
                .ok_or_else(|| Error::Message(format!("Parent entity {} does not exist", key)))?,
            None => self.root_scope(),
        };
        let descriptor = InterfaceDescriptor::with_queue_config(data, &scope, self.config.queue)?;
        Ok(self.spawn(descriptor))
    }

    pub fn get(&self, key: EntityKey) -> Option<Arc<dyn Entity>> {
        self.entities.get(key).cloned()
    }

    /// Get an entity as its concrete type
    pub fn get_as<T: Entity>(&self, key: EntityKey) -> Option<Arc<T>> {
        self.get(key)?.into_any().downcast::<T>().ok()
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entities.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<EntityKey> {
        self.entities.iter().map(|(key, _)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len
    }

    pub fn is_empty(&self) -> bool {
        self.entities.len == 0
    }

    /// Destroy and remove an entity
    pub fn despawn(&mut self, key: EntityKey, loader: &dyn AssetLoader) -> bool {
        match self.entities.remove(key) {
            Some(entity) => {
                entity.destroy(loader);
                log::debug!("Despawned {} {}", entity.type_name(), key);
                true
            }
            None => false,
        }
    }

    /// Destroy and remove every entity
    pub fn destroy_all(&mut self, loader: &dyn AssetLoader) {
        for key in self.keys() {
            self.despawn(key, loader);
        }
        self.simulating = false;
    }

    fn snapshot(&self) -> Vec<Arc<dyn Entity>> {
        self.entities.iter().map(|(_, entity)| entity.clone()).collect()
    }

    // ========== Wiring ==========

    /// Connect a property on `src` to a port on `dst`. False if `src` does not exist.
    pub fn connect_property(&self, src: EntityKey, src_port: NameHash, dst: EntityKey, dst_port: NameHash) -> bool {
        self.with_entity(src, |entity| {
            entity.add_property_connection(src_port, Connection::new(dst, dst_port))
        })
    }

    pub fn connect_event(&self, src: EntityKey, src_port: NameHash, dst: EntityKey, dst_port: NameHash) -> bool {
        self.with_entity(src, |entity| {
            entity.add_event_connection(src_port, Connection::new(dst, dst_port))
        })
    }

    pub fn connect_link(&self, src: EntityKey, src_port: NameHash, dst: EntityKey, dst_port: NameHash) -> bool {
        self.with_entity(src, |entity| {
            entity.add_link_connection(src_port, Connection::new(dst, dst_port))
        })
    }

    fn with_entity(&self, key: EntityKey, f: impl FnOnce(&dyn Entity)) -> bool {
        match self.entities.get(key) {
            Some(entity) => {
                f(entity.as_ref());
                true
            }
            None => false,
        }
    }

    // ========== Simulation ==========

    /// Begin simulation of every entity not yet simulating.
    ///
    /// While the world is already simulating this starts only entities
    /// spawned since the last call.
    pub fn begin_simulation(&mut self, loader: &dyn AssetLoader) {
        let pending = self.entities.set_started(true);
        if self.simulating {
            if pending.is_empty() {
                log::warn!("World is already simulating");
                return;
            }
            log::info!("Beginning simulation of {} late entities", pending.len());
        } else {
            log::info!("Beginning simulation of {} entities", pending.len());
        }

        self.simulating = true;
        for entity in pending {
            entity.begin_simulation(loader);
        }
    }

    /// Run one frame: every entity's pre-frame update, then every post-frame update
    pub fn tick(&mut self) {
        self.frame += 1;
        let entities = self.snapshot();
        let router: &dyn SignalRouter = &*self;
        for entity in &entities {
            entity.update_pre_frame(router);
        }
        for entity in &entities {
            entity.update_post_frame(router);
        }
    }

    pub fn end_simulation(&mut self, loader: &dyn AssetLoader) {
        if !self.simulating {
            log::warn!("World ended simulation without beginning it");
            return;
        }
        self.simulating = false;
        for entity in self.entities.set_started(false) {
            entity.end_simulation(loader);
        }
        log::info!("Ended simulation after {} frames", self.frame);
    }

    // ========== Routing ==========

    fn deliver(&self, target: EntityKey, f: impl FnOnce(&dyn Entity)) {
        let entity = match self.entities.get(target) {
            Some(entity) => entity.clone(),
            None => {
                log::debug!("Signal to missing entity {} dropped", target);
                return;
            }
        };

        let depth = self.depth.get();
        if depth >= self.config.max_signal_depth {
            log::warn!(
                "Signal depth limit {} reached at {}; propagation cut",
                self.config.max_signal_depth,
                target
            );
            return;
        }

        self.depth.set(depth + 1);
        f(entity.as_ref());
        self.depth.set(depth);
    }
}

impl Default for EntityWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl SignalRouter for EntityWorld {
    fn route_event(&self, target: EntityKey, port: NameHash) {
        self.deliver(target, |entity| entity.on_event(port, self));
    }

    fn route_property(&self, target: EntityKey, port: NameHash, value: Value) {
        self.deliver(target, |entity| entity.receive_property(port, value, self));
    }

    fn route_link(&self, target: EntityKey, port: NameHash) {
        self.deliver(target, |entity| entity.on_link_changed(port));
    }
}
