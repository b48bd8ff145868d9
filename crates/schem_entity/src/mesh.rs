//! Mesh entity - a spatial entity that renders one mesh asset

use std::any::Any;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use schem_asset::{AssetHandle, AssetLoader, AssetRef};
use schem_core::{EntityIdentity, EntityKey, Guid, NameHash, Result};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityScope, SchematicsType, SignalRouter};
use crate::value::Value;

/// Serialized mesh entity
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshEntityData {
    pub instance_guid: String,
    pub mesh: Option<AssetRef>,
    pub position: [f32; 3],
}

/// Entity holding a mesh from construction until destroyed
pub struct MeshEntity {
    identity: EntityIdentity,
    parent: Option<EntityKey>,
    mesh: Mutex<Option<AssetHandle>>,
    position: RwLock<[f32; 3]>,
}

impl MeshEntity {
    /// Port accepting a `Vec3` position
    pub fn position_port() -> NameHash {
        NameHash::from_name("Position")
    }

    /// Construct and acquire the mesh.
    ///
    /// A mesh that fails to load is logged and the entity is created without it.
    pub fn new(data: &MeshEntityData, scope: &EntityScope, loader: &dyn AssetLoader) -> Result<Self> {
        let identity = EntityIdentity::new(scope.file_guid, Guid::parse(&data.instance_guid)?);

        let mesh = data.mesh.as_ref().and_then(|reference| {
            loader
                .load_asset(&identity, reference)
                .map_err(|e| log::warn!("Mesh entity {}: {}", identity, e))
                .ok()
        });

        Ok(Self {
            identity,
            parent: scope.parent,
            mesh: Mutex::new(mesh),
            position: RwLock::new(data.position),
        })
    }

    pub fn mesh(&self) -> Option<AssetHandle> {
        self.mesh.lock().clone()
    }

    pub fn position(&self) -> [f32; 3] {
        *self.position.read()
    }
}

impl SchematicsType for MeshEntity {
    fn receive_property(&self, port: NameHash, value: Value, _router: &dyn SignalRouter) {
        if port != Self::position_port() {
            return;
        }
        match value {
            Value::Vec3(position) => *self.position.write() = position,
            other => log::debug!("Mesh entity {} ignored position {:?}", self.identity, other),
        }
    }
}

impl Entity for MeshEntity {
    fn identity(&self) -> EntityIdentity {
        self.identity
    }

    fn parent(&self) -> Option<EntityKey> {
        self.parent
    }

    fn type_name(&self) -> &'static str {
        "MeshEntity"
    }

    fn destroy(&self, loader: &dyn AssetLoader) {
        if let Some(mesh) = self.mesh.lock().take() {
            loader.unload_asset(&mesh);
        }
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
