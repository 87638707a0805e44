use slotmap::{SlotMap, new_key_type};

use crate::config::MaterialSlot;
use crate::edges::EdgeOverlay;
use crate::mesh::TriangleMesh;
use crate::tiling::TextureTiling;

new_key_type! {
    pub struct MeshKey;
}

/// A published tablet: render buffers plus everything the renderer needs to
/// bind materials.
#[derive(Debug, Clone, PartialEq)]
pub struct TabletMesh {
    pub mesh: TriangleMesh,
    /// Indexed by material id (0 = cap, 1 = side).
    pub materials: [MaterialSlot; 2],
    pub tiling: TextureTiling,
    pub edges: Option<EdgeOverlay>,
}

/// Owner of live meshes. Consumers hold a [`MeshKey`] and borrow through the
/// store; a removed key simply stops resolving.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: SlotMap<MeshKey, TabletMesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: TabletMesh) -> MeshKey {
        self.meshes.insert(mesh)
    }

    pub fn get(&self, key: MeshKey) -> Option<&TabletMesh> {
        self.meshes.get(key)
    }

    pub fn get_mut(&mut self, key: MeshKey) -> Option<&mut TabletMesh> {
        self.meshes.get_mut(key)
    }

    pub fn remove(&mut self, key: MeshKey) -> Option<TabletMesh> {
        self.meshes.remove(key)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
