//! End-to-end tablet generation and the cached, versioned driver around it.

use tablet_kernel::geometry::{BoundingBox, Point2d};
use tablet_kernel::{
    Diagnostics, NormalizedShape, Outline, build_solids, normalize_shape, sample_outline,
};
use tracing::{debug, info, instrument};

use crate::classify::classify_faces;
use crate::config::{MaterialSlot, TabletConfig};
use crate::edges::{EdgeOverlay, feature_edges};
use crate::error::TabletError;
use crate::handle::{Handle, HandleFrame};
use crate::merge::merge_and_normalize;
use crate::mesh::TriangleMesh;
use crate::store::{MeshKey, MeshStore, TabletMesh};
use crate::tiling::{PhysicalDimensions, TextureTiling, compute_tiling};
use crate::uv::map_uvs;

/// Result of one pipeline run, before it is published.
#[derive(Debug, Clone, PartialEq)]
pub struct TabletBuild {
    pub mesh: TabletMesh,
    pub shape: NormalizedShape,
    /// Mesh-local bounds in the canonical frame.
    pub local_bounds: BoundingBox,
    /// Front-face Z in mesh-local units.
    pub front_z: f64,
    /// Perimeter of the sampled outline, in outline units.
    pub perimeter: f64,
    /// Extrusion depth actually used, in outline units.
    pub depth: f64,
    /// World-space extents the tiling was derived from.
    pub physical: PhysicalDimensions,
    pub diagnostics: Diagnostics,
}

fn materials_for(config: &TabletConfig, tiling: &TextureTiling) -> [MaterialSlot; 2] {
    let [mut cap, mut side] = config.material_slots();
    cap.repeat = tiling.face;
    side.repeat = tiling.side;
    [cap, side]
}

/// Run the whole pipeline for one outline and configuration. Pure and
/// deterministic: identical inputs give bit-identical buffers.
#[instrument(skip_all, fields(points = outline.len()))]
pub fn build_tablet(outline: &Outline, config: &TabletConfig) -> TabletBuild {
    let mut diagnostics = Diagnostics::new();
    let mut config = config.clone();
    config.sanitize(&mut diagnostics);
    let dims = config.to_dimensions();

    let shape = normalize_shape(outline, &dims, &mut diagnostics);
    let (resized, sampled) = sample_outline(
        outline,
        &shape,
        dims.corner_tolerance,
        config.sample_count,
        &mut diagnostics,
    );
    let solids = build_solids(outline, &resized, &shape, &dims, &mut diagnostics);
    let merged = merge_and_normalize(&solids, &shape);
    let classified = classify_faces(merged);
    let uvs = map_uvs(&classified, &sampled, &mut diagnostics);

    let geometry = &classified.geometry;
    let mut mesh = TriangleMesh::new();
    for ((tri, normal), uv) in geometry.triangles.iter().zip(&geometry.normals).zip(&uvs) {
        for (p, uv) in tri.iter().zip(uv) {
            mesh.add_vertex(*p, *normal, *uv);
        }
    }
    mesh.groups = classified.groups.clone();

    let local_bounds = geometry.bounding_box();
    let front_z = geometry.front_z();
    let physical = PhysicalDimensions::from_shape(&shape, sampled.total_length(), solids.depth);
    let tiling = compute_tiling(physical, &config.to_tiling());
    let edges = config.show_edges.then(|| feature_edges(&mesh));

    debug!(
        triangles = mesh.triangle_count(),
        groups = mesh.groups.len(),
        fallbacks = diagnostics.fallbacks.len(),
        "tablet built"
    );

    TabletBuild {
        mesh: TabletMesh {
            mesh,
            materials: materials_for(&config, &tiling),
            tiling,
            edges,
        },
        shape,
        local_bounds,
        front_z,
        perimeter: sampled.total_length(),
        depth: solids.depth,
        physical,
        diagnostics,
    }
}

/// Everything that changes the geometry. Texture, tiling and render hints
/// are left out so editing them never triggers a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    outline: u64,
    depth: u64,
    scale: u64,
    target_width: Option<u64>,
    target_height: Option<u64>,
    preserve_top: bool,
    bevel: bool,
    bevel_segments: u32,
    bevel_size: u64,
    bevel_thickness: u64,
    corner_tolerance: u64,
    sample_count: usize,
}

impl GeometryKey {
    pub fn new(outline: &Outline, config: &TabletConfig) -> Self {
        Self {
            outline: outline.fingerprint(),
            depth: config.depth.to_bits(),
            scale: config.scale.to_bits(),
            target_width: config.target_width.map(f64::to_bits),
            target_height: config.target_height.map(f64::to_bits),
            preserve_top: config.preserve_top,
            bevel: config.bevel,
            bevel_segments: config.bevel_options.segments,
            bevel_size: config.bevel_options.size.to_bits(),
            bevel_thickness: config.bevel_options.thickness.to_bits(),
            corner_tolerance: config.corner_tolerance.to_bits(),
            sample_count: config.sample_count,
        }
    }
}

/// Outcome of [`TabletGenerator::configure`].
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub handle: Handle,
    /// False when the cached geometry was reused.
    pub rebuilt: bool,
    pub diagnostics: Diagnostics,
}

struct Current {
    key: GeometryKey,
    handle: Handle,
    physical: PhysicalDimensions,
}

/// Owns the live mesh and republishes its [`Handle`] on every change.
/// Configuration changes are applied in call order; the latest one wins.
#[derive(Default)]
pub struct TabletGenerator {
    store: MeshStore,
    current: Option<Current>,
    version: u64,
}

impl TabletGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.current.as_ref().map(|c| &c.handle)
    }

    pub fn mesh(&self) -> Option<&TabletMesh> {
        self.current.as_ref().and_then(|c| self.store.get(c.handle.mesh))
    }

    /// Take in the loader's resolved polygons and a JSON configuration.
    pub fn configure_json(
        &mut self,
        polygons: Vec<Vec<Point2d>>,
        config: &str,
    ) -> Result<Published, TabletError> {
        let outline = Outline::from_polygons(polygons)?;
        let config = TabletConfig::from_json(config)?;
        Ok(self.configure(&outline, &config))
    }

    pub fn configure(&mut self, outline: &Outline, config: &TabletConfig) -> Published {
        let mut diagnostics = Diagnostics::new();
        let mut sanitized = config.clone();
        sanitized.sanitize(&mut diagnostics);
        let key = GeometryKey::new(outline, &sanitized);

        if let Some(current) = self.current.as_ref().filter(|c| c.key == key) {
            let handle = current.handle;
            let tiling = compute_tiling(current.physical, &sanitized.to_tiling());
            if let Some(live) = self.store.get_mut(handle.mesh) {
                live.materials = materials_for(&sanitized, &tiling);
                live.tiling = tiling;
                live.edges = refreshed_edges(&live.mesh, live.edges.take(), sanitized.show_edges);
            }
            debug!(version = handle.version, "geometry unchanged, tiling refreshed");
            return Published {
                handle,
                rebuilt: false,
                diagnostics,
            };
        }

        let build = build_tablet(outline, &sanitized);
        diagnostics.extend(build.diagnostics);
        let handle = self.publish(build.mesh, &build.shape, build.local_bounds, build.front_z);
        self.current = Some(Current {
            key,
            handle,
            physical: build.physical,
        });
        Published {
            handle,
            rebuilt: true,
            diagnostics,
        }
    }

    fn publish(
        &mut self,
        mesh: TabletMesh,
        shape: &NormalizedShape,
        local_bounds: BoundingBox,
        front_z: f64,
    ) -> Handle {
        if let Some(previous) = self.current.take() {
            self.dispose(previous.handle.mesh);
        }
        self.version += 1;
        let key = self.store.insert(mesh);
        let handle = Handle {
            mesh: key,
            front_z,
            units_per_meter: shape.units_per_meter(),
            world_width: shape.world_width(),
            world_height: shape.world_height(),
            version: self.version,
            frame: HandleFrame::new(shape.world_scale()),
            local_bounds,
        };
        info!(
            version = handle.version,
            world_width = handle.world_width,
            world_height = handle.world_height,
            "tablet published"
        );
        handle
    }

    fn dispose(&mut self, key: MeshKey) {
        if self.store.remove(key).is_some() {
            debug!("previous mesh disposed");
        }
    }
}

fn refreshed_edges(
    mesh: &TriangleMesh,
    existing: Option<EdgeOverlay>,
    show: bool,
) -> Option<EdgeOverlay> {
    if !show {
        return None;
    }
    existing.or_else(|| Some(feature_edges(mesh)))
}
