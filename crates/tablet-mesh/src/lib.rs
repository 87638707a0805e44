pub mod classify;
pub mod config;
pub mod edges;
pub mod error;
pub mod handle;
pub mod merge;
pub mod mesh;
pub mod pipeline;
pub mod store;
pub mod tiling;
pub mod uv;

pub use config::{MaterialSlot, Side, TabletConfig};
pub use edges::EdgeOverlay;
pub use error::TabletError;
pub use handle::{Handle, HandleFrame};
pub use mesh::{CAP_MATERIAL, MaterialGroup, SIDE_MATERIAL, TriangleMesh};
pub use pipeline::{GeometryKey, Published, TabletBuild, TabletGenerator, build_tablet};
pub use store::{MeshKey, MeshStore, TabletMesh};
pub use tiling::{PhysicalDimensions, Repeat, TextureTiling, TilingOptions, compute_tiling};
