//! Texture repeat counts derived from the physical size of the tablet.

use serde::{Deserialize, Serialize};
use tablet_kernel::{EPS, NormalizedShape};
use tracing::debug;

/// How textures are repeated across the two material slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilingOptions {
    /// Derive repeat counts from a fixed world-space tile size.
    pub auto_repeat: bool,
    /// World units per cap tile.
    pub tile_size: f64,
    /// World units per side tile; falls back to `tile_size`.
    pub side_tile_size: Option<f64>,
    /// Explicit repeats used when `auto_repeat` is off.
    pub face_repeat: Repeat,
    pub side_repeat: Repeat,
}

impl Default for TilingOptions {
    fn default() -> Self {
        Self {
            auto_repeat: true,
            tile_size: 0.10,
            side_tile_size: None,
            face_repeat: Repeat::ONCE,
            side_repeat: Repeat::ONCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    pub x: f64,
    pub y: f64,
}

impl Repeat {
    pub const ONCE: Self = Self { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Real-world extents of the tablet, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalDimensions {
    pub width: f64,
    pub height: f64,
    /// Length of the side wall unwrapped along the outline.
    pub perimeter: f64,
    pub depth: f64,
}

impl PhysicalDimensions {
    /// `perimeter` and `depth` are in outline units and are converted with
    /// the shape's world scale.
    pub fn from_shape(shape: &NormalizedShape, perimeter: f64, depth: f64) -> Self {
        let world_scale = shape.world_scale();
        Self {
            width: shape.world_width(),
            height: shape.world_height(),
            perimeter: perimeter * world_scale,
            depth: depth.abs() * world_scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureTiling {
    pub face: Repeat,
    pub side: Repeat,
    pub physical: PhysicalDimensions,
}

fn repeats(extent: f64, tile: f64) -> f64 {
    let count = extent / tile.max(EPS);
    if count.is_finite() { count.max(1.0) } else { 1.0 }
}

pub fn compute_tiling(physical: PhysicalDimensions, options: &TilingOptions) -> TextureTiling {
    let (face, side) = if options.auto_repeat {
        let side_tile = options.side_tile_size.unwrap_or(options.tile_size);
        (
            Repeat::new(
                repeats(physical.width, options.tile_size),
                repeats(physical.height, options.tile_size),
            ),
            Repeat::new(
                repeats(physical.perimeter, side_tile),
                repeats(physical.depth, side_tile),
            ),
        )
    } else {
        (options.face_repeat, options.side_repeat)
    };
    debug!(?face, ?side, auto = options.auto_repeat, "tiling computed");
    TextureTiling {
        face,
        side,
        physical,
    }
}
