//! Caller-facing configuration.
//!
//! Every field is optional in the JSON form and falls back to the documented
//! default. Non-finite numbers are replaced rather than rejected so that a
//! half-edited form in the configurator still produces a mesh.

use serde::{Deserialize, Serialize};
use tablet_kernel::operations::sample::{DEFAULT_SAMPLE_COUNT, MIN_SAMPLE_COUNT};
use tablet_kernel::{BevelOptions, Diagnostics, Fallback, TargetDimensions, default_tolerance};
use tracing::warn;

use crate::error::TabletError;
use crate::mesh::{CAP_MATERIAL, SIDE_MATERIAL};
use crate::tiling::{Repeat, TilingOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabletConfig {
    /// Extrusion depth in outline units.
    pub depth: f64,
    /// Outline units to world units.
    pub scale: f64,
    pub face_texture: Option<String>,
    /// Falls back to `face_texture`.
    pub side_texture: Option<String>,
    pub auto_repeat: bool,
    /// World units per cap tile.
    pub tile_size: f64,
    pub side_tile_size: Option<f64>,
    pub face_repeat_x: f64,
    pub face_repeat_y: f64,
    pub side_repeat_x: f64,
    pub side_repeat_y: f64,
    /// World units.
    pub target_width: Option<f64>,
    /// World units; only honored with `preserve_top`.
    pub target_height: Option<f64>,
    pub preserve_top: bool,
    pub bevel: bool,
    pub bevel_options: BevelOptions,
    pub double_sided: bool,
    pub show_edges: bool,
    /// Fraction of `max(dx, dy)` within which the base corners must lie for
    /// the preserve-top splice.
    pub corner_tolerance: f64,
    pub sample_count: usize,
}

impl Default for TabletConfig {
    fn default() -> Self {
        Self {
            depth: 100.0,
            scale: 0.01,
            face_texture: None,
            side_texture: None,
            auto_repeat: true,
            tile_size: 0.10,
            side_tile_size: None,
            face_repeat_x: 1.0,
            face_repeat_y: 1.0,
            side_repeat_x: 1.0,
            side_repeat_y: 1.0,
            target_width: None,
            target_height: None,
            preserve_top: true,
            bevel: false,
            bevel_options: BevelOptions::default(),
            double_sided: false,
            show_edges: false,
            corner_tolerance: default_tolerance().corner_fraction,
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

fn sanitize_value(
    name: &'static str,
    value: &mut f64,
    default: f64,
    diagnostics: &mut Diagnostics,
) {
    if !value.is_finite() {
        warn!(parameter = name, value = *value, default, "non-finite parameter replaced");
        *value = default;
        diagnostics.push(Fallback::SanitizedParameter { name });
    }
}

fn sanitize_optional(name: &'static str, value: &mut Option<f64>, diagnostics: &mut Diagnostics) {
    if value.is_some_and(|v| !v.is_finite()) {
        warn!(parameter = name, "non-finite parameter dropped");
        *value = None;
        diagnostics.push(Fallback::SanitizedParameter { name });
    }
}

impl TabletConfig {
    pub fn from_json(json: &str) -> Result<Self, TabletError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace non-finite values with their defaults, recording each one.
    pub fn sanitize(&mut self, diagnostics: &mut Diagnostics) {
        let defaults = Self::default();
        sanitize_value("depth", &mut self.depth, defaults.depth, diagnostics);
        sanitize_value("scale", &mut self.scale, defaults.scale, diagnostics);
        sanitize_value("tileSize", &mut self.tile_size, defaults.tile_size, diagnostics);
        sanitize_value("faceRepeatX", &mut self.face_repeat_x, 1.0, diagnostics);
        sanitize_value("faceRepeatY", &mut self.face_repeat_y, 1.0, diagnostics);
        sanitize_value("sideRepeatX", &mut self.side_repeat_x, 1.0, diagnostics);
        sanitize_value("sideRepeatY", &mut self.side_repeat_y, 1.0, diagnostics);
        sanitize_value(
            "cornerTolerance",
            &mut self.corner_tolerance,
            defaults.corner_tolerance,
            diagnostics,
        );
        let bevel_defaults = BevelOptions::default();
        sanitize_value(
            "bevelOptions.size",
            &mut self.bevel_options.size,
            bevel_defaults.size,
            diagnostics,
        );
        sanitize_value(
            "bevelOptions.thickness",
            &mut self.bevel_options.thickness,
            bevel_defaults.thickness,
            diagnostics,
        );
        sanitize_optional("sideTileSize", &mut self.side_tile_size, diagnostics);
        sanitize_optional("targetWidth", &mut self.target_width, diagnostics);
        sanitize_optional("targetHeight", &mut self.target_height, diagnostics);
        if self.sample_count < MIN_SAMPLE_COUNT {
            warn!(sample_count = self.sample_count, "sample count too small, default used");
            self.sample_count = defaults.sample_count;
            diagnostics.push(Fallback::SanitizedParameter { name: "sampleCount" });
        }
    }

    pub fn to_dimensions(&self) -> TargetDimensions {
        TargetDimensions {
            target_width: self.target_width,
            target_height: self.target_height,
            preserve_top: self.preserve_top,
            depth: self.depth,
            bevel: self.bevel,
            bevel_options: self.bevel_options,
            scale: self.scale,
            corner_tolerance: self.corner_tolerance,
        }
    }

    pub fn to_tiling(&self) -> TilingOptions {
        TilingOptions {
            auto_repeat: self.auto_repeat,
            tile_size: self.tile_size,
            side_tile_size: self.side_tile_size,
            face_repeat: Repeat::new(self.face_repeat_x, self.face_repeat_y),
            side_repeat: Repeat::new(self.side_repeat_x, self.side_repeat_y),
        }
    }

    /// Cap and side material slots, indexed by material id.
    pub fn material_slots(&self) -> [MaterialSlot; 2] {
        let side = if self.double_sided { Side::Double } else { Side::Front };
        [
            MaterialSlot::new(CAP_MATERIAL, self.face_texture.clone(), side),
            MaterialSlot::new(
                SIDE_MATERIAL,
                self.side_texture.clone().or_else(|| self.face_texture.clone()),
                side,
            ),
        ]
    }
}

/// Which faces of a material the renderer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Render hints for one material group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSlot {
    pub material_index: u32,
    pub texture: Option<String>,
    pub side: Side,
    pub roughness: f32,
    pub metalness: f32,
    /// Filled in from the tiling stage.
    pub repeat: Repeat,
}

impl MaterialSlot {
    fn new(material_index: u32, texture: Option<String>, side: Side) -> Self {
        Self {
            material_index,
            texture,
            side,
            roughness: 0.92,
            metalness: 0.03,
            repeat: Repeat::ONCE,
        }
    }
}
