//! Shape normalization: bounds, width scale, and the preserve-top resize plan.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::extrude::BevelOptions;
use super::{Diagnostics, Fallback};
use crate::outline::{Outline, ShapeBounds};
use crate::Tolerance;

/// Requested physical size of the tablet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetDimensions {
    /// Final world width; `None` keeps the natural width times `scale`.
    pub target_width: Option<f64>,
    /// Final world height; only honored when `preserve_top` is set.
    pub target_height: Option<f64>,
    pub preserve_top: bool,
    /// Extrusion depth in outline units.
    pub depth: f64,
    pub bevel: bool,
    pub bevel_options: BevelOptions,
    /// Outline units to world units (0.01 => 100 units = 1 m).
    pub scale: f64,
    /// Corner-matching radius for the preserve-top splice, as a fraction of
    /// the larger shape extent.
    pub corner_tolerance: f64,
}

impl Default for TargetDimensions {
    fn default() -> Self {
        Self {
            target_width: None,
            target_height: None,
            preserve_top: true,
            depth: 100.0,
            bevel: false,
            bevel_options: BevelOptions::default(),
            scale: 0.01,
            corner_tolerance: Tolerance::default().corner_fraction,
        }
    }
}

/// How the lower part of the outline is resized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resize {
    Unchanged,
    /// Grow downward by `gap` outline units below the natural bottom.
    Extend { gap: f64 },
    /// Flatten everything below the bottom target onto it.
    Clip,
}

/// Output of the normalizer, shared by every later stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedShape {
    pub bounds: ShapeBounds,
    /// `|scale|`, floored at the epsilon.
    pub abs_scale: f64,
    /// Extra uniform factor so the world width matches the request.
    pub core_scale: f64,
    /// Final height in outline units.
    pub target_height: f64,
    /// Outline-space Y of the tablet base after resizing.
    pub bottom_target: f64,
    pub resize: Resize,
}

impl NormalizedShape {
    /// Outline units to world units.
    pub fn world_scale(&self) -> f64 {
        self.abs_scale * self.core_scale
    }

    pub fn units_per_meter(&self) -> f64 {
        1.0 / self.world_scale()
    }

    pub fn world_width(&self) -> f64 {
        self.bounds.dx * self.world_scale()
    }

    pub fn world_height(&self) -> f64 {
        self.target_height * self.world_scale()
    }
}

#[instrument(skip(outline, dims, diagnostics), fields(points = outline.len()))]
pub fn normalize_shape(
    outline: &Outline,
    dims: &TargetDimensions,
    diagnostics: &mut Diagnostics,
) -> NormalizedShape {
    let tol = Tolerance::default();
    let bounds = outline.bounds();
    let mut degenerate = bounds.is_degenerate();

    let abs_scale = tol.floor(dims.scale.abs());
    let natural_width = bounds.dx * abs_scale;
    let target_width = dims
        .target_width
        .filter(|w| w.is_finite())
        .unwrap_or(natural_width);

    let mut core_scale = target_width / natural_width;
    if !(core_scale >= tol.min_core_scale) {
        core_scale = tol.min_core_scale;
        degenerate = true;
    }
    let world_scale = abs_scale * core_scale;

    let target_height = match dims.target_height {
        Some(h) if dims.preserve_top && h.is_finite() && h > 0.0 => tol.floor(h / world_scale),
        _ => bounds.dy,
    };

    let diff = target_height - bounds.dy;
    let resize = if diff.abs() <= tol.epsilon.max(bounds.dy * 1e-9) {
        Resize::Unchanged
    } else if diff > 0.0 {
        Resize::Extend { gap: diff }
    } else {
        Resize::Clip
    };

    let bottom_target = match resize {
        Resize::Unchanged => bounds.max_y,
        _ => bounds.min_y + target_height,
    };

    if degenerate {
        warn!(
            width = bounds.max_x - bounds.min_x,
            height = bounds.max_y - bounds.min_y,
            core_scale,
            "degenerate outline, extents floored"
        );
        diagnostics.push(Fallback::DegenerateShape {
            width: bounds.max_x - bounds.min_x,
            height: bounds.max_y - bounds.min_y,
        });
    }

    debug!(core_scale, target_height, bottom_target, ?resize, "shape normalized");

    NormalizedShape {
        bounds,
        abs_scale,
        core_scale,
        target_height: if matches!(resize, Resize::Unchanged) {
            bounds.dy
        } else {
            target_height
        },
        bottom_target,
        resize,
    }
}
