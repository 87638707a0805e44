pub mod geometry;
pub mod operations;
pub mod outline;

// Re-export the pipeline's leaf stages at crate root for convenience.
pub use operations::extrude::{BevelOptions, Solid, SolidSet, build_solids};
pub use operations::normalize::{NormalizedShape, Resize, TargetDimensions, normalize_shape};
pub use operations::sample::{SampledOutline, sample_outline};
pub use operations::{Diagnostics, Fallback};
pub use outline::{Outline, ShapeBounds};

/// Floor applied to extents and divisors so degenerate outlines never divide by zero.
pub const EPS: f64 = 1e-9;

/// Tolerance configuration for the outline pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Extents, scales and lengths below this are treated as zero (outline units).
    pub epsilon: f64,
    /// Smallest allowed width scale factor.
    pub min_core_scale: f64,
    /// Corner-matching radius for the preserve-top splice, as a fraction of
    /// the larger shape extent.
    pub corner_fraction: f64,
    /// Vertical overlap between the core solid and the band solid.
    pub band_overlap: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            epsilon: EPS,
            min_core_scale: 1e-6,
            corner_fraction: 0.02,
            band_overlap: 1e-4,
        }
    }
}

impl Tolerance {
    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.epsilon
    }

    /// Clamp a divisor to the epsilon floor, treating non-finite values as zero.
    pub fn floor(&self, value: f64) -> f64 {
        if value.is_finite() {
            value.max(self.epsilon)
        } else {
            self.epsilon
        }
    }

    /// Corner-matching radius for a shape of the given extents.
    pub fn corner_radius(&self, dx: f64, dy: f64) -> f64 {
        self.corner_fraction * dx.max(dy)
    }
}

pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
