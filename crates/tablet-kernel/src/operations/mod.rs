pub mod extrude;
pub mod normalize;
pub mod sample;

use std::fmt;

/// A condition recovered locally with a safe fallback. None of these stop a
/// build; they only lower fidelity.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    /// Outline extent or width scale collapsed and was floored.
    DegenerateShape { width: f64, height: f64 },
    /// Preserve-top corner matching failed; the unmodified outline was sampled.
    ExtensionAmbiguous,
    /// Perimeter projection hit zero-length segments and returned their start.
    ProjectionFailure { count: usize },
    /// A configuration value was not finite and was replaced by its default.
    SanitizedParameter { name: &'static str },
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateShape { width, height } => {
                write!(f, "degenerate shape {width}x{height}, extents floored")
            }
            Self::ExtensionAmbiguous => {
                write!(f, "preserve-top corners not found, sampled original outline")
            }
            Self::ProjectionFailure { count } => {
                write!(f, "{count} perimeter projections hit zero-length segments")
            }
            Self::SanitizedParameter { name } => {
                write!(f, "{name} was not finite, default used")
            }
        }
    }
}

/// Non-fatal findings collected across one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub fallbacks: Vec<Fallback>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fallback: Fallback) {
        self.fallbacks.push(fallback);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.fallbacks.extend(other.fallbacks);
    }

    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }

    pub fn contains(&self, pred: impl Fn(&Fallback) -> bool) -> bool {
        self.fallbacks.iter().any(pred)
    }
}
