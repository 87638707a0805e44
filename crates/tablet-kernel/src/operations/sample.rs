//! Outline resizing and dense perimeter sampling.
//!
//! The sampled outline is the reference loop for side-wall texture
//! coordinates: any point near the wall is projected onto it and reported as
//! a fraction of the total perimeter.

use tracing::{debug, instrument, warn};

use super::normalize::{NormalizedShape, Resize};
use super::{Diagnostics, Fallback};
use crate::geometry::point::{Point2d, segment_projection};
use crate::outline::Outline;
use crate::{EPS, Tolerance};

pub const DEFAULT_SAMPLE_COUNT: usize = 4096;
/// Fewer samples than this cannot describe a closed loop usefully.
pub const MIN_SAMPLE_COUNT: usize = 8;

/// The outline after the preserve-top plan has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizedOutline {
    pub outline: Outline,
    /// X range of the band solid below the natural bottom, when extending.
    pub band: Option<(f64, f64)>,
}

/// Apply the resize plan to the outline.
///
/// Extension splices two new base vertices under the corners nearest the
/// raw-frame bottom-left and bottom-right of the bounds. When those corners
/// cannot be matched the original outline is kept for sampling and the band
/// spans the full width.
#[instrument(skip_all, fields(resize = ?shape.resize))]
pub fn resize_outline(
    outline: &Outline,
    shape: &NormalizedShape,
    corner_tolerance: f64,
    diagnostics: &mut Diagnostics,
) -> ResizedOutline {
    match shape.resize {
        Resize::Unchanged => ResizedOutline {
            outline: outline.clone(),
            band: None,
        },
        Resize::Clip => ResizedOutline {
            outline: outline.clamped_below(shape.bottom_target),
            band: None,
        },
        Resize::Extend { .. } => match splice_base(outline, shape, corner_tolerance) {
            Some((extended, band)) => ResizedOutline {
                outline: extended,
                band: Some(band),
            },
            None => {
                warn!("preserve-top corners not matched, sampling original outline");
                diagnostics.push(Fallback::ExtensionAmbiguous);
                ResizedOutline {
                    outline: outline.clone(),
                    band: Some((shape.bounds.min_x, shape.bounds.max_x)),
                }
            }
        },
    }
}

fn nearest_within(points: &[Point2d], target: Point2d, radius: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_squared_to(&target);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.filter(|(_, d)| d.sqrt() <= radius).map(|(i, _)| i)
}

/// Arc length walking forward from `from` to `to`.
fn forward_length(points: &[Point2d], from: usize, to: usize) -> f64 {
    let n = points.len();
    let mut len = 0.0;
    let mut i = from;
    while i != to {
        let next = (i + 1) % n;
        len += points[i].distance_to(&points[next]);
        i = next;
    }
    len
}

/// Indices walking forward from `from` to `to`, both inclusive.
fn forward_walk(n: usize, from: usize, to: usize) -> impl Iterator<Item = usize> {
    let count = (to + n - from) % n + 1;
    (0..count).map(move |k| (from + k) % n)
}

fn splice_base(
    outline: &Outline,
    shape: &NormalizedShape,
    corner_tolerance: f64,
) -> Option<(Outline, (f64, f64))> {
    let pts = outline.points();
    let n = pts.len();
    if n < 3 {
        return None;
    }
    let b = shape.bounds;
    let tol = Tolerance {
        corner_fraction: corner_tolerance,
        ..Tolerance::default()
    };
    let radius = tol.corner_radius(b.dx, b.dy);
    let left = nearest_within(pts, Point2d::new(b.min_x, b.max_y), radius)?;
    let right = nearest_within(pts, Point2d::new(b.max_x, b.max_y), radius)?;
    if left == right {
        return None;
    }

    let bottom = shape.bottom_target;
    let (xl, xr) = (pts[left].x, pts[right].x);
    let left_to_right = forward_length(pts, left, right);
    let right_to_left = forward_length(pts, right, left);

    // The shorter path between the corners is the old base; drop it and keep
    // the long way round in its original direction.
    let mut spliced: Vec<Point2d> = Vec::with_capacity(n + 2);
    if left_to_right <= right_to_left {
        spliced.extend(forward_walk(n, right, left).map(|i| pts[i]));
        spliced.push(Point2d::new(xl, bottom));
        spliced.push(Point2d::new(xr, bottom));
    } else {
        spliced.extend(forward_walk(n, left, right).map(|i| pts[i]));
        spliced.push(Point2d::new(xr, bottom));
        spliced.push(Point2d::new(xl, bottom));
    }

    debug!(left, right, vertices = spliced.len(), "spliced extended base");
    Some((Outline::new(spliced), (xl.min(xr), xl.max(xr))))
}

/// Result of projecting a point onto the sampled perimeter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerimeterHit {
    /// Fraction of the total perimeter in `[0, 1)`.
    pub fraction: f64,
    /// The chosen segment had zero length; `fraction` is its start.
    pub zero_length: bool,
}

/// Evenly spaced closed polyline with a cumulative-length table.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledOutline {
    points: Vec<Point2d>,
    cumulative: Vec<f64>,
    total_length: f64,
}

impl SampledOutline {
    /// Resample `outline` at `count` fixed arc-length intervals.
    pub fn resample(outline: &Outline, count: usize) -> Self {
        let src = outline.points();
        let perimeter = outline.perimeter();
        if src.len() < 2 || perimeter < EPS {
            let p = src.first().copied().unwrap_or(Point2d::ORIGIN);
            return Self {
                points: vec![p],
                cumulative: vec![0.0],
                total_length: 0.0,
            };
        }

        let count = count.max(MIN_SAMPLE_COUNT);
        let step = perimeter / count as f64;
        let n = src.len();
        let mut points = Vec::with_capacity(count);
        let mut edge = 0usize;
        let mut edge_start = 0.0;
        let mut edge_len = src[0].distance_to(&src[1 % n]);
        for k in 0..count {
            let d = k as f64 * step;
            while edge + 1 < n && edge_start + edge_len < d {
                edge_start += edge_len;
                edge += 1;
                edge_len = src[edge].distance_to(&src[(edge + 1) % n]);
            }
            let t = if edge_len > 0.0 {
                ((d - edge_start) / edge_len).clamp(0.0, 1.0)
            } else {
                0.0
            };
            points.push(src[edge].lerp(&src[(edge + 1) % n], t));
        }

        let mut cumulative = Vec::with_capacity(count);
        let mut acc = 0.0;
        cumulative.push(0.0);
        for k in 1..count {
            acc += points[k - 1].distance_to(&points[k]);
            cumulative.push(acc);
        }
        let total_length = acc + points[count - 1].distance_to(&points[0]);

        Self {
            points,
            cumulative,
            total_length,
        }
    }

    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the segment leaving sample `i` (the last one closes the loop).
    fn segment_length(&self, i: usize) -> f64 {
        let n = self.points.len();
        if i + 1 < n {
            self.cumulative[i + 1] - self.cumulative[i]
        } else {
            self.total_length - self.cumulative[i]
        }
    }

    fn nearest_sample(&self, p: &Point2d) -> usize {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (i, s) in self.points.iter().enumerate() {
            let d = s.distance_squared_to(p);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    /// Fractional perimeter position of `p` via nearest-segment projection.
    pub fn projected_perimeter(&self, p: &Point2d) -> PerimeterHit {
        let n = self.points.len();
        if n < 2 || self.total_length < EPS {
            return PerimeterHit {
                fraction: 0.0,
                zero_length: true,
            };
        }

        let i = self.nearest_sample(p);
        let prev = (i + n - 1) % n;
        let next = (i + 1) % n;
        let (d_in, t_in) = segment_projection(p, &self.points[prev], &self.points[i]);
        let (d_out, t_out) = segment_projection(p, &self.points[i], &self.points[next]);
        let (start, t) = if d_in < d_out { (prev, t_in) } else { (i, t_out) };

        let seg_len = self.segment_length(start);
        let zero_length = Tolerance::default().is_zero_length(seg_len);
        let offset = if zero_length { 0.0 } else { t * seg_len };
        let mut fraction = (self.cumulative[start] + offset) / self.total_length;
        if fraction >= 1.0 {
            fraction -= 1.0;
        }
        PerimeterHit {
            fraction: fraction.clamp(0.0, 1.0 - f64::EPSILON),
            zero_length,
        }
    }

    /// Fraction of the perimeter at which sample `i` sits.
    pub fn fraction_at(&self, i: usize) -> f64 {
        if self.total_length < EPS {
            return 0.0;
        }
        self.cumulative[i] / self.total_length
    }
}

/// Resize and resample in one step.
pub fn sample_outline(
    outline: &Outline,
    shape: &NormalizedShape,
    corner_tolerance: f64,
    sample_count: usize,
    diagnostics: &mut Diagnostics,
) -> (ResizedOutline, SampledOutline) {
    let resized = resize_outline(outline, shape, corner_tolerance, diagnostics);
    let sampled = SampledOutline::resample(&resized.outline, sample_count);
    debug!(
        samples = sampled.len(),
        perimeter = sampled.total_length(),
        "outline sampled"
    );
    (resized, sampled)
}
