//! Closed 2D silhouette of a tablet and its bounding extents.

use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::point::Point2d;
use crate::{EPS, Tolerance};

/// Errors raised while taking in an outline from the loader.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutlineError {
    #[error("outline source resolved to no usable polygon")]
    NoPolygon,
}

/// An ordered, closed polygon in source units (Y down, top of the shape at
/// `min_y`). The closing edge from the last point back to the first is
/// implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    points: Vec<Point2d>,
}

impl Outline {
    /// Build an outline, dropping non-finite points, consecutive duplicates
    /// and an explicit closing duplicate.
    pub fn new(points: Vec<Point2d>) -> Self {
        let tol_sq = EPS * EPS;
        let mut cleaned: Vec<Point2d> = Vec::with_capacity(points.len());
        let mut dropped = 0usize;
        for p in points {
            if !p.is_finite() {
                dropped += 1;
                continue;
            }
            if let Some(last) = cleaned.last() {
                if last.distance_squared_to(&p) < tol_sq {
                    continue;
                }
            }
            cleaned.push(p);
        }
        let n = cleaned.len();
        if n >= 2 && cleaned[n - 1].distance_squared_to(&cleaned[0]) < tol_sq {
            cleaned.pop();
        }
        if dropped > 0 {
            warn!(dropped, "dropped non-finite outline points");
        }
        Self { points: cleaned }
    }

    /// Take the first usable polygon from a loader's resolved shape list.
    pub fn from_polygons(polygons: Vec<Vec<Point2d>>) -> Result<Self, OutlineError> {
        polygons
            .into_iter()
            .map(Outline::new)
            .find(|o| !o.is_empty())
            .ok_or(OutlineError::NoPolygon)
    }

    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> ShapeBounds {
        ShapeBounds::of(&self.points)
    }

    /// Shoelace area; positive when the loop is counter-clockwise in the
    /// mathematical (Y up) sense.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// Perimeter length including the closing edge.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| self.points[i].distance_to(&self.points[(i + 1) % n]))
            .sum()
    }

    /// Stable identity of the point sequence, used for rebuild cache keys.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.points.len().hash(&mut hasher);
        for p in &self.points {
            p.x.to_bits().hash(&mut hasher);
            p.y.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Copy of the outline with every `y` clamped to at most `max_y`.
    pub fn clamped_below(&self, max_y: f64) -> Self {
        Self::new(
            self.points
                .iter()
                .map(|p| Point2d::new(p.x, p.y.min(max_y)))
                .collect(),
        )
    }
}

pub fn signed_area(points: &[Point2d]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

/// Extents of an outline. `dx` and `dy` are floored at [`EPS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl ShapeBounds {
    pub fn of(points: &[Point2d]) -> Self {
        let tol = Tolerance::default();
        if points.is_empty() {
            return Self {
                min_x: 0.0,
                max_x: 0.0,
                min_y: 0.0,
                max_y: 0.0,
                dx: tol.epsilon,
                dy: tol.epsilon,
            };
        }
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            dx: tol.floor(max_x - min_x),
            dy: tol.floor(max_y - min_y),
        }
    }

    /// True when either raw extent collapsed onto the epsilon floor.
    pub fn is_degenerate(&self) -> bool {
        self.max_x - self.min_x < EPS || self.max_y - self.min_y < EPS
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Outline {
        Outline::new(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(100.0, 0.0),
            Point2d::new(100.0, 100.0),
            Point2d::new(0.0, 100.0),
        ])
    }

    #[test]
    fn test_bounds_square() {
        let b = square().bounds();
        assert_eq!(b.min_x, 0.0);
        assert_eq!(b.max_y, 100.0);
        assert!((b.dx - 100.0).abs() < 1e-12);
        assert!(!b.is_degenerate());
    }

    #[test]
    fn test_degenerate_bounds_floor() {
        let o = Outline::new(vec![Point2d::new(3.0, 4.0)]);
        let b = o.bounds();
        assert!(b.is_degenerate());
        assert_eq!(b.dx, EPS);
        assert_eq!(b.dy, EPS);
    }

    #[test]
    fn test_closing_duplicate_removed() {
        let o = Outline::new(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 0.0),
            Point2d::new(1.0, 0.0),
            Point2d::new(1.0, 1.0),
            Point2d::new(0.0, 0.0),
        ]);
        assert_eq!(o.len(), 3);
    }

    #[test]
    fn test_non_finite_dropped() {
        let o = Outline::new(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(f64::NAN, 1.0),
            Point2d::new(1.0, 1.0),
        ]);
        assert_eq!(o.len(), 2);
    }

    #[test]
    fn test_perimeter_and_area() {
        let o = square();
        assert!((o.perimeter() - 400.0).abs() < 1e-9);
        assert!((o.signed_area().abs() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_polygons_skips_empty() {
        let o = Outline::from_polygons(vec![vec![], vec![Point2d::new(1.0, 2.0)]]).unwrap();
        assert_eq!(o.len(), 1);
        assert_eq!(
            Outline::from_polygons(vec![]).unwrap_err(),
            OutlineError::NoPolygon
        );
    }

    #[test]
    fn test_fingerprint_changes_with_points() {
        let a = square();
        let b = a.clamped_below(50.0);
        assert_eq!(a.fingerprint(), square().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
