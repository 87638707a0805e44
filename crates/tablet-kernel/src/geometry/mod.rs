pub mod bounds;
pub mod point;
pub mod vector;

pub use bounds::BoundingBox;
pub use point::{Point2d, Point3d};
pub use vector::Vec3;
