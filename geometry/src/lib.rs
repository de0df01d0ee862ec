mod point;
mod vector;
mod rotation;
mod triangle;

pub use point::Point;
pub use vector::{Vector, RatioVec, Dot};
pub use rotation::Rotation;
pub use triangle::Triangle;
