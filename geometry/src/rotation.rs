//! Rigid rotations about the origin.
//!
//! All rotations act on column vectors: `a * b * p` applies `b` first.

use std::ops::Mul;

use nalgebra::{Matrix3, Vector3};
use units::{cm, radian_, ratio, Angle};

use crate::{Point, RatioVec, Vector};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation(Matrix3<f32>);

impl Rotation {

    pub fn identity() -> Self { Self(Matrix3::identity()) }

    pub fn about_x(angle: Angle) -> Self {
        let (s, c) = radian_(angle).sin_cos();
        Self(Matrix3::new(1.0, 0.0, 0.0,
                          0.0,   c,  -s,
                          0.0,   s,   c))
    }

    pub fn about_y(angle: Angle) -> Self {
        let (s, c) = radian_(angle).sin_cos();
        Self(Matrix3::new(  c, 0.0,   s,
                          0.0, 1.0, 0.0,
                           -s, 0.0,   c))
    }

    pub fn about_z(angle: Angle) -> Self {
        let (s, c) = radian_(angle).sin_cos();
        Self(Matrix3::new(  c,  -s, 0.0,
                            s,   c, 0.0,
                          0.0, 0.0, 1.0))
    }

    /// `Rx * Ry * Rz`: the z-rotation acts first, the x-rotation last.
    pub fn xyz(x: Angle, y: Angle, z: Angle) -> Self {
        Self::about_x(x) * Self::about_y(y) * Self::about_z(z)
    }

    /// The inverse rotation
    pub fn transpose(&self) -> Self { Self(self.0.transpose()) }

    pub fn matrix(&self) -> &Matrix3<f32> { &self.0 }

    fn apply(&self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        let r = self.0 * Vector3::new(x, y, z);
        [r.x, r.y, r.z]
    }
}

impl Default for Rotation {
    fn default() -> Self { Self::identity() }
}

impl Mul for Rotation {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output { Self(self.0 * rhs.0) }
}

impl Mul<Vector> for Rotation {
    type Output = Vector;
    fn mul(self, rhs: Vector) -> Self::Output {
        let [x, y, z] = self.apply(rhs.as_cm());
        Vector::new(cm(x), cm(y), cm(z))
    }
}

impl Mul<Point> for Rotation {
    type Output = Point;
    fn mul(self, rhs: Point) -> Self::Output {
        Point::origin() + self * rhs.as_vector()
    }
}

impl Mul<RatioVec> for Rotation {
    type Output = RatioVec;
    fn mul(self, rhs: RatioVec) -> Self::Output {
        let [x, y, z] = self.apply(rhs.as_f32());
        RatioVec { x: ratio(x), y: ratio(y), z: ratio(z) }
    }
}
