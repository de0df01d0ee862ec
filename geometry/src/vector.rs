use std::ops::{Add, Index, Mul, Neg, Sub};
use units::{cm, cm_, ratio, ratio_, Area, Length, Ratio};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

/// Dimensionless vector: directions, unit vectors and surface normals
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatioVec {
    pub x: Ratio,
    pub y: Ratio,
    pub z: Ratio,
}

pub trait Dot<Rhs = Self> {
    type Output;
    fn dot(self, other: Rhs) -> Self::Output;
}

impl Vector {

    pub fn new(x: Length, y: Length, z: Length) -> Self { Self { x, y, z } }

    pub fn cm(x: f32, y: f32, z: f32) -> Self { Self::new(cm(x), cm(y), cm(z)) }

    pub fn zero() -> Self { Self::cm(0.0, 0.0, 0.0) }

    pub fn magnitude(&self) -> Length {
        let &Self { x, y, z } = self;
        (x*x + y*y + z*z).sqrt()
    }

    /// Unit vector pointing in the same direction. The zero vector has no
    /// direction: its components come out as NaN.
    pub fn normalize(self) -> RatioVec {
        let m = self.magnitude();
        RatioVec { x: self.x / m, y: self.y / m, z: self.z / m }
    }

    pub fn as_cm(&self) -> [f32; 3] { [cm_(self.x), cm_(self.y), cm_(self.z)] }
}

impl RatioVec {

    pub fn new(x: f32, y: f32, z: f32) -> Self { Self { x: ratio(x), y: ratio(y), z: ratio(z) } }

    pub fn norm(&self) -> Ratio {
        let &Self { x, y, z } = self;
        ratio((ratio_(x*x + y*y + z*z)).sqrt())
    }

    pub fn normalize(self) -> Self {
        let n = self.norm();
        Self { x: self.x / n, y: self.y / n, z: self.z / n }
    }

    pub fn cross(self, other: Self) -> Self {
        let [ax, ay, az] = self .as_f32();
        let [bx, by, bz] = other.as_f32();
        Self::new(ay*bz - az*by,
                  az*bx - ax*bz,
                  ax*by - ay*bx)
    }

    pub fn as_f32(&self) -> [f32; 3] { [ratio_(self.x), ratio_(self.y), ratio_(self.z)] }
}

// ----- Arithmetic ----------------------------------------------------------------------
impl Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Vector { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output { self + -rhs }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self::Output { Vector { x: -self.x, y: -self.y, z: -self.z } }
}

impl Neg for RatioVec {
    type Output = Self;
    fn neg(self) -> Self::Output { RatioVec { x: -self.x, y: -self.y, z: -self.z } }
}

impl Mul<f32> for Vector {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self::Output {
        Vector {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

/// Stretch a direction to a given length
impl Mul<Length> for RatioVec {
    type Output = Vector;
    fn mul(self, rhs: Length) -> Self::Output {
        Vector {
            x: rhs * ratio_(self.x),
            y: rhs * ratio_(self.y),
            z: rhs * ratio_(self.z),
        }
    }
}

// ----- Dot products --------------------------------------------------------------------
impl Dot for Vector {
    type Output = Area;
    fn dot(self, other: Self) -> Area {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl Dot<RatioVec> for Vector {
    type Output = Length;
    fn dot(self, other: RatioVec) -> Length {
        self.x * ratio_(other.x) + self.y * ratio_(other.y) + self.z * ratio_(other.z)
    }
}

impl Dot<Vector> for RatioVec {
    type Output = Length;
    fn dot(self, other: Vector) -> Length { other.dot(self) }
}

impl Dot for RatioVec {
    type Output = Ratio;
    fn dot(self, other: Self) -> Ratio {
        let [ax, ay, az] = self .as_f32();
        let [bx, by, bz] = other.as_f32();
        ratio(ax*bx + ay*by + az*bz)
    }
}

impl Index<usize> for Vector {
    type Output = Length;
    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("index {index} is out of bounds [0,2]")
        }
    }
}
