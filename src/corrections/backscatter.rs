//! Backscatter factor as a function of beam quality and field size.
//!
//! For each of five tabulated square field sides the factor is a polynomial,
//! quadratic in both kVp and HVL. Between (and beyond) the tabulated sides it
//! is interpolated with a not-a-knot cubic spline in the side length, which
//! for a rectangular field is taken to be the square root of its area.

use units::{cm_, mm_, Area, Length, todo::{Kvpf32, Ratiof32}};

use crate::error::CorrectionError;

use super::require_hits;
use super::spline::CubicSpline;

/// Square field sides (cm) at which the backscatter factor is tabulated
pub const FIELD_SIDES: [f32; 5] = [5.0, 10.0, 20.0, 25.0, 35.0];

/// Coefficients `c0..c8` (rows) for each field side (columns). The factor is
///
///   (c0 + c1 kVp + c2 kVp²) + (c3 + c4 kVp + c5 kVp²) HVL + (c6 + c7 kVp + c8 kVp²) HVL²
///
/// with HVL in mm Al.
const COEFFICIENTS: [[f32; 5]; 9] = [
    [ 1.00870e+0,  9.29969e-1,  8.65442e-1,  8.58665e-1,  8.57065e-1],
    [ 2.35816e-3,  4.08549e-3,  5.36739e-3,  5.51579e-3,  5.55933e-3],
    [-9.48937e-6, -1.66271e-5, -2.21494e-5, -2.27532e-5, -2.28004e-5],
    [ 1.03143e-1,  1.53605e-1,  1.72418e-1,  1.70826e-1,  1.66418e-1],
    [-1.04881e-3, -1.45187e-3, -1.46088e-3, -1.38540e-3, -1.28180e-3],
    [ 3.59731e-6,  5.05312e-6,  5.17430e-6,  4.91192e-6,  4.53036e-6],
    [-7.31303e-3, -9.32427e-3, -8.30138e-3, -7.64330e-3, -6.81574e-3],
    [ 7.93272e-5,  9.40568e-5,  7.13576e-5,  6.13126e-5,  4.94197e-5],
    [-2.74296e-7, -3.28449e-7, -2.54885e-7, -2.21399e-7, -1.79074e-7],
];

/// Backscatter factors at the tabulated field sides
pub fn tabulated(kvp: Kvpf32, hvl: Length) -> [Ratiof32; 5] {
    let (k, h) = (kvp, mm_(hvl));
    let mut factors = [0.0; 5];
    for (side, factor) in factors.iter_mut().enumerate() {
        let c = |row: usize| COEFFICIENTS[row][side];
        *factor =
            (c(0) + c(1) * k + c(2) * k * k)         +
            (c(3) + c(4) * k + c(5) * k * k) * h     +
            (c(6) + c(7) * k + c(8) * k * k) * h * h;
    }
    factors
}

/// Backscatter factor as a continuous function of field side, for one beam
/// quality. The curve depends only on kVp and HVL, so it can be reused for
/// consecutive events sharing them.
#[derive(Clone, Debug, PartialEq)]
pub struct BackscatterCurve {
    kvp: Kvpf32,
    hvl: Length,
    spline: CubicSpline,
}

impl BackscatterCurve {

    /// `None` only if the interpolant cannot be fitted
    pub fn new(kvp: Kvpf32, hvl: Length) -> Option<Self> {
        let spline = CubicSpline::not_a_knot(&FIELD_SIDES, &tabulated(kvp, hvl))?;
        Some(Self { kvp, hvl, spline })
    }

    /// Was this curve built for the given beam quality?
    pub fn matches(&self, kvp: Kvpf32, hvl: Length) -> bool {
        self.kvp == kvp && self.hvl == hvl
    }

    pub fn at_field_side(&self, side: Length) -> Ratiof32 {
        self.spline.at(cm_(side))
    }

    /// One factor per hit cell, from the field area projected onto that cell
    pub fn correction(&self, field_areas: &[Area]) -> Result<Vec<Ratiof32>, CorrectionError> {
        Ok(require_hits(field_areas)?
           .iter()
           .map(|&area| self.at_field_side(area.sqrt()))
           .collect())
    }
}
