use geometry::Point;
use units::{ratio_, Length, todo::Ratiof32};

use crate::error::CorrectionError;

use super::require_hits;

/// Inverse-square law correction from the reference distance `dref` to each
/// cell's actual distance from the source: `(dref / |cell - source|)^2`
pub fn inverse_square(source: Point, cells: &[Point], dref: Length) -> Result<Vec<Ratiof32>, CorrectionError> {
    Ok(require_hits(cells)?
       .iter()
       .map(|&cell| ratio_(dref / source.distance_to(cell)).powi(2))
       .collect())
}
