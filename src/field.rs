//! Projection of the detector-plane field onto the skin.
//!
//! The field size recorded for an event is measured in the detector plane,
//! at the source-to-detector distance. At a cell closer to the source the
//! field is proportionally smaller: its area scales with the square of the
//! distance.

use geometry::Point;
use units::{ratio_, Area};

use crate::error::CorrectionError;
use crate::event::EventGeometry;
use crate::corrections::require_hits;

/// Field area at each cell: `field_area * (|cell - source| / dsd)^2`
pub fn field_areas(geometry: &EventGeometry, source: Point, cells: &[Point]) -> Result<Vec<Area>, CorrectionError> {
    let reference = geometry.field_area();
    Ok(require_hits(cells)?
       .iter()
       .map(|&cell| reference * ratio_(source.distance_to(cell) / geometry.source_detector).powi(2))
       .collect())
}
