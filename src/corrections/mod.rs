//! Multiplicative factors turning the reference-point air kerma into skin
//! dose at each hit cell.
//!
//! Every factor is a pure function of the event and, for the per-cell ones,
//! of the positions of the hit cells relative to the source. None of them
//! depends on any other, so the order in which they are multiplied is
//! immaterial.

pub mod backscatter;
pub mod hvl;
pub mod isq;
pub mod medium;
pub mod spline;
pub mod table;

pub use backscatter::BackscatterCurve;
pub use hvl::half_value_layer;
pub use isq::inverse_square;
pub use medium::medium_correction;
pub use table::table_correction;

use crate::error::CorrectionError;

/// Refuse to compute a correction for no cells at all
pub(crate) fn require_hits<T>(cells: &[T]) -> Result<&[T], CorrectionError> {
    if cells.is_empty() { Err(CorrectionError::EmptyHitSet) }
    else                { Ok(cells) }
}
