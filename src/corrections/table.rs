use units::todo::Ratiof32;

use crate::config::TableCorrection;
use crate::error::{Correction, LookupMiss};
use crate::event::Event;
use crate::store::{BeamQuality, LookupStore};

/// Transmission through the table and pad, applied to the cells whose rays
/// pass through the table: either the user's estimate, or the value measured
/// for the event's device, tube voltage, filtration and acquisition plane.
pub fn table_correction(
    store: &dyn LookupStore,
    index: usize,
    event: &Event,
    mode: TableCorrection,
) -> Result<Ratiof32, LookupMiss> {
    match mode {
        TableCorrection::Estimate(k_tab) => Ok(k_tab),
        TableCorrection::Measured => {
            let key = BeamQuality::of(event);
            store.table_transmission(&key).ok_or_else(|| LookupMiss {
                event: index,
                correction: Correction::Table,
                query: key.to_string(),
            })
        }
    }
}
