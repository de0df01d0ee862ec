use units::{cm_, mm_, Area, Length, todo::{Kvpf32, Ratiof32}};

use crate::error::{Correction, CorrectionError, LookupMiss};
use crate::store::{nearest_value, LookupStore, MediumRow};

use super::require_hits;

/// Air-to-water medium correction for one event.
///
/// The table is narrowed in three stages: to the tabulated field size
/// nearest the mean side of the hit cells' fields, then to the nearest
/// tabulated kVp, and finally the nearest HVL. At each stage the lower of two
/// equally close values is taken. `Ok(Err(miss))` when the table is empty.
pub fn medium_correction(
    store: &dyn LookupStore,
    index: usize,
    kvp: Kvpf32,
    hvl: Length,
    field_areas: &[Area],
) -> Result<Result<Ratiof32, LookupMiss>, CorrectionError> {
    let areas = require_hits(field_areas)?;
    let mean_side = areas.iter().map(|&a| cm_(a.sqrt())).sum::<f32>() / areas.len() as f32;
    let hvl = mm_(hvl);

    let rows = narrow(store.medium().iter().collect(), |r| r.field_size, mean_side);
    let rows = narrow(rows, |r| r.kvp, kvp);
    let rows = narrow(rows, |r| r.hvl, hvl);

    Ok(rows.first()
       .map(|row| row.k_med)
       .ok_or_else(|| LookupMiss {
           event: index,
           correction: Correction::Medium,
           query: format!("field size {mean_side:.1} cm at {kvp} kV with HVL {hvl} mm Al"),
       }))
}

/// Keep only the rows whose `key` is the tabulated value nearest `target`
fn narrow<'r>(rows: Vec<&'r MediumRow>, key: fn(&MediumRow) -> f32, target: f32) -> Vec<&'r MediumRow> {
    let nearest = nearest_value(rows.iter().map(|r| key(r)), target);
    rows.into_iter().filter(|r| Some(key(r)) == nearest).collect()
}
