use units::Length;

use crate::error::{Correction, LookupMiss};
use crate::event::Event;
use crate::store::{BeamQuality, LookupStore};

/// The event's half value layer: as recorded in the event, if present,
/// otherwise from the device's HVL table
pub fn half_value_layer(store: &dyn LookupStore, index: usize, event: &Event) -> Result<Length, LookupMiss> {
    if let Some(hvl) = event.hvl { return Ok(hvl) }
    let key = BeamQuality::of(event);
    store.hvl(&key).ok_or_else(|| LookupMiss {
        event: index,
        correction: Correction::HalfValueLayer,
        query: key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use units::mm;
    use crate::event::tests::reference_event;
    use crate::store::{tests::tables, CorrectionTables};

    #[test]
    fn looked_up_when_not_recorded() {
        assert_eq!(half_value_layer(&tables(), 0, &reference_event()), Ok(mm(7.88)));
    }

    #[test]
    fn recorded_value_takes_precedence() {
        let mut event = reference_event();
        event.hvl = Some(mm(3.2));
        assert_eq!(half_value_layer(&CorrectionTables::default(), 0, &event), Ok(mm(3.2)));
    }

    #[test]
    fn miss_names_event_and_query() {
        let miss = half_value_layer(&CorrectionTables::default(), 7, &reference_event()).unwrap_err();
        assert_eq!(miss.event, 7);
        assert_eq!(miss.correction, Correction::HalfValueLayer);
        assert!(miss.query.contains("AXIOMArtis"), "{}", miss.query);
        assert!(miss.query.contains("80 kV"), "{}", miss.query);
    }
}
