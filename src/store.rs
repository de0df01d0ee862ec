//! Read-only tables behind the correction factors.
//!
//! The store is opened once, before the first event, and handed to the dose
//! calculation by reference.

use std::fs;
use std::path::Path;

use ordered_float::OrderedFloat;
use serde::Deserialize;

use units::{mm, mm_, Length};

use crate::error::ConfigurationError;
use crate::event::Event;

/// Filtration values closer than this (in mm) are considered equal
const FILTRATION_TOLERANCE: f32 = 1e-4;

/// Composite key identifying the beam quality of an event: device, tube
/// voltage (rounded to the nearest kV), filtration and acquisition plane
#[derive(Debug, Clone, PartialEq)]
pub struct BeamQuality<'e> {
    pub device_model: &'e str,
    pub acquisition_plane: &'e str,
    pub kvp: f32,
    pub filter_cu: Length,
    pub filter_al: Length,
}

impl<'e> BeamQuality<'e> {
    pub fn of(event: &'e Event) -> Self {
        Self {
            device_model: &event.device_model,
            acquisition_plane: &event.acquisition_plane,
            kvp: event.kvp.round(),
            filter_cu: event.filter_cu,
            filter_al: event.filter_al,
        }
    }
}

impl std::fmt::Display for BeamQuality<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) at {} kV with {} mm Cu, {} mm Al",
               self.device_model, self.acquisition_plane, self.kvp,
               mm_(self.filter_cu), mm_(self.filter_al))
    }
}

/// Lookups needed by the correction factors
pub trait LookupStore {
    /// Half value layer for a beam quality (exact match)
    fn hvl(&self, key: &BeamQuality) -> Option<Length>;

    /// Patient support transmission for a beam quality (exact match)
    fn table_transmission(&self, key: &BeamQuality) -> Option<f32>;

    /// The whole medium correction table, for nearest-value searches
    fn medium(&self) -> &[MediumRow];
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HvlRow {
    pub model: String,
    pub acquisition_plane: String,
    pub kvp: f32,
    /// mm
    pub filter_cu: f32,
    /// mm
    pub filter_al: f32,
    /// mm Al
    pub hvl: f32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TransmissionRow {
    pub model: String,
    pub acquisition_plane: String,
    pub kvp: f32,
    pub filter_cu: f32,
    pub filter_al: f32,
    pub k_tab: f32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MediumRow {
    /// Side of the square field, cm
    pub field_size: f32,
    pub kvp: f32,
    /// mm Al
    pub hvl: f32,
    /// Ratio of mass energy absorption coefficients, water to air
    pub k_med: f32,
}

/// All lookup tables, held in memory
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CorrectionTables {
    #[serde(default)]
    pub hvl: Vec<HvlRow>,
    #[serde(default)]
    pub table_transmission: Vec<TransmissionRow>,
    #[serde(default)]
    pub medium: Vec<MediumRow>,
}

impl CorrectionTables {
    pub fn read(path: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigurationError::Io { path: path.into(), source })?;
        toml::from_str(&text)
            .map_err(|source| ConfigurationError::Toml { path: path.into(), source })
    }
}

impl LookupStore for CorrectionTables {
    fn hvl(&self, key: &BeamQuality) -> Option<Length> {
        // HVL tables are tabulated for whole millimetres of aluminium
        let al = mm(mm_(key.filter_al).round());
        self.hvl.iter()
            .find(|row| matches(key, &row.model, &row.acquisition_plane, row.kvp, row.filter_cu, row.filter_al, al))
            .map(|row| mm(row.hvl))
    }

    fn table_transmission(&self, key: &BeamQuality) -> Option<f32> {
        self.table_transmission.iter()
            .find(|row| matches(key, &row.model, &row.acquisition_plane, row.kvp, row.filter_cu, row.filter_al, key.filter_al))
            .map(|row| row.k_tab)
    }

    fn medium(&self) -> &[MediumRow] { &self.medium }
}

fn matches(key: &BeamQuality, model: &str, plane: &str, kvp: f32, cu: f32, al: f32, key_al: Length) -> bool {
    same_device(key.device_model, model) &&
    key.acquisition_plane.eq_ignore_ascii_case(plane) &&
    key.kvp == kvp &&
    (mm_(key.filter_cu) - cu).abs() < FILTRATION_TOLERANCE &&
    (mm_(key_al) - al).abs() < FILTRATION_TOLERANCE
}

/// Device model names are compared ignoring case and hyphens:
/// `AXIOM-Artis` is `AXIOMArtis`
fn same_device(a: &str, b: &str) -> bool {
    let normal = |s: &str| s.chars().filter(|&c| c != '-').flat_map(char::to_lowercase).collect::<String>();
    normal(a) == normal(b)
}

/// The tabulated value closest to `target`. Of two equally close values, the
/// lower one wins.
pub fn nearest_value(values: impl IntoIterator<Item = f32>, target: f32) -> Option<f32> {
    values.into_iter()
        .filter(|v| v.is_finite())
        .min_by_key(|&v| (OrderedFloat((v - target).abs()), OrderedFloat(v)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;
    use crate::event::tests::reference_event;

    pub(crate) const TABLES: &str = r#"
        [[hvl]]
        model = "AXIOMArtis"
        acquisition_plane = "Single Plane"
        kvp = 80.0
        filter_cu = 0.3
        filter_al = 0.0
        hvl = 7.88

        [[table_transmission]]
        model = "AXIOMArtis"
        acquisition_plane = "Single Plane"
        kvp = 80.0
        filter_cu = 0.3
        filter_al = 0.0
        k_tab = 0.7319

        [[medium]]
        field_size = 10.0
        kvp = 80.0
        hvl = 4.0
        k_med = 1.027

        [[medium]]
        field_size = 10.0
        kvp = 80.0
        hvl = 5.0
        k_med = 1.026

        [[medium]]
        field_size = 10.0
        kvp = 80.0
        hvl = 6.0
        k_med = 1.025

        [[medium]]
        field_size = 20.0
        kvp = 80.0
        hvl = 5.0
        k_med = 1.021

        [[medium]]
        field_size = 10.0
        kvp = 100.0
        hvl = 5.0
        k_med = 1.019
    "#;

    pub(crate) fn tables() -> CorrectionTables { toml::from_str(TABLES).unwrap() }

    #[test]
    fn exact_match_lookups() {
        let event = reference_event();
        let key = BeamQuality::of(&event);
        assert_eq!(tables().table_transmission(&key), Some(0.7319));
        assert_eq!(tables().hvl(&key), Some(mm(7.88)));
    }

    #[rstest(/**/ model        , kvp , cu ,  expected,
             case("AXIOM-Artis", 80.4, 0.3, Some(0.7319)),
             case("axiomartis" , 79.6, 0.3, Some(0.7319)),
             case("AXIOMArtis" , 81.0, 0.3, None        ),
             case("AXIOMArtis" , 80.0, 0.6, None        ),
             case("Allura"     , 80.0, 0.3, None        ),
    )]
    fn table_transmission_key(model: &str, kvp: f32, cu: f32, expected: Option<f32>) {
        let mut event = reference_event();
        event.device_model = model.into();
        event.kvp = kvp;
        event.filter_cu = mm(cu);
        assert_eq!(tables().table_transmission(&BeamQuality::of(&event)), expected);
    }

    #[test]
    fn hvl_rounds_aluminium() {
        let mut event = reference_event();
        event.filter_al = mm(0.4);
        assert_eq!(tables().hvl(&BeamQuality::of(&event)), Some(mm(7.88)));
        event.filter_al = mm(0.6);
        assert_eq!(tables().hvl(&BeamQuality::of(&event)), None);
    }

    #[rstest(/**/ values                    , target, expected,
             case(vec![5.0, 10.0, 20.0]     ,   12.0, Some(10.0)),
             case(vec![5.0, 10.0, 20.0]     ,   15.0, Some(10.0)), // tie: lower wins
             case(vec![20.0, 10.0, 5.0]     ,   15.0, Some(10.0)), // regardless of order
             case(vec![5.0, 10.0, 20.0]     ,  100.0, Some(20.0)),
             case(vec![]                    ,    1.0, None      ),
    )]
    fn nearest(values: Vec<f32>, target: f32, expected: Option<f32>) {
        assert_eq!(nearest_value(values, target), expected);
    }

    #[test]
    fn reject_unknown_table() {
        assert!(toml::from_str::<CorrectionTables>("[[nonsense]]\nx = 1").is_err());
    }
}
