//! Per-event summary of a dose calculation, written as TOML

use std::path::Path;

use serde::{Deserialize, Serialize};

use units::cm2_;

use crate::dose::{DoseReport, EventResult};
use crate::error::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub peak_dose: f32,
    pub cells: usize,
    pub fallback: Vec<Fallback>,
    pub event: Vec<EventSummary>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Fallback {
    pub event: usize,
    pub correction: String,
    pub query: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventSummary {
    pub index: usize,
    pub kerma: f32,
    pub geometry_reused: bool,
    pub hit_cells: usize,
    pub table_blocked: usize,
    pub k_med: f32,
    pub k_tab: f32,
    /// Ranges over the hit cells; absent when the beam missed the patient
    pub k_isq: Option<[f32; 2]>,
    pub k_bs: Option<[f32; 2]>,
    pub field_area: Option<[f32; 2]>,
    pub peak_dose: f32,
}

fn range(values: impl Iterator<Item = f32>) -> Option<[f32; 2]> {
    values.fold(None, |acc, v| match acc {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}

impl From<&EventResult> for EventSummary {
    fn from(e: &EventResult) -> Self {
        Self {
            index          : e.index,
            kerma          : e.kerma,
            geometry_reused: e.geometry_reused,
            hit_cells      : e.hit_cells.len(),
            table_blocked  : e.table_blocked.iter().filter(|&&b| b).count(),
            k_med          : e.k_med,
            k_tab          : e.k_tab,
            k_isq          : range(e.k_isq.iter().copied()),
            k_bs           : range(e.k_bs.iter().copied()),
            field_area     : range(e.field_areas.iter().map(|&a| cm2_(a))),
            peak_dose      : e.peak_dose(),
        }
    }
}

impl From<&DoseReport> for Summary {
    fn from(report: &DoseReport) -> Self {
        Self {
            peak_dose: report.dose_map.fold(0.0, |a: f32, &b| a.max(b)),
            cells: report.dose_map.len(),
            fallback: report.fallbacks.misses().iter()
                .map(|m| Fallback { event: m.event, correction: m.correction.to_string(), query: m.query.clone() })
                .collect(),
            event: report.events.iter().map(EventSummary::from).collect(),
        }
    }
}

impl Summary {
    pub fn write(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self)
            .map_err(|e| Error::Output { path: path.into(), source: std::io::Error::new(std::io::ErrorKind::InvalidData, e) })?;
        std::fs::write(path, text)
            .map_err(|source| Error::Output { path: path.into(), source })
    }
}
