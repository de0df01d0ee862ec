//! Accumulation of skin dose over the events of a procedure.
//!
//! Events are processed strictly in order. For each one the driver
//!
//! 1. decides whether the geometry differs from that of the previous event,
//! 2. if so, positions the scene, builds the beam, finds the hit cells and
//!    the geometric per-cell quantities (field area, inverse-square factor,
//!    table blockage); otherwise it reuses those of the previous event,
//! 3. looks up the beam-quality corrections,
//! 4. adds the event's dose to the dose map.
//!
//! Events whose beam misses the patient contribute nothing and need no
//! corrections. A correction missing from the lookup store is replaced by 1
//! and reported, but never stops the calculation.

use std::collections::BTreeMap;
use std::rc::Rc;

use itertools::izip;
use ndarray::{azip, Array1};
use tracing::{debug, info, warn};

use geometry::Point;
use units::{Area, Length, todo::{Dosef32, Kermaf32, Kvpf32, Ratiof32}};

use crate::beam::{Beam, BeamMode};
use crate::config::TableCorrection;
use crate::corrections::{half_value_layer, inverse_square, medium_correction, table_correction, BackscatterCurve};
use crate::error::{Correction, LookupMiss, Result};
use crate::event::{Event, EventGeometry, EventTable};
use crate::field::field_areas;
use crate::scene::Scene;
use crate::store::LookupStore;

/// Dose delivered to one cell by one event
pub fn event_dose(kerma: Kermaf32, k_isq: Ratiof32, k_med: Ratiof32, k_bs: Ratiof32, k_tab: Ratiof32) -> Dosef32 {
    kerma * k_isq * k_med * k_bs * k_tab
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    pub table_correction: TableCorrection,
    /// Reuse the geometry of the previous event when it has not changed
    pub reuse_geometry: bool,
}

impl Default for Options {
    fn default() -> Self { Self { table_correction: TableCorrection::Measured, reuse_geometry: true } }
}

/// Where the driver is in its progress through the events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Initializing,
    AwaitingEvent,
    NewGeometry,
    Corrections,
    Accumulate,
    Done,
}

/// Everything about an event that follows from its geometry alone
#[derive(Clone, Debug, PartialEq)]
struct GeometryState {
    params: EventGeometry,
    beam: Beam,
    /// Indices of the patient cells struck by the beam
    hit_cells: Vec<usize>,
    /// Per hit cell: is it irradiated through the table?
    blocked: Vec<bool>,
    field_areas: Vec<Area>,
    k_isq: Vec<Ratiof32>,
}

/// What happened in one event. Per-cell values are given for the hit cells
/// only, in the order of `hit_cells`.
#[derive(Clone, Debug, PartialEq)]
pub struct EventResult {
    pub index: usize,
    pub kerma: Kermaf32,
    pub geometry_reused: bool,
    pub source: Point,
    pub hit_cells: Vec<usize>,
    pub table_blocked: Vec<bool>,
    pub field_areas: Vec<Area>,
    pub k_isq: Vec<Ratiof32>,
    pub k_bs: Vec<Ratiof32>,
    pub k_med: Ratiof32,
    pub k_tab: Ratiof32,
    pub dose: Vec<Dosef32>,
}

impl EventResult {
    /// One flag per patient cell
    pub fn hit_mask(&self, n_cells: usize) -> Vec<bool> {
        let mut mask = vec![false; n_cells];
        for &cell in &self.hit_cells { mask[cell] = true }
        mask
    }

    pub fn missed(&self) -> bool { self.hit_cells.is_empty() }

    pub fn peak_dose(&self) -> Dosef32 { self.dose.iter().copied().fold(0.0, f32::max) }
}

/// Lookups which could not be satisfied, and were replaced by 1
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FallbackSummary {
    misses: Vec<LookupMiss>,
}

impl FallbackSummary {
    fn record(&mut self, miss: LookupMiss) { self.misses.push(miss) }

    pub fn misses(&self) -> &[LookupMiss] { &self.misses }
    pub fn is_empty(&self) -> bool { self.misses.is_empty() }

    /// Number of events which used a neutral factor, per correction
    pub fn counts(&self) -> BTreeMap<Correction, usize> {
        let mut counts = BTreeMap::new();
        for miss in &self.misses { *counts.entry(miss.correction).or_insert(0) += 1 }
        counts
    }

    pub fn log(&self) {
        if self.is_empty() {
            info!("all corrections found in the lookup tables");
            return
        }
        for (correction, n) in self.counts() {
            warn!(%correction, events = n, "{n} event(s) used a neutral {correction} of 1");
        }
    }
}

pub struct DoseReport {
    /// Dose per patient cell, mGy
    pub dose_map: Array1<Dosef32>,
    pub events: Vec<EventResult>,
    pub fallbacks: FallbackSummary,
}

/// Steps through the events, yielding one `EventResult` per event
pub struct Driver<'a> {
    scene: &'a mut Scene,
    events: &'a EventTable,
    store: &'a dyn LookupStore,
    options: Options,
    reference_distance: Length,
    dose_map: Array1<Dosef32>,
    geometry: Option<Rc<GeometryState>>,
    backscatter: Option<BackscatterCurve>,
    fallbacks: FallbackSummary,
    next: usize,
    stage: Stage,
}

impl<'a> Driver<'a> {

    pub fn new(scene: &'a mut Scene, events: &'a EventTable, store: &'a dyn LookupStore, options: Options) -> Self {
        let n_cells = scene.patient.len();
        let mut driver = Self {
            scene, events, store, options,
            reference_distance: events.reference_distance(),
            dose_map: Array1::zeros(n_cells),
            geometry: None,
            backscatter: None,
            fallbacks: FallbackSummary::default(),
            next: 0,
            stage: Stage::Initializing,
        };
        info!(events = events.len(), cells = n_cells, "starting dose calculation");
        driver.enter(Stage::AwaitingEvent);
        driver
    }

    pub fn stage(&self) -> Stage { self.stage }

    /// The dose accumulated so far
    pub fn dose_map(&self) -> &Array1<Dosef32> { &self.dose_map }

    pub fn finish(self) -> (Array1<Dosef32>, FallbackSummary) { (self.dose_map, self.fallbacks) }

    fn enter(&mut self, stage: Stage) {
        debug!(event = self.next, from = ?self.stage, to = ?stage, "stage transition");
        self.stage = stage;
    }

    fn process(&mut self, index: usize) -> Result<EventResult> {
        let events = self.events;
        let event = &events[index];
        let (geometry, geometry_reused) = self.update_geometry(index, event)?;

        let mut result = EventResult {
            index,
            kerma: event.kerma,
            geometry_reused,
            source: geometry.beam.source(),
            hit_cells: geometry.hit_cells.clone(),
            table_blocked: geometry.blocked.clone(),
            field_areas: geometry.field_areas.clone(),
            k_isq: geometry.k_isq.clone(),
            k_bs: vec![],
            k_med: 1.0,
            k_tab: 1.0,
            dose: vec![],
        };

        if geometry.hit_cells.is_empty() {
            debug!(event = index, "beam misses the patient");
            self.enter(Stage::Accumulate);
            return Ok(result)
        }

        self.enter(Stage::Corrections);
        let (k_bs, k_med) = self.beam_quality_corrections(index, event, &geometry.field_areas)?;
        let k_tab = table_correction(self.store, index, event, self.options.table_correction)
            .unwrap_or_else(|miss| self.fallback(miss));

        self.enter(Stage::Accumulate);
        let dose: Vec<Dosef32> = izip!(&geometry.k_isq, &k_bs, &geometry.blocked)
            .map(|(&k_isq, &k_bs, &blocked)| {
                event_dose(event.kerma, k_isq, k_med, k_bs, if blocked { k_tab } else { 1.0 })
            })
            .collect();

        let mut contribution = Array1::<Dosef32>::zeros(self.dose_map.len());
        for (&cell, &d) in geometry.hit_cells.iter().zip(&dose) { contribution[cell] = d }
        azip!((total in &mut self.dose_map, &d in &contribution) *total += d);

        result.k_bs = k_bs;
        result.k_med = k_med;
        result.k_tab = k_tab;
        result.dose = dose;
        Ok(result)
    }

    /// Bring the geometry up to date for this event. Returns it, together with
    /// whether it was carried over from the previous event.
    fn update_geometry(&mut self, index: usize, event: &Event) -> Result<(Rc<GeometryState>, bool)> {
        if self.options.reuse_geometry {
            if let Some(previous) = &self.geometry {
                if previous.params == event.geometry {
                    debug!(event = index, hits = previous.hit_cells.len(), "geometry unchanged");
                    return Ok((Rc::clone(previous), true))
                }
            }
        }

        self.enter(Stage::NewGeometry);
        let params = event.geometry;
        self.scene.position(&params)?;
        let beam = Beam::new(&params, BeamMode::Event);
        let hit_cells: Vec<usize> = beam.check_hit(&self.scene.patient)
            .into_iter()
            .enumerate()
            .filter_map(|(i, hit)| hit.then_some(i))
            .collect();
        debug!(event = index, hits = hit_cells.len(), "geometry recomputed");

        let state = if hit_cells.is_empty() {
            GeometryState { params, beam, hit_cells, blocked: vec![], field_areas: vec![], k_isq: vec![] }
        } else {
            let cells: Vec<Point> = hit_cells.iter().map(|&i| self.scene.patient.cells()[i]).collect();
            GeometryState {
                params,
                blocked    : self.scene.table_blocks(&beam, &cells),
                field_areas: field_areas(&params, beam.source(), &cells)?,
                k_isq      : inverse_square(beam.source(), &cells, self.reference_distance)?,
                beam,
                hit_cells,
            }
        };
        let state = Rc::new(state);
        self.geometry = Some(Rc::clone(&state));
        Ok((state, false))
    }

    /// Backscatter (per hit cell) and medium corrections. Both depend on the
    /// HVL: without it, both are 1.
    fn beam_quality_corrections(&mut self, index: usize, event: &Event, areas: &[Area]) -> Result<(Vec<Ratiof32>, Ratiof32)> {
        let neutral = || (vec![1.0; areas.len()], 1.0);
        let hvl = match half_value_layer(self.store, index, event) {
            Ok(hvl) => hvl,
            Err(miss) => {
                self.fallback(miss);
                return Ok(neutral())
            }
        };

        let k_bs = match self.backscatter_curve(event.kvp, hvl) {
            Some(curve) => curve.correction(areas)?,
            None => {
                let query = format!("{} kV with HVL {:?}", event.kvp, hvl);
                self.fallback(LookupMiss { event: index, correction: Correction::Backscatter, query });
                neutral().0
            }
        };

        let k_med = medium_correction(self.store, index, event.kvp, hvl, areas)?
            .unwrap_or_else(|miss| self.fallback(miss));

        Ok((k_bs, k_med))
    }

    /// The backscatter curve for this beam quality: the previous event's,
    /// if it matches
    fn backscatter_curve(&mut self, kvp: Kvpf32, hvl: Length) -> Option<&BackscatterCurve> {
        if !self.backscatter.as_ref().is_some_and(|curve| curve.matches(kvp, hvl)) {
            self.backscatter = BackscatterCurve::new(kvp, hvl);
        }
        self.backscatter.as_ref()
    }

    fn fallback(&mut self, miss: LookupMiss) -> Ratiof32 {
        warn!("{miss}; using 1");
        self.fallbacks.record(miss);
        1.0
    }
}

impl Iterator for Driver<'_> {
    type Item = Result<EventResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stage == Stage::Done { return None }
        if self.next >= self.events.len() {
            self.enter(Stage::Done);
            return None
        }
        let index = self.next;
        let result = self.process(index);
        self.next += 1;
        match result {
            Ok(_)  => self.enter(Stage::AwaitingEvent),
            Err(_) => self.enter(Stage::Done),
        }
        Some(result)
    }
}

/// Run the whole procedure
pub fn calculate(scene: &mut Scene, events: &EventTable, store: &dyn LookupStore, options: Options) -> Result<DoseReport> {
    let mut driver = Driver::new(scene, events, store, options);
    let results = driver.by_ref().collect::<Result<Vec<_>>>()?;
    let (dose_map, fallbacks) = driver.finish();
    fallbacks.log();
    info!(peak = dose_map.fold(0.0, |a: f32, &b| a.max(b)), "dose calculation complete");
    Ok(DoseReport { dose_map, events: results, fallbacks })
}
