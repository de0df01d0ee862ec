//! The table of irradiation events, in procedure order.
//!
//! Events are read from TOML as `[[event]]` records of plain numbers in fixed
//! units: angles in degrees, distances and field sizes in cm, filtration in
//! mm, reference air kerma in mGy and tube voltage in kV. Every record is
//! validated once, on loading; a missing or malformed field aborts the run,
//! naming the event and the field.
//!
//! | column              | meaning                                          | required |
//! |---------------------|--------------------------------------------------|----------|
//! | `ap1`, `ap2`        | primary / secondary gantry angle                 | yes      |
//! | `ap3`               | detector rotation                                | no (0)   |
//! | `at1`, `at2`, `at3` | table rotation / head tilt / cradle tilt         | no (0)   |
//! | `tx`, `ty`, `tz`    | table displacement                               | yes      |
//! | `fs_lat`, `fs_long` | field size at the detector plane                 | yes      |
//! | `dsd`, `dsi`        | source to detector / isocenter distance          | yes      |
//! | `dsl`               | detector side length                             | yes      |
//! | `dsirp`             | source to IRP distance                           | no (dsi − 15) |
//! | `k_irp`             | reference point air kerma                        | yes      |
//! | `kvp`               | tube voltage                                     | yes      |
//! | `filter_cu`, `filter_al` | filtration                                  | no (0)   |
//! | `model`             | device model                                     | yes      |
//! | `acquisition_plane` | acquisition plane label                          | yes      |
//! | `hvl`               | half value layer, mm Al                          | no (looked up) |
//!
//! The dose report does not record the table angles or the detector rotation,
//! which is why those default to zero.

use std::fs;
use std::ops::Index;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use geometry::{Rotation, Vector};
use units::{cm, deg, mm, Angle, Area, Length, todo::{Kermaf32, Kvpf32}};

use crate::config::Normalization;
use crate::error::ConfigurationError;
use crate::phantom::TableMotion;

/// Distance by which the interventional reference point lies on the source
/// side of the isocenter
pub const IRP_FROM_ISOCENTER: f32 = 15.0; // cm

/// Parameters of an event which determine where the beam goes and which cells
/// it strikes. Two events with equal geometry produce identical hits and field
/// areas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventGeometry {
    pub primary_angle          : Angle,
    pub secondary_angle        : Angle,
    pub detector_rotation      : Angle,
    pub table_rotation         : Angle,
    pub table_head_tilt        : Angle,
    pub table_cradle_tilt      : Angle,
    pub table_translation      : Vector,
    pub field_size_lateral     : Length,
    pub field_size_longitudinal: Length,
    pub source_detector        : Length,
    pub source_isocenter       : Length,
    pub detector_side          : Length,
}

impl EventGeometry {
    pub fn detector_isocenter(&self) -> Length { self.source_detector - self.source_isocenter }

    /// Field area in the detector plane
    pub fn field_area(&self) -> Area { self.field_size_lateral * self.field_size_longitudinal }

    /// Table rotation (head tilt about x, rotation about y, cradle tilt about
    /// z) and displacement, pivoting `pivot` from the head end of the table
    pub fn table_motion(&self, pivot: Length) -> TableMotion {
        TableMotion {
            pivot,
            rotation: Rotation::xyz(self.table_head_tilt, self.table_rotation, self.table_cradle_tilt),
            translation: self.table_translation,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub geometry: EventGeometry,
    /// Source to interventional reference point
    pub source_irp: Length,
    /// Reference point air kerma, mGy
    pub kerma: Kermaf32,
    pub kvp: Kvpf32,
    pub filter_cu: Length,
    pub filter_al: Length,
    pub device_model: String,
    pub acquisition_plane: String,
    /// Half value layer, if known in advance
    pub hvl: Option<Length>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventTable {
    events: Vec<Event>,
}

impl EventTable {

    pub fn new(events: Vec<Event>) -> Result<Self, ConfigurationError> {
        if events.is_empty() { return Err(ConfigurationError::EmptyEventTable) }
        Ok(Self { events })
    }

    pub fn read(path: &Path, normalization: &Normalization) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigurationError::Io { path: path.into(), source })?;
        Self::parse_from(&text, path, normalization)
    }

    pub fn parse(text: &str, normalization: &Normalization) -> Result<Self, ConfigurationError> {
        Self::parse_from(text, Path::new("<event table>"), normalization)
    }

    fn parse_from(text: &str, path: &Path, normalization: &Normalization) -> Result<Self, ConfigurationError> {
        let raw: RawEventTable = toml::from_str(text)
            .map_err(|source| ConfigurationError::Toml { path: PathBuf::from(path), source })?;
        let events = raw.event.into_iter()
            .enumerate()
            .map(|(index, raw)| raw.validate(index, normalization))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(events)
    }

    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }
    pub fn iter(&self) -> std::slice::Iter<'_, Event> { self.events.iter() }
    pub fn events(&self) -> &[Event] { &self.events }

    /// Reference distance for the inverse-square correction: the first
    /// event's source to IRP distance
    pub fn reference_distance(&self) -> Length { self.events[0].source_irp }
}

impl Index<usize> for EventTable {
    type Output = Event;
    fn index(&self, index: usize) -> &Event { &self.events[index] }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;
    fn into_iter(self) -> Self::IntoIter { self.events.iter() }
}

// ----- Raw records and their validation -------------------------------------------------
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct RawEventTable {
    #[serde(default)]
    event: Vec<RawEvent>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct RawEvent {
    ap1: Option<f32>, ap2: Option<f32>, ap3: Option<f32>,
    at1: Option<f32>, at2: Option<f32>, at3: Option<f32>,
    tx : Option<f32>, ty : Option<f32>, tz : Option<f32>,
    fs_lat: Option<f32>, fs_long: Option<f32>,
    dsd: Option<f32>, dsi: Option<f32>, dsl: Option<f32>, dsirp: Option<f32>,
    k_irp: Option<f32>,
    kvp: Option<f32>,
    filter_cu: Option<f32>,
    filter_al: Option<f32>,
    model: Option<String>,
    acquisition_plane: Option<String>,
    hvl: Option<f32>,
}

enum Bound { Any, NonNegative, Positive }

struct Validator { event: usize }

impl Validator {
    fn check(&self, field: &'static str, value: f32, bound: Bound) -> Result<f32, ConfigurationError> {
        let malformed = |reason: &str| ConfigurationError::MalformedEventField {
            event: self.event, field, reason: format!("{reason} (got {value})"),
        };
        if !value.is_finite() { return Err(malformed("not a finite number")) }
        match bound {
            Bound::Positive    if value <= 0.0 => Err(malformed("must be positive")),
            Bound::NonNegative if value <  0.0 => Err(malformed("must not be negative")),
            _ => Ok(value),
        }
    }

    fn required(&self, field: &'static str, value: Option<f32>, bound: Bound) -> Result<f32, ConfigurationError> {
        let value = value.ok_or(ConfigurationError::MissingEventField { event: self.event, field })?;
        self.check(field, value, bound)
    }

    fn optional(&self, field: &'static str, value: Option<f32>, bound: Bound) -> Result<Option<f32>, ConfigurationError> {
        value.map(|v| self.check(field, v, bound)).transpose()
    }

    fn text(&self, field: &'static str, value: Option<String>) -> Result<String, ConfigurationError> {
        match value {
            None => Err(ConfigurationError::MissingEventField { event: self.event, field }),
            Some(s) if s.trim().is_empty() => Err(ConfigurationError::MalformedEventField {
                event: self.event, field, reason: "empty string".into()
            }),
            Some(s) => Ok(s),
        }
    }
}

impl RawEvent {
    fn validate(self, event: usize, n: &Normalization) -> Result<Event, ConfigurationError> {
        use Bound::*;
        let v = Validator { event };
        let angle = |field, value: Option<f32>, sign: f32| -> Result<Angle, ConfigurationError> {
            Ok(deg(sign * v.optional(field, value, Any)?.unwrap_or(0.0)))
        };

        let primary_angle   = deg(n.rotation_direction.ap1 * v.required("ap1", self.ap1, Any)?);
        let secondary_angle = deg(n.rotation_direction.ap2 * v.required("ap2", self.ap2, Any)?);

        let [ox, oy, oz] = n.translation_offset;
        let [dx, dy, dz] = n.translation_direction;
        let table_translation = Vector::new(
            ox + cm(dx * v.required("tx", self.tx, Any)?),
            oy + cm(dy * v.required("ty", self.ty, Any)?),
            oz + cm(dz * v.required("tz", self.tz, Any)?),
        );

        let source_detector  = v.required("dsd", self.dsd, Positive)?;
        let source_isocenter = v.required("dsi", self.dsi, Positive)?;
        if source_isocenter >= source_detector {
            return Err(ConfigurationError::MalformedEventField {
                event, field: "dsi",
                reason: format!("source to isocenter ({source_isocenter} cm) must be shorter than source to detector ({source_detector} cm)"),
            })
        }
        let source_irp = v.optional("dsirp", self.dsirp, Positive)?
            .unwrap_or(source_isocenter - IRP_FROM_ISOCENTER);
        let source_irp = v.check("dsirp", source_irp, Positive)?;

        let geometry = EventGeometry {
            primary_angle,
            secondary_angle,
            detector_rotation      : angle("ap3", self.ap3, n.rotation_direction.ap3)?,
            table_rotation         : angle("at1", self.at1, n.rotation_direction.at1)?,
            table_head_tilt        : angle("at2", self.at2, n.rotation_direction.at2)?,
            table_cradle_tilt      : angle("at3", self.at3, n.rotation_direction.at3)?,
            table_translation,
            field_size_lateral     : cm(v.required("fs_lat" , self.fs_lat , Positive)?),
            field_size_longitudinal: cm(v.required("fs_long", self.fs_long, Positive)?),
            source_detector        : cm(source_detector),
            source_isocenter       : cm(source_isocenter),
            detector_side          : cm(v.required("dsl", self.dsl, Positive)?),
        };

        Ok(Event {
            geometry,
            source_irp       : cm(source_irp),
            kerma            : v.required("k_irp", self.k_irp, NonNegative)?,
            kvp              : v.required("kvp"  , self.kvp  , Positive   )?,
            filter_cu        : mm(v.optional("filter_cu", self.filter_cu, NonNegative)?.unwrap_or(0.0)),
            filter_al        : mm(v.optional("filter_al", self.filter_al, NonNegative)?.unwrap_or(0.0)),
            device_model     : v.text("model", self.model)?,
            acquisition_plane: v.text("acquisition_plane", self.acquisition_plane)?,
            hvl              : v.optional("hvl", self.hvl, Positive)?.map(mm),
        })
    }
}
