//! The patient lying on the pad on the table, and the placement of all three
//! for each event.
//!
//! In the reference frame the head end of the table is at the origin, with
//! the table's upper surface at y = 0 and the table extending towards -z.
//! The pad lies on the table and the patient lies on the pad, offset from the
//! centre of the head end of the table.

use geometry::{Dot, Point, Triangle, Vector};
use units::{cm, deg, Length};

use crate::beam::Beam;
use crate::config::{PatientOrientation, PhantomSettings};
use crate::error::ConfigurationError;
use crate::event::EventGeometry;
use crate::phantom::{MeshLoader, Phantom, PhantomModel};

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub patient: Phantom,
    pub table: Phantom,
    pub pad: Phantom,
    /// Distance from the head end of the table to its rotation pivot
    pivot: Length,
}

impl Scene {

    /// Build the phantoms, stack them and save their reference poses
    pub fn new(settings: &PhantomSettings, meshes: &dyn MeshLoader) -> Result<Self, ConfigurationError> {
        let dims = &settings.dimension;
        let mut patient = Phantom::new(settings.model, dims, settings.human_mesh.as_deref(), meshes)?;
        let mut table   = Phantom::new(PhantomModel::Table, dims, None, meshes)?;
        let mut pad     = Phantom::new(PhantomModel::Pad  , dims, None, meshes)?;

        let missing = |model, field| ConfigurationError::MissingDimension { model, field };
        let pad_thickness = dims.pad_thickness.ok_or(missing(PhantomModel::Pad  , "pad_thickness"))?;
        let table_length  = dims.table_length .ok_or(missing(PhantomModel::Table, "table_length" ))?;

        orient(&mut patient, settings.patient_orientation);
        patient.translate(Vector::new(cm(0.0), -pad_thickness, cm(0.0)));
        let [x, y, z] = settings.patient_offset;
        patient.translate(Vector::new(x, y, z));

        patient.save_reference_pose();
        table  .save_reference_pose();
        pad    .save_reference_pose();

        Ok(Self { patient, table, pad, pivot: table_length / 2.0 })
    }

    pub fn pivot(&self) -> Length { self.pivot }

    /// Move patient, table and pad to where the event's table motion puts
    /// them
    pub fn position(&mut self, geometry: &EventGeometry) -> Result<(), ConfigurationError> {
        let motion = geometry.table_motion(self.pivot);
        self.patient.position(&motion)?;
        self.table  .position(&motion)?;
        self.pad    .position(&motion)?;
        Ok(())
    }

    /// Which of `cells` are irradiated through the table?
    ///
    /// The table's underside is covered by four triangles. When the source is
    /// above the table nothing is blocked; when all four edges of the beam
    /// pass through the underside, everything is.
    pub fn table_blocks(&self, beam: &Beam, cells: &[Point]) -> Vec<bool> {
        let underside = underside(&self.table);
        let source = beam.source();

        if (Point::origin() - source).dot(underside[0].normal()) < cm(0.0) {
            return vec![false; cells.len()]
        }

        let through_table = |target: Point| underside.iter().any(|t| t.intersects_segment(source, target));

        if beam.edges().iter().all(|&edge| through_table(edge)) {
            return vec![true; cells.len()]
        }

        cells.iter().map(|&cell| through_table(cell)).collect()
    }
}

/// Feet-first patients are turned end for end about their longitudinal centre
fn orient(patient: &mut Phantom, orientation: PatientOrientation) {
    match orientation {
        PatientOrientation::HeadFirstSupine => {}
        PatientOrientation::FeetFirstSupine => {
            let (lo, hi) = patient.z_extent();
            let centre = Vector::new(cm(0.0), cm(0.0), (lo + hi) / 2.0);
            patient.translate(-centre);
            patient.rotate([deg(0.0), deg(180.0), deg(0.0)]);
            patient.translate(centre);
        }
    }
}

/// The triangles spanning the bottom face (cells 8 to 15) of the positioned
/// table: body section first, then the head rest. All face the patient.
fn underside(table: &Phantom) -> [Triangle; 4] {
    let r = table.cells();
    [Triangle::new(r[8], r[13], r[14]),
     Triangle::new(r[8], r[14], r[15]),
     Triangle::new(r[9], r[10], r[11]),
     Triangle::new(r[9], r[11], r[12])]
}
