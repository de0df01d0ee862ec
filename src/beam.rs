//! The X-ray beam of one event: a pyramid with its apex at the focal spot and
//! its base on the detector.
//!
//! At zero gantry angles the source lies on the +y axis (under the table) at
//! the source-to-isocenter distance, and the detector faces it from the other
//! side of the isocenter. The primary angle turns the gantry about the
//! longitudinal axis, the secondary angle about the lateral axis.

use geometry::{Dot, Point, RatioVec, Rotation, Vector};
use units::{cm, Angle, Length};

use crate::event::EventGeometry;
use crate::phantom::Phantom;

/// Corners of the beam's cross-section at the detector, in units of the
/// lateral field size (x), the source-to-detector distance (y) and the
/// longitudinal field size (z)
const EDGE_CORNERS: [[f32; 3]; 4] = [
    [ 0.5, -1.0,  0.5],
    [ 0.5, -1.0, -0.5],
    [-0.5, -1.0, -0.5],
    [-0.5, -1.0,  0.5],
];

/// Corners of the detector box, in units of the detector side length (x, z)
/// and of the detector-to-isocenter distance (y)
const DETECTOR_CORNERS: [[f32; 3]; 8] = [
    [ 0.5, -1.0,  0.5],
    [ 0.5, -1.0, -0.5],
    [-0.5, -1.0, -0.5],
    [-0.5, -1.0,  0.5],
    [ 0.5, -1.2,  0.5],
    [ 0.5, -1.2, -0.5],
    [-0.5, -1.2, -0.5],
    [-0.5, -1.2,  0.5],
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BeamMode {
    /// Gantry angles as recorded in the event
    #[default]
    Event,
    /// Ignore the gantry angles: for inspecting the scene setup
    ZeroAngulation,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Beam {
    source: Point,
    edges: [Point; 4],
    planes: [RatioVec; 4],
    detector: [Point; 8],
}

impl Beam {

    pub fn new(geometry: &EventGeometry, mode: BeamMode) -> Self {
        let rotation = match mode {
            BeamMode::Event          => gantry_rotation(geometry.primary_angle, geometry.secondary_angle),
            BeamMode::ZeroAngulation => Rotation::identity(),
        };
        let g = geometry;
        let dsi = Vector::new(cm(0.0), g.source_isocenter, cm(0.0));

        let source = rotation * (Point::origin() + dsi);

        let scale = |[x, y, z]: [f32; 3], sx: Length, sy: Length, sz: Length| Vector::new(sx * x, sy * y, sz * z);
        let edges = EDGE_CORNERS.map(|c| {
            let edge = scale(c, g.field_size_lateral, g.source_detector, g.field_size_longitudinal) + dsi;
            rotation * (Point::origin() + edge)
        });
        let detector = DETECTOR_CORNERS.map(|c| {
            let corner = scale(c, g.detector_side, g.detector_isocenter(), g.detector_side);
            rotation * (Point::origin() + corner)
        });

        let [v0, v1, v2, v3] = edges.map(|e| (e - source).normalize());
        let planes = [v0.cross(v1), v1.cross(v2), v2.cross(v3), v3.cross(v0)];

        Self { source, edges, planes, detector }
    }

    pub fn source          (&self) -> Point          { self.source }
    /// Where the four edge rays meet the detector plane
    pub fn edges           (&self) -> &[Point; 4]    { &self.edges }
    /// Normals of the four faces of the pyramid, pointing out of the beam
    pub fn planes          (&self) -> &[RatioVec; 4] { &self.planes }
    pub fn detector_corners(&self) -> &[Point; 8]    { &self.detector }

    /// Is `point` inside (or on the surface of) the beam pyramid?
    pub fn contains(&self, point: Point) -> bool {
        let r = point - self.source;
        self.planes.iter().all(|&n| r.dot(n) <= cm(0.0))
    }

    /// One flag per cell of `phantom`: is the cell struck by the beam?
    ///
    /// Cells of phantoms with normals must also face the source: those on the
    /// far side of the body are shadowed by it.
    pub fn check_hit(&self, phantom: &Phantom) -> Vec<bool> {
        let cells = phantom.cells();
        match phantom.normals() {
            None => cells.iter().map(|&cell| self.contains(cell)).collect(),
            Some(normals) => cells.iter().zip(normals)
                .map(|(&cell, &normal)| {
                    self.contains(cell) && (cell - self.source).dot(normal) <= cm(0.0)
                })
                .collect(),
        }
    }
}

/// Rotation from the gantry's rest position: the inverse of the secondary
/// rotation applied after the primary one
pub fn gantry_rotation(primary: Angle, secondary: Angle) -> Rotation {
    (Rotation::about_x(secondary) * Rotation::about_z(primary)).transpose()
}
