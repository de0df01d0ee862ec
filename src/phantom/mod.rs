//! Discretized surfaces standing in for the patient's skin, the patient
//! support table and the pad lying on it.
//!
//! Coordinates: x lateral, y vertical (positive towards the floor), z
//! longitudinal with the head end of the table at z = 0 and the feet towards
//! negative z. All lengths in cm.

pub mod mesh;

use std::str::FromStr;

use itertools::iproduct;
use serde::Deserialize;

use geometry::{Point, RatioVec, Rotation, Vector};
use units::{cm, cm_, Angle, Length};

use crate::error::ConfigurationError;
pub use mesh::{Mesh, MeshLoader, StlDirectory};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhantomModel { Plane, Cylinder, Human, Table, Pad }

impl PhantomModel {
    /// Only closed 3D surfaces carry outward normals
    pub fn has_normals(self) -> bool { matches!(self, Self::Cylinder | Self::Human) }
}

impl FromStr for PhantomModel {
    type Err = ConfigurationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use PhantomModel::*;
        match s.to_ascii_lowercase().as_str() {
            "plane"    => Ok(Plane),
            "cylinder" => Ok(Cylinder),
            "human"    => Ok(Human),
            "table"    => Ok(Table),
            "pad"      => Ok(Pad),
            _ => Err(ConfigurationError::UnknownPhantomModel(s.into())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution { #[default] Sparse, Dense }

impl Resolution {
    fn plane_cells_per_cm(self) -> f32 {
        match self { Self::Sparse => 1.0, Self::Dense => 2.0 }
    }
    fn cylinder_rings_per_cm(self) -> f32 {
        match self { Self::Sparse => 1.0, Self::Dense => 4.0 }
    }
    /// Angular step between cells around the cylinder, in radians
    fn cylinder_angular_step(self) -> f32 {
        match self { Self::Sparse => 0.1, Self::Dense => 0.05 }
    }
}

/// Dimensions of the mathematical phantoms. Only those required by the model
/// being built need be present.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhantomDimensions {
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub plane_length     : Option<Length>,
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub plane_width      : Option<Length>,
    #[serde(default)]                                                            pub plane_resolution : Option<Resolution>,

    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub cylinder_length  : Option<Length>,
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub cylinder_radius_a: Option<Length>,
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub cylinder_radius_b: Option<Length>,
    #[serde(default)]                                                            pub cylinder_resolution: Option<Resolution>,

    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub table_length     : Option<Length>,
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub table_width      : Option<Length>,
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub table_thickness  : Option<Length>,

    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub pad_length       : Option<Length>,
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub pad_width        : Option<Length>,
    #[serde(default, deserialize_with = "crate::config::deserialize_uom_opt")] pub pad_thickness    : Option<Length>,
}

impl PhantomDimensions {
    /// Adult-sized defaults for every model
    pub fn standard() -> Self {
        Self {
            plane_length       : Some(cm(120.0)),
            plane_width        : Some(cm( 40.0)),
            plane_resolution   : Some(Resolution::Sparse),
            cylinder_length    : Some(cm(150.0)),
            cylinder_radius_a  : Some(cm( 20.0)),
            cylinder_radius_b  : Some(cm( 10.0)),
            cylinder_resolution: Some(Resolution::Sparse),
            table_length       : Some(cm(281.5)),
            table_width        : Some(cm( 45.0)),
            table_thickness    : Some(cm(  5.0)),
            pad_length         : Some(cm(281.5)),
            pad_width          : Some(cm( 45.0)),
            pad_thickness      : Some(cm(  4.0)),
        }
    }
}

/// Rigid motion of the patient support for one event: rotation about a pivot
/// on the table's long axis, followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableMotion {
    /// Distance from the head end of the table to the rotation pivot
    pub pivot: Length,
    pub rotation: Rotation,
    pub translation: Vector,
}

#[derive(Clone, Debug, PartialEq)]
struct Pose {
    cells: Vec<Point>,
    normals: Option<Vec<RatioVec>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Phantom {
    model: PhantomModel,
    cells: Vec<Point>,
    normals: Option<Vec<RatioVec>>,
    triangles: Vec<[usize; 3]>,
    reference: Option<Pose>,
}

impl Phantom {

    /// Build a phantom. `human_mesh` identifies the mesh to be fetched from
    /// `meshes` and is only consulted for the human model.
    pub fn new(
        model: PhantomModel,
        dimensions: &PhantomDimensions,
        human_mesh: Option<&str>,
        meshes: &dyn MeshLoader,
    ) -> Result<Self, ConfigurationError> {
        use PhantomModel::*;
        let need = |value: Option<Length>, field| value.ok_or(ConfigurationError::MissingDimension { model, field });
        let d = dimensions;
        let surface = match model {
            Plane => plane(
                need(d.plane_length, "plane_length")?,
                need(d.plane_width , "plane_width" )?,
                d.plane_resolution.unwrap_or_default(),
            ),
            Cylinder => cylinder(
                need(d.cylinder_length  , "cylinder_length"  )?,
                need(d.cylinder_radius_a, "cylinder_radius_a")?,
                need(d.cylinder_radius_b, "cylinder_radius_b")?,
                d.cylinder_resolution.unwrap_or_default(),
            ),
            Human => {
                let id = human_mesh.ok_or(ConfigurationError::MissingHumanMesh)?;
                human(meshes.load(id)?)
            }
            Table => slab(
                need(d.table_length   , "table_length"   )?,
                need(d.table_width    , "table_width"    )?,
                need(d.table_thickness, "table_thickness")?,
            ),
            Pad => slab(
                need(d.pad_length   , "pad_length"   )?,
                need(d.pad_width    , "pad_width"    )?,
                -need(d.pad_thickness, "pad_thickness")?,
            ),
        };
        let Surface { cells, normals, triangles } = surface;
        Ok(Self { model, cells, normals, triangles, reference: None })
    }

    pub fn model    (&self) -> PhantomModel          { self.model }
    pub fn cells    (&self) -> &[Point]              { &self.cells }
    pub fn normals  (&self) -> Option<&[RatioVec]>   { self.normals.as_deref() }
    pub fn triangles(&self) -> &[[usize; 3]]         { &self.triangles }
    pub fn len      (&self) -> usize                 { self.cells.len() }
    pub fn is_empty (&self) -> bool                  { self.cells.is_empty() }

    /// Rotate about the origin by `Rx * Ry * Rz` built from the three angles.
    /// Normals rotate with the cells.
    pub fn rotate(&mut self, [x, y, z]: [Angle; 3]) {
        let rotation = Rotation::xyz(x, y, z);
        self.cells   = rotated(&self.cells, rotation);
        self.normals = self.normals.as_deref().map(|n| rotated_normals(n, rotation));
    }

    /// Shift every cell; normals are unaffected
    pub fn translate(&mut self, offset: Vector) {
        self.cells = translated(&self.cells, offset);
    }

    /// Remember the current pose as the one from which every event's pose is
    /// derived
    pub fn save_reference_pose(&mut self) {
        self.reference = Some(Pose { cells: self.cells.clone(), normals: self.normals.clone() });
    }

    pub fn has_reference_pose(&self) -> bool { self.reference.is_some() }

    /// Place the phantom where the table's motion puts it, starting afresh
    /// from the reference pose.
    pub fn position(&mut self, motion: &TableMotion) -> Result<(), ConfigurationError> {
        let reference = self.reference.as_ref()
            .ok_or(ConfigurationError::ReferencePoseNotSaved(self.model))?;
        let pivot = Vector::new(cm(0.0), cm(0.0), motion.pivot);
        let cells = translated(&reference.cells, pivot);
        let cells = rotated(&cells, motion.rotation);
        let cells = translated(&cells, motion.translation - pivot);
        let normals = reference.normals.as_deref().map(|n| rotated_normals(n, motion.rotation));
        self.cells = cells;
        self.normals = normals;
        Ok(())
    }

    /// Longitudinal extent: (most negative z, most positive z)
    pub fn z_extent(&self) -> (Length, Length) {
        let zs = self.cells.iter().map(|p| p.z);
        let lo = zs.clone().fold(cm(f32::INFINITY), |a, b| if b < a { b } else { a });
        let hi = zs        .fold(cm(f32::NEG_INFINITY), |a, b| if b > a { b } else { a });
        (lo, hi)
    }
}

// ----- Pure transformations of coordinate arrays -----------------------------------------
pub fn rotated(points: &[Point], rotation: Rotation) -> Vec<Point> {
    points.iter().map(|&p| rotation * p).collect()
}

pub fn rotated_normals(normals: &[RatioVec], rotation: Rotation) -> Vec<RatioVec> {
    normals.iter().map(|&n| rotation * n).collect()
}

pub fn translated(points: &[Point], offset: Vector) -> Vec<Point> {
    points.iter().map(|&p| p + offset).collect()
}

// ----- Builders --------------------------------------------------------------------------
struct Surface {
    cells: Vec<Point>,
    normals: Option<Vec<RatioVec>>,
    triangles: Vec<[usize; 3]>,
}

/// `n` evenly spaced values from `start` to `stop` inclusive
fn linspace(start: f32, stop: f32, n: usize) -> impl Iterator<Item = f32> + Clone {
    let step = if n > 1 { (stop - start) / (n - 1) as f32 } else { 0.0 };
    (0..n).map(move |i| start + step * i as f32)
}

/// Flat horizontal sheet at y = 0, head end at z = 0
fn plane(length: Length, width: Length, resolution: Resolution) -> Surface {
    let (l, w) = (cm_(length), cm_(width));
    let res = resolution.plane_cells_per_cm();
    let nx = (res * w) as usize + 1;
    let nz = (res * l) as usize;

    let cells = iproduct!(linspace(0.0, -l, nz), linspace(-w / 2.0, w / 2.0, nx))
        .map(|(z, x)| Point::cm(x, 0.0, z))
        .collect();

    // Each grid quad is split into two triangles
    let quads = || iproduct!(0..nx.saturating_sub(1), 0..nz.saturating_sub(1))
        .map(|(i, j)| j * nx + i);
    let triangles = quads().map(|c| [c, c + 1, c + nx])
        .chain(quads().map(|c| [c + nx + 1, c + nx, c + 1]))
        .collect();

    Surface { cells, normals: None, triangles }
}

/// Elliptic cylinder along z, with its top at y = 0 and head end at z = 0
fn cylinder(length: Length, a: Length, b: Length, resolution: Resolution) -> Surface {
    let (l, a, b) = (cm_(length), cm_(a), cm_(b));
    let step = resolution.cylinder_angular_step();
    let angles: Vec<f32> = (0..)
        .map(|i| i as f32 * step)
        .take_while(|&t| t < std::f32::consts::TAU)
        .collect();
    let per_cm = resolution.cylinder_rings_per_cm();
    // Rings run 2 cm past the nominal length
    let rings = (per_cm * (l + 2.0)) as usize;
    let nt = angles.len();

    let cells = iproduct!(0..rings, &angles)
        .map(|(ring, &t)| Point::cm(a * t.cos(), b * t.sin() - b, -(ring as f32) / per_cm))
        .collect();
    let normals = iproduct!(0..rings, &angles)
        .map(|(_, &t)| RatioVec::new(b * t.cos(), a * t.sin(), 0.0).normalize())
        .collect();

    // Two triangles per quad between neighbouring rings, closing each ring
    let triangles = iproduct!(0..rings.saturating_sub(1), 0..nt)
        .flat_map(|(ring, k)| {
            let (here, next) = (ring * nt + k, ring * nt + (k + 1) % nt);
            [[here, next, here + nt], [next, next + nt, here + nt]]
        })
        .collect();

    Surface { cells, normals: Some(normals), triangles }
}

/// One cell per vertex instance: shared vertices are not merged
fn human(mesh: Mesh) -> Surface {
    let cells = mesh.triangles.iter().flatten().copied().collect();
    let normals = mesh.normals.iter().flat_map(|&n| [n, n, n]).collect();
    let triangles = (0..mesh.triangles.len()).map(|t| [3*t, 3*t + 1, 3*t + 2]).collect();
    Surface { cells, normals: Some(normals), triangles }
}

/// Outline of the table top: a narrow head rest followed by the full-width
/// body section. Fractions of the width (x) and of the length (z, head end
/// at 0).
const SLAB_X: [f32; 8] = [ 0.5,  0.25, 0.25, -0.25, -0.25, -0.5, -0.5,  0.5];
const SLAB_Z: [f32; 8] = [-0.1, -0.1,  0.0,   0.0,  -0.1,  -0.1, -1.0, -1.0];

/// Faces of the slab, over the upper outline (0..8) and the lower one (8..16)
const SLAB_TRIANGLES: [[usize; 3]; 24] = [
    [0,  5,  6], [0,  6,  7], [1,  2,  3], [1,  3,  4], // upper face
    [8, 13, 14], [8, 14, 15], [9, 10, 11], [9, 11, 12], // lower face
    [0,  7,  8], [7, 15,  8], [0,  1,  8], [1,  9,  8], // sides
    [1,  2,  9], [2, 10,  9], [2,  3, 10], [3, 11, 10],
    [3,  4, 11], [4, 12, 11], [4,  5, 12], [5, 13, 12],
    [5,  6, 13], [6, 14, 13], [6,  7, 14], [7, 15, 14],
];

/// 16-vertex slab: the outline at y = 0 followed by the same outline at
/// y = `thickness` (negative thickness extends upwards)
fn slab(length: Length, width: Length, thickness: Length) -> Surface {
    let (l, w, t) = (cm_(length), cm_(width), cm_(thickness));
    let cells = [0.0, t].iter()
        .flat_map(|&y| SLAB_X.iter().zip(&SLAB_Z).map(move |(&x, &z)| Point::cm(w * x, y, l * z)))
        .collect();
    Surface { cells, normals: None, triangles: SLAB_TRIANGLES.to_vec() }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use units::{deg, ratio_};

    /// Loader for tests which never need a human mesh
    pub(crate) struct NoMeshes;
    impl MeshLoader for NoMeshes {
        fn load(&self, id: &str) -> Result<Mesh, ConfigurationError> {
            panic!("unexpected request for mesh {id}")
        }
    }

    struct OneTriangle;
    impl MeshLoader for OneTriangle {
        fn load(&self, _: &str) -> Result<Mesh, ConfigurationError> {
            Ok(Mesh {
                triangles: vec![[Point::cm(0.0, 0.0, 0.0), Point::cm(1.0, 0.0, 0.0), Point::cm(0.0, 0.0, 1.0)],
                                [Point::cm(0.0, 1.0, 0.0), Point::cm(1.0, 1.0, 0.0), Point::cm(0.0, 1.0, 1.0)]],
                normals: vec![RatioVec::new(0.0, -1.0, 0.0), RatioVec::new(0.0, 1.0, 0.0)],
            })
        }
    }

    pub(crate) fn build(model: PhantomModel) -> Phantom {
        Phantom::new(model, &PhantomDimensions::standard(), None, &NoMeshes).unwrap()
    }

    fn coords(phantom: &Phantom) -> Vec<[f32; 3]> {
        phantom.cells().iter().map(|p| [cm_(p.x), cm_(p.y), cm_(p.z)]).collect()
    }

    #[rstest(/**/ text      , expected,
             case("plane"   , PhantomModel::Plane   ),
             case("Cylinder", PhantomModel::Cylinder),
             case("HUMAN"   , PhantomModel::Human   ),
             case("table"   , PhantomModel::Table   ),
             case("pad"     , PhantomModel::Pad     ),
    )]
    fn parse_model(text: &str, expected: PhantomModel) {
        assert_eq!(text.parse::<PhantomModel>().unwrap(), expected);
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = "sphere".parse::<PhantomModel>().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownPhantomModel(m) if m == "sphere"));
    }

    #[test]
    fn human_without_mesh_is_rejected() {
        let err = Phantom::new(PhantomModel::Human, &PhantomDimensions::standard(), None, &NoMeshes).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingHumanMesh));
    }

    #[rstest(/**/ model                 , missing,
             case(PhantomModel::Plane   , "plane_length"     ),
             case(PhantomModel::Cylinder, "cylinder_radius_b"),
             case(PhantomModel::Table   , "table_thickness"  ),
             case(PhantomModel::Pad     , "pad_width"        ),
    )]
    fn missing_dimension_is_reported(model: PhantomModel, missing: &str) {
        let mut dims = PhantomDimensions::standard();
        match missing {
            "plane_length"      => dims.plane_length      = None,
            "cylinder_radius_b" => dims.cylinder_radius_b = None,
            "table_thickness"   => dims.table_thickness   = None,
            "pad_width"         => dims.pad_width         = None,
            _ => unreachable!(),
        }
        let err = Phantom::new(model, &dims, None, &NoMeshes).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingDimension { field, .. } if field == missing));
    }

    #[test]
    fn sparse_plane_grid() {
        let plane = build(PhantomModel::Plane);
        // 41 lateral samples by 120 longitudinal ones
        assert_eq!(plane.len(), 41 * 120);
        assert!(plane.normals().is_none());
        assert_eq!(plane.triangles().len(), 2 * 40 * 119);
        let c = coords(&plane);
        assert_float_eq!(c[0],  [-20.0, 0.0, 0.0], abs_all <= 1e-5);
        assert_float_eq!(c[40], [ 20.0, 0.0, 0.0], abs_all <= 1e-5);
        assert_float_eq!(c[41 * 120 - 1], [20.0, 0.0, -120.0], abs_all <= 1e-4);
        assert!(plane.triangles().iter().flatten().all(|&i| i < plane.len()));
    }

    #[test]
    fn dense_plane_doubles_sampling() {
        let mut dims = PhantomDimensions::standard();
        dims.plane_resolution = Some(Resolution::Dense);
        let plane = Phantom::new(PhantomModel::Plane, &dims, None, &NoMeshes).unwrap();
        assert_eq!(plane.len(), 81 * 240);
    }

    #[test]
    fn cylinder_surface_and_normals() {
        let cylinder = build(PhantomModel::Cylinder);
        let normals = cylinder.normals().unwrap();
        // 63 angular samples, 152 rings
        assert_eq!(cylinder.len(), 63 * 152);
        assert_eq!(normals.len(), cylinder.len());
        let (a, b) = (20.0, 10.0);
        for (p, n) in cylinder.cells().iter().zip(normals) {
            let (x, y) = (cm_(p.x), cm_(p.y) + b);
            // On the ellipse
            assert_float_eq!((x / a).powi(2) + (y / b).powi(2), 1.0, abs <= 1e-4);
            // Unit length, outwards, no axial component
            assert_float_eq!(ratio_(n.norm()), 1.0, abs <= 1e-5);
            assert!(ratio_(n.x) * x + ratio_(n.y) * y > 0.0);
            assert_eq!(ratio_(n.z), 0.0);
        }
        assert!(cylinder.triangles().iter().flatten().all(|&i| i < cylinder.len()));
    }

    #[test]
    fn cylinder_surface_is_closed_around_each_ring() {
        let cylinder = build(PhantomModel::Cylinder);
        let nt = 63;
        assert_eq!(cylinder.triangles().len(), 2 * nt * 151);
        // Every triangle joins neighbouring angles on neighbouring rings,
        // including across the seam between the last angle and the first
        let mut seam = 0;
        for t in cylinder.triangles() {
            let rings: Vec<_> = t.iter().map(|&i| i / nt).collect();
            let angles: Vec<_> = t.iter().map(|&i| i % nt).collect();
            let ring_span = rings.iter().max().unwrap() - rings.iter().min().unwrap();
            assert!(ring_span == 1, "{t:?}");
            for a in &angles {
                for b in &angles {
                    let d = (a + nt - b) % nt;
                    assert!(d <= 1 || d == nt - 1, "{t:?}");
                }
            }
            if angles.contains(&0) && angles.contains(&(nt - 1)) { seam += 1 }
        }
        assert_eq!(seam, 2 * 151);
    }

    #[test]
    fn cylinder_normal_at_zero_angle_is_lateral() {
        let cylinder = build(PhantomModel::Cylinder);
        // t = 0 lies at (a, -b): the normal is lateral
        assert_float_eq!(cylinder.normals().unwrap()[0].as_f32(), [1.0, 0.0, 0.0], abs_all <= 1e-6);
    }

    #[test]
    fn human_cells_are_vertex_instances() {
        let human = Phantom::new(PhantomModel::Human, &PhantomDimensions::default(), Some("two"), &OneTriangle).unwrap();
        assert_eq!(human.len(), 6);
        assert_eq!(human.triangles(), &[[0, 1, 2], [3, 4, 5]]);
        let normals = human.normals().unwrap();
        assert_eq!(normals.len(), 6);
        assert_eq!(normals[2], RatioVec::new(0.0, -1.0, 0.0));
        assert_eq!(normals[3], RatioVec::new(0.0,  1.0, 0.0));
    }

    #[test]
    fn table_and_pad_slabs() {
        let table = build(PhantomModel::Table);
        let pad   = build(PhantomModel::Pad);
        assert_eq!(table.len(), 16);
        assert_eq!(pad  .len(), 16);
        assert_eq!(table.triangles().len(), 24);
        assert!(table.normals().is_none());
        assert!(table.triangles().iter().flatten().all(|&i| i < 16));
        let t = coords(&table);
        // Head rest, half as wide as the rest of the table
        assert_float_eq!(t[ 2], [ 11.25, 0.0,    0.0 ], abs_all <= 1e-4);
        assert_float_eq!(t[ 3], [-11.25, 0.0,    0.0 ], abs_all <= 1e-4);
        assert_float_eq!(t[ 0], [ 22.5 , 0.0,  -28.15], abs_all <= 1e-4);
        assert_float_eq!(t[14], [-22.5 , 5.0, -281.5 ], abs_all <= 1e-4);
        let p = coords(&pad);
        assert_float_eq!(p[15], [ 22.5, -4.0, -281.5], abs_all <= 1e-4);
        // The lower outline repeats the upper one
        for (upper, lower) in t[..8].iter().zip(&t[8..]) {
            assert_float_eq!([upper[0], upper[2]], [lower[0], lower[2]], abs_all <= 1e-6);
        }
    }

    #[test]
    fn position_requires_reference_pose() {
        let mut table = build(PhantomModel::Table);
        let motion = TableMotion { pivot: cm(0.0), rotation: Rotation::identity(), translation: Vector::zero() };
        assert!(matches!(table.position(&motion), Err(ConfigurationError::ReferencePoseNotSaved(PhantomModel::Table))));
    }

    #[test]
    fn rotate_and_translate() {
        let mut table = build(PhantomModel::Table);
        table.rotate([deg(0.0), deg(180.0), deg(0.0)]);
        table.translate(Vector::cm(1.0, 2.0, 3.0));
        let t = coords(&table);
        // (22.5, 0, -281.5) -> (-22.5, 0, 281.5) -> shifted
        assert_float_eq!(t[7], [-21.5, 2.0, 284.5], abs_all <= 1e-3);
    }

    #[test]
    fn rotation_carries_normals_translation_does_not() {
        let mut cylinder = build(PhantomModel::Cylinder);
        cylinder.translate(Vector::cm(5.0, 5.0, 5.0));
        assert_float_eq!(cylinder.normals().unwrap()[0].as_f32(), [1.0, 0.0, 0.0], abs_all <= 1e-6);
        cylinder.rotate([deg(0.0), deg(0.0), deg(90.0)]);
        assert_float_eq!(cylinder.normals().unwrap()[0].as_f32(), [0.0, 1.0, 0.0], abs_all <= 1e-6);
    }

    #[test]
    fn position_with_half_turn_about_pivot() {
        let mut table = build(PhantomModel::Table);
        table.save_reference_pose();
        let motion = TableMotion {
            pivot: cm(281.5 / 2.0),
            rotation: Rotation::about_y(deg(180.0)),
            translation: Vector::cm(0.0, 0.0, 0.0),
        };
        table.position(&motion).unwrap();
        // Rotating about the table centre swaps its head and feet ends
        let t = coords(&table);
        assert_float_eq!(t[7], [-22.5 , 0.0,    0.0], abs_all <= 1e-3);
        assert_float_eq!(t[2], [-11.25, 0.0, -281.5], abs_all <= 1e-3);
    }

    fn motion(angles: [f32; 3], shift: [f32; 3]) -> TableMotion {
        TableMotion {
            pivot: cm(140.75),
            rotation: Rotation::xyz(deg(angles[0]), deg(angles[1]), deg(angles[2])),
            translation: Vector::cm(shift[0], shift[1], shift[2]),
        }
    }

    proptest! {
        #[test]
        fn repositioning_is_idempotent(
            a in prop::array::uniform3(-30.0f32..30.0), sa in prop::array::uniform3(-50.0f32..50.0),
            b in prop::array::uniform3(-30.0f32..30.0), sb in prop::array::uniform3(-50.0f32..50.0),
        ) {
            let mut phantom = build(PhantomModel::Cylinder);
            phantom.save_reference_pose();
            let mut direct = phantom.clone();
            direct.position(&motion(a, sa)).unwrap();

            phantom.position(&motion(a, sa)).unwrap();
            phantom.position(&motion(b, sb)).unwrap();
            phantom.position(&motion(a, sa)).unwrap();

            prop_assert_eq!(phantom.cells(), direct.cells());
            prop_assert_eq!(phantom.normals(), direct.normals());
        }
    }
}
