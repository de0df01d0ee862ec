//! Triangulated meshes for the human phantom, read from binary STL files.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::PathBuf;

use binrw::{BinRead, BinReaderExt};

use geometry::{Point, RatioVec};

use crate::error::ConfigurationError;

/// Per-triangle vertex positions and normals
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<[Point; 3]>,
    pub normals: Vec<RatioVec>,
}

/// Source of human phantom meshes, by identifier
pub trait MeshLoader {
    fn load(&self, id: &str) -> Result<Mesh, ConfigurationError>;
}

/// Meshes stored as `<directory>/<id>.stl`, with coordinates in cm
#[derive(Clone, Debug)]
pub struct StlDirectory {
    pub directory: PathBuf,
}

impl StlDirectory {
    pub fn new(directory: impl Into<PathBuf>) -> Self { Self { directory: directory.into() } }
}

impl MeshLoader for StlDirectory {
    fn load(&self, id: &str) -> Result<Mesh, ConfigurationError> {
        let path = self.directory.join(format!("{id}.stl"));
        let file = File::open(&path)
            .map_err(|source| ConfigurationError::Io { path: path.clone(), source })?;
        read_stl(&mut BufReader::new(file))
            .map_err(|source| ConfigurationError::Mesh { path, source })
    }
}

pub fn read_stl<R: Read + Seek>(reader: &mut R) -> binrw::BinResult<Mesh> {
    let stl: Stl = reader.read_le()?;
    let (triangles, normals) = stl.facets.into_iter()
        .map(|Facet { normal, vertices }| (vertices, normal))
        .unzip();
    Ok(Mesh { triangles, normals })
}

// ----- Binary STL layout ----------------------------------------------------------------
#[derive(BinRead, Debug)]
#[br(little)]
struct Stl {
    #[br(pad_before = 80)]
    count: u32,
    #[br(count = count)]
    facets: Vec<Facet>,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct Facet {
    #[br(map = |[x, y, z]: [f32; 3]| RatioVec::new(x, y, z))]
    normal: RatioVec,
    #[br(map = |v: [[f32; 3]; 3]| v.map(|[x, y, z]| Point::cm(x, y, z)))]
    #[br(pad_after = 2)] // attribute byte count
    vertices: [Point; 3],
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use float_eq::assert_float_eq;
    use units::cm_;

    /// Binary STL image of the given facets: (normal, three vertices)
    pub(crate) fn stl_bytes(facets: &[([f32; 3], [[f32; 3]; 3])]) -> Vec<u8> {
        let mut bytes = vec![0u8; 80];
        bytes.extend((facets.len() as u32).to_le_bytes());
        for (normal, vertices) in facets {
            for x in normal.iter().chain(vertices.iter().flatten()) {
                bytes.extend(x.to_le_bytes());
            }
            bytes.extend(0u16.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn read_two_facets() {
        let bytes = stl_bytes(&[
            ([0.0, 0.0, 1.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            ([0.0, -1.0, 0.0], [[2.0, 3.0, 4.0], [5.0, 6.0, 7.0], [8.0, 9.0, 10.0]]),
        ]);
        let mesh = read_stl(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(mesh.triangles.len(), 2);
        assert_eq!(mesh.normals.len(), 2);
        assert_float_eq!(mesh.normals[1].as_f32(), [0.0, -1.0, 0.0], abs_all <= 1e-6);
        let [a, b, c] = mesh.triangles[1];
        assert_float_eq!([cm_(a.x), cm_(b.y), cm_(c.z)], [2.0, 6.0, 10.0], r2nd_all <= 1e-6);
    }

    #[test]
    fn truncated_file_is_an_error() {
        let mut bytes = stl_bytes(&[([0.0, 0.0, 1.0], [[0.0; 3]; 3])]);
        bytes.truncate(bytes.len() - 10);
        assert!(read_stl(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn missing_mesh_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = StlDirectory::new(dir.path());
        assert!(matches!(loader.load("nobody"), Err(ConfigurationError::Io { .. })));
    }
}
