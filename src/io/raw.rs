//! Read / write float arrays as raw little-endian binary

use std::fs::File;
use std::io::{Write, Read, BufWriter, BufReader};
use std::path::Path;

use ndarray::Array1;

use geometry::Point;
use units::todo::Dosef32;

pub fn write(data: impl Iterator<Item = f32>, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(&datum.to_le_bytes())?;
    }
    buf.flush()
}

type IORes<T> = std::io::Result<T>;
pub fn read<'a>(path: &Path) -> IORes<impl Iterator<Item = IORes<f32>> + 'a> {
    let file = File::open(path)?;
    let mut buf = BufReader::new(file);
    let mut buffer = [0; 4];

    Ok(std::iter::from_fn(move || {
        use std::io::ErrorKind::UnexpectedEof;
        match buf.read_exact(&mut buffer) {
            Ok(()) => Some(Ok(f32::from_le_bytes(buffer))),
            Err(e) if e.kind() == UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }))
}

/// One value per patient cell, in cell order
pub fn write_dose_map(dose_map: &Array1<Dosef32>, path: &Path) -> IORes<()> {
    write(dose_map.iter().copied(), path)
}

pub fn read_dose_map(path: &Path) -> IORes<Array1<Dosef32>> {
    Ok(Array1::from(read(path)?.collect::<IORes<Vec<_>>>()?))
}

/// x, y, z (cm) of each point in turn
pub fn write_points(points: &[Point], path: &Path) -> IORes<()> {
    write(points.iter().flat_map(|p| p.as_vector().as_cm()), path)
}
