#![allow(dead_code)]

pub use idefix::testing::{DumpWriter, VtkWriter};

use std::path::{Path, PathBuf};

/// a 2D cartesian 8 x 4 x 1 dump with density, two velocities and a face centred field
pub fn cartesian_dump(header: &str) -> Vec<u8> {
    let n = 8 * 4;
    let rho: Vec<f64> = (0..n).map(|i| 1.0 + i as f64).collect();
    let vx1: Vec<f64> = (0..n).map(|i| (i % 8) as f64).collect();
    let vx2: Vec<f64> = (0..n).map(|i| (i / 8) as f64).collect();
    let bx1: Vec<f64> = (0..9 * 4).map(|i| 0.1 * i as f64).collect();

    DumpWriter::new(header)
        .axis(1, 0.0, 2.0, 8)
        .axis(2, -1.0, 1.0, 4)
        .axis(3, 0.0, 1.0, 1)
        .doubles("time", &[1], &[0.75])
        .ints("geometry", &[1], &[1])
        .ints("periodicity", &[3], &[1, 1, 1])
        .doubles("Vc-RHO", &[8, 4, 1], &rho)
        .doubles("Vc-VX1", &[8, 4, 1], &vx1)
        .doubles("Vc-VX2", &[8, 4, 1], &vx2)
        .doubles("Vs-BX1s", &[9, 4, 1], &bx1)
        .finish()
}

/// a rectilinear 3 x 2 x 2 vtk file with density and pressure
pub fn rectilinear_vtk(header: &str) -> Vec<u8> {
    let rho: Vec<f32> = (0..12).map(|i| i as f32).collect();
    let prs: Vec<f32> = (0..12).map(|i| 100.0 + i as f32).collect();

    VtkWriter::new(header, "RECTILINEAR_GRID")
        .line("FIELD FieldData 3")
        .line("TIME 1 1 double")
        .doubles(&[12.5])
        .line("GEOMETRY 1 1 int")
        .ints(&[1])
        .line("PERIODICITY 3 1 int")
        .ints(&[0, 0, 1])
        .line("DIMENSIONS 4 3 3")
        .line("X_COORDINATES 4 float")
        .floats(&[0.0, 1.0, 2.0, 3.0])
        .line("Y_COORDINATES 3 float")
        .floats(&[0.0, 0.5, 1.0])
        .line("Z_COORDINATES 3 float")
        .floats(&[-2.0, 0.0, 2.0])
        .line("CELL_DATA 12")
        .scalars("RHO", &rho)
        .scalars("PRS", &prs)
        .finish()
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
