mod common;

use idefix::prelude::*;
use idefix::{DatasetConfig, Error, Geometry, IdefixVersion};

use common::{cartesian_dump, write, DumpWriter};

#[test]
fn load_and_read_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "dump.0042.dmp", &cartesian_dump("Idefix v1.1.0 Dump Data"));

    assert!(IdefixDataset::is_valid(&path));
    assert_eq!(FileFormat::detect(&path), Some(FileFormat::Dmp));

    let ds = IdefixDataset::load(&path, DatasetConfig::default()).unwrap();
    assert_eq!(ds.version(), &IdefixVersion::Known("v1.1.0".into()));
    assert_eq!(ds.domain_dimensions(), [8, 4, 1]);
    assert_eq!(ds.dimensionality(), 2);
    assert_eq!(ds.domain_left_edge(), [0.0, -1.0, 0.0]);
    assert_eq!(ds.domain_right_edge(), [2.0, 1.0, 1.0]);
    assert_eq!(ds.periodicity(), [true; 3]);
    assert_eq!(ds.geometry(), Geometry::Cartesian);
    assert_eq!(ds.current_time(), 0.75);

    let index = ds.index().unwrap();
    let grid = &index.grids()[0];
    assert_eq!(grid.to_string(), "IdefixGrid_0000 ([8, 4, 1])");
    assert_eq!(grid.dx, [0.25, 0.5, 1.0]);

    let io = IoHandler::new(&index);
    let vx1 = io.read_grid_field(grid, "Vc-VX1").unwrap();
    let vx2 = io.read_grid_field(grid, "Vc-VX2").unwrap();
    for i in 0..8 {
        for j in 0..4 {
            assert_eq!(vx1[[i, j, 0]], i as f64);
            assert_eq!(vx2[[i, j, 0]], j as f64);
        }
    }
}

#[test]
fn selection_matches_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "dump.0000.dmp", &cartesian_dump("Idefix v1.1.0 Dump Data"));

    let ds = IdefixDataset::load(&path, DatasetConfig::default()).unwrap();
    let index = ds.index().unwrap();
    let io = IoHandler::new(&index);

    let fields: Vec<_> = index.field_list().to_vec();
    assert_eq!(fields.len(), 4);

    let data = io.read_fluid_selection(&fields).unwrap();
    let rho = &data[&("idefix".to_string(), "Vc-RHO".to_string())];
    assert_eq!(rho.len(), 32);
    assert_eq!(rho[0], 1.0);
    assert_eq!(rho[31], 32.0);

    let bx1 = &data[&("idefix".to_string(), "Vs-BX1s".to_string())];
    assert_eq!(bx1.len(), 36);
}

#[test]
fn single_precision_dump() {
    let dir = tempfile::tempdir().unwrap();
    let rho: Vec<f32> = (0..4).map(|i| i as f32 + 0.5).collect();
    let bytes = DumpWriter::new("idefix 2.1.02 dump")
        .axis(1, 0.0, 1.0, 4)
        .axis(2, 0.0, 1.0, 1)
        .axis(3, 0.0, 1.0, 1)
        .doubles("time", &[1], &[0.0])
        .ints("geometry", &[1], &[2])
        .ints("periodicity", &[3], &[0, 0, 0])
        .singles("Vc-RHO", &[4, 1, 1], &rho)
        .finish();
    let path = write(dir.path(), "dump.0001.dmp", &bytes);

    let ds = IdefixDataset::load(&path, DatasetConfig::default()).unwrap();
    assert_eq!(ds.version().to_string(), "2.1.02");
    assert_eq!(ds.geometry().to_string(), "cylindrical");
    assert_eq!(ds.dimensionality(), 1);

    let index = ds.index().unwrap();
    let io = IoHandler::new(&index);
    let field = io.read_grid_field_native(&index.grids()[0], "Vc-RHO").unwrap();
    assert_eq!(field.dtype(), idefix::DataType::Single);
    assert_eq!(field.into_f64()[[3, 0, 0]], 3.5);
}

#[test]
fn detection_never_fails() {
    let dir = tempfile::tempdir().unwrap();

    let empty = write(dir.path(), "dump.0001.dmp", &[]);
    assert!(!IdefixDataset::is_valid(&empty));

    let wrong_name = write(dir.path(), "dump_0001.dmp", &cartesian_dump("Idefix v1.1.0"));
    assert!(!IdefixDataset::is_valid(&wrong_name));

    let not_idefix = write(dir.path(), "dump.0002.dmp", &cartesian_dump("PLUTO 4.4"));
    assert!(!IdefixDataset::is_valid(&not_idefix));

    assert!(!IdefixDataset::is_valid(dir.path().join("does-not-exist")));
}

#[test]
fn inifile_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "dump.0003.dmp", &cartesian_dump("Idefix v1.1.0 Dump Data"));
    let ini = write(
        dir.path(),
        "idefix.ini",
        b"[Grid]\nX1-grid 2 0.0 4 u 1.0 4 u 2.0\nX2-grid 1 -1.0 4 l 1.0\nX3-grid 1 0.0 1 u 1.0\n",
    );

    let ds = IdefixDataset::load(&path, DatasetConfig::new().with_inifile(&ini)).unwrap();
    let warnings = ds.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("- found multiple blocks in direction X1-grid"));
    assert!(warnings[0].contains("- found non-uniform block(s) in direction X2-grid"));
    assert!(!warnings[0].contains("direction X3-grid"));
}

#[test]
fn malformed_inifile_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "dump.0004.dmp", &cartesian_dump("Idefix v1.1.0 Dump Data"));
    let ini = write(dir.path(), "idefix.ini", b"[Hydro]\nsolver hllc\n");

    let err = IdefixDataset::load(&path, DatasetConfig::new().with_inifile(&ini)).unwrap_err();
    assert!(matches!(err, Error::Inifile(idefix::InifileError::MissingGridSection)));
}

#[test]
fn mismatched_cell_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = DumpWriter::new("Idefix v1.1.0 Dump Data")
        .axis(1, 0.0, 1.0, 8)
        .axis(2, 0.0, 1.0, 4)
        .axis(3, 0.0, 1.0, 1)
        .doubles("time", &[1], &[0.0])
        .ints("geometry", &[1], &[1])
        .ints("periodicity", &[3], &[0, 0, 0])
        .doubles("Vc-RHO", &[8, 4, 1], &[1.0; 32])
        .doubles("Vc-VX1", &[4, 4, 1], &[1.0; 16])
        .finish();
    let path = write(dir.path(), "dump.0006.dmp", &bytes);

    let err = IdefixDataset::load(&path, DatasetConfig::default()).unwrap_err();
    assert!(matches!(err, Error::FieldShape { ref field, .. } if field == "Vc-VX1"));
    assert_eq!(
        err.to_string(),
        "field `Vc-VX1` has shape [4, 4, 1] but the domain has [8, 4, 1] cells"
    );
}

#[test]
fn corrupt_shape_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = DumpWriter::new("Idefix v1.1.0 Dump Data")
        .raw_record("Vc-RHO", 0, &[i32::MAX; 3])
        .finish();
    let path = write(dir.path(), "dump.0007.dmp", &bytes);

    let err = IdefixDataset::load(&path, DatasetConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn particles_are_not_supported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "dump.0005.dmp", &cartesian_dump("Idefix v1.1.0 Dump Data"));

    let ds = IdefixDataset::load(&path, DatasetConfig::default()).unwrap();
    let index = ds.index().unwrap();
    let io = IoHandler::new(&index);

    let err = io.read_particle_coords(&["all"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Particles are not currently supported for Idefix"
    );
}
