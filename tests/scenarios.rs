use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use whitebox_raster::{
    CancelFlag, DataType, Error, FileAccess, RasterConfig, RasterHeader, WhiteboxRaster,
};

const NO_DATA: f64 = -32768.0;

fn write_grid(path: &Path, rows: usize, cols: usize, data_type: DataType) {
    let mut raster =
        WhiteboxRaster::create(path, RasterHeader::new(rows, cols, data_type), NO_DATA).unwrap();
    for row in 0..rows {
        for col in 0..cols {
            raster.set_value(row as isize, col as isize, (row * cols + col) as f64);
        }
    }
    raster.close().unwrap();
}

#[test]
fn test_float_grid_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.dep");
    write_grid(&path, 3, 3, DataType::Float);

    let mut raster = WhiteboxRaster::open(&path, FileAccess::Read).unwrap();
    assert_eq!(raster.get_value(1, 1), 4.0);
    assert_eq!(raster.get_value(5, 5), NO_DATA);
    assert_eq!(raster.header().minimum, 0.0);
    assert_eq!(raster.header().maximum, 8.0);
    assert_eq!(fs::metadata(dir.path().join("grid.tas")).unwrap().len(), 36);
    raster.close().unwrap();
}

#[test]
fn test_template_raster_materialized_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.dep");
    let output = dir.path().join("out.dep");
    write_grid(&template, 4, 4, DataType::Double);

    let raster = WhiteboxRaster::create_from_template(
        &output,
        FileAccess::ReadWrite,
        &template,
        DataType::Integer,
        0.0,
    )
    .unwrap();
    raster.close().unwrap();

    assert_eq!(fs::metadata(dir.path().join("out.tas")).unwrap().len(), 32);

    let mut raster = WhiteboxRaster::open(&output, FileAccess::Read).unwrap();
    assert_eq!(raster.data_type(), DataType::Integer);
    for row in 0..4 {
        assert_eq!(raster.get_row_values(row), vec![0.0; 4]);
    }
    assert_eq!(raster.header().minimum, 0.0);
    assert_eq!(raster.header().maximum, 0.0);
    raster.close().unwrap();
}

#[test]
fn test_only_dirty_rows_are_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.dep");
    let data_path = dir.path().join("grid.tas");
    write_grid(&path, 6, 5, DataType::Integer);
    let before = fs::read(&data_path).unwrap();

    let mut raster = WhiteboxRaster::open(&path, FileAccess::ReadWrite).unwrap();
    for row in 0..6 {
        raster.get_value(row, 0);
    }
    raster.set_value(1, 2, 100.0);
    raster.set_value(4, 0, 200.0);
    raster.close().unwrap();
    let after = fs::read(&data_path).unwrap();

    let row_bytes = 5 * 2;
    for row in 0..6 {
        let range = row * row_bytes..(row + 1) * row_bytes;
        let changed = before[range.clone()] != after[range];
        assert_eq!(changed, row == 1 || row == 4, "row {}", row);
    }
}

#[test]
fn test_eviction_with_small_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.dep");
    write_grid(&path, 8, 4, DataType::Double);

    let config = RasterConfig {
        buffer_size_bytes: 3 * 4 * 8,
        ..RasterConfig::default()
    };
    let mut raster =
        WhiteboxRaster::open_with_config(&path, FileAccess::ReadWrite, config).unwrap();
    assert_eq!(raster.block_size(), 3);

    raster.set_value(0, 0, -1.0);
    raster.get_value(1, 0);
    raster.get_value(2, 0);
    assert_eq!(raster.cache_stats().evictions, 0);
    raster.get_value(3, 0);
    assert_eq!(raster.cache_stats().evictions, 1);
    assert_eq!(raster.cache_stats().row_count, 3);

    assert_eq!(raster.get_value(0, 0), -1.0);
    raster.close().unwrap();
}

#[test]
fn test_stats_file_is_written_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.dep");
    let stats_path = dir.path().join("grid.wstat");
    write_grid(&path, 3, 3, DataType::Float);

    let raster = WhiteboxRaster::open(&path, FileAccess::Read).unwrap();
    raster.close().unwrap();
    assert!(!stats_path.exists());

    let mut raster = WhiteboxRaster::open(&path, FileAccess::Read).unwrap();
    assert_relative_eq!(raster.mean().unwrap(), 4.0);
    assert_eq!(raster.num_valid_cells().unwrap(), 9);
    assert_relative_eq!(raster.std_dev().unwrap(), (60.0f64 / 9.0).sqrt(), epsilon = 1e-12);
    raster.close().unwrap();
    assert!(stats_path.exists());
}

#[test]
fn test_temporary_raster_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let config = RasterConfig {
        temporary: true,
        ..RasterConfig::default()
    };
    let mut raster = WhiteboxRaster::create_with_config(
        dir.path().join("scratch.dep"),
        RasterHeader::new(2, 2, DataType::Float),
        0.0,
        config,
    )
    .unwrap();
    raster.set_value(0, 0, 1.0);
    raster.close().unwrap();

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_cancelled_close_keeps_running_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.dep");
    write_grid(&path, 3, 3, DataType::Double);

    let mut raster = WhiteboxRaster::open(&path, FileAccess::ReadWrite).unwrap();
    raster.set_value(0, 0, 50.0);
    let cancel = CancelFlag::new();
    raster.set_cancel_flag(cancel.clone());
    cancel.cancel();

    assert!(matches!(raster.close(), Err(Error::Cancelled)));

    let mut raster = WhiteboxRaster::open(&path, FileAccess::Read).unwrap();
    assert_eq!(raster.get_value(0, 0), 50.0);
    assert_eq!(raster.header().minimum, 0.0);
    assert_eq!(raster.header().maximum, 50.0);
    raster.close().unwrap();
}
