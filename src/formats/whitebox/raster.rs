//! Paged read/write access to a Whitebox raster
//!
//! A [`WhiteboxRaster`] owns the header, an LRU cache of decoded rows and the
//! data file handle. Cell reads fault whole rows into the cache; writes mutate
//! the cached row and mark it dirty, and dirty rows reach the disk when they
//! are evicted or when the raster is closed.
//!
//! Instances are not synchronized. A raster shared between threads must be
//! guarded by the caller.

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

use crate::cache::{CacheStats, RowCache};
use crate::cancel::CancelFlag;
use crate::config::RasterConfig;
use crate::error::{Error, Result};
use crate::formats::whitebox::header::RasterHeader;
use crate::formats::whitebox::paths::SidecarPaths;
use crate::formats::whitebox::stats::{Histogram, HistogramAccumulator, RangeAccumulator, RasterStats};
use crate::io::RowLayout;
use crate::types::{DataScale, DataType, FileAccess};

type ProgressCallback = Box<dyn FnMut(f64) + Send>;

/// A raster stored as header, data and statistics sidecars
pub struct WhiteboxRaster {
    paths: SidecarPaths,
    header: RasterHeader,
    access: FileAccess,
    config: RasterConfig,
    layout: RowLayout,
    cache: RowCache,
    data: Option<File>,
    initial_value: f64,
    dirty: bool,
    header_dirty: bool,
    created: bool,
    stats: Option<RasterStats>,
    stats_stale: bool,
    cancel: Option<CancelFlag>,
    progress: Option<ProgressCallback>,
    reads: u64,
    writes: u64,
    write_failure: Option<String>,
    closed: bool,
}

impl WhiteboxRaster {
    /// Opens an existing raster with the default configuration
    pub fn open<P: AsRef<Path>>(header_path: P, access: FileAccess) -> Result<Self> {
        Self::open_with_config(header_path, access, RasterConfig::default())
    }

    /// Opens an existing raster
    ///
    /// Fails with [`Error::CorruptHeader`] if the header lacks geometry and
    /// with [`Error::CorruptData`] if an existing data file has the wrong
    /// length. A missing data file is not an error; it is created, filled
    /// with nodata, on first access.
    pub fn open_with_config<P: AsRef<Path>>(
        header_path: P,
        access: FileAccess,
        config: RasterConfig,
    ) -> Result<Self> {
        let paths = SidecarPaths::from_header(header_path);
        let header = RasterHeader::read(&paths.header)?;

        if let Ok(meta) = paths.data.metadata() {
            let expected = header.data_file_len();
            if meta.len() != expected {
                return Err(Error::CorruptData {
                    expected,
                    actual: meta.len(),
                });
            }
        }

        let initial_value = header.no_data;
        Ok(Self::assemble(paths, header, access, config, initial_value, false))
    }

    /// Creates a raster aligned with `template_path`, with the default configuration
    pub fn create_from_template<P: AsRef<Path>, T: AsRef<Path>>(
        header_path: P,
        access: FileAccess,
        template_path: T,
        data_type: DataType,
        initial_value: f64,
    ) -> Result<Self> {
        Self::create_from_template_with_config(
            header_path,
            access,
            template_path,
            data_type,
            initial_value,
            RasterConfig::default(),
        )
    }

    /// Creates a raster aligned with another raster's header
    ///
    /// Existing sidecars at `header_path` are deleted. Extent, shape, scale,
    /// nodata and georeferencing come from the template; the data file is
    /// written, filled with `initial_value`, on first row access or on close.
    pub fn create_from_template_with_config<P: AsRef<Path>, T: AsRef<Path>>(
        header_path: P,
        access: FileAccess,
        template_path: T,
        data_type: DataType,
        initial_value: f64,
        config: RasterConfig,
    ) -> Result<Self> {
        let template = RasterHeader::read(template_path)?;
        let header = RasterHeader::from_template(&template, data_type);
        Self::create_fresh(header_path, header, access, initial_value, config)
    }

    /// Creates a read-write raster described by `header`, with the default configuration
    pub fn create<P: AsRef<Path>>(
        header_path: P,
        header: RasterHeader,
        initial_value: f64,
    ) -> Result<Self> {
        Self::create_with_config(header_path, header, initial_value, RasterConfig::default())
    }

    /// Creates a read-write raster described by `header`
    pub fn create_with_config<P: AsRef<Path>>(
        header_path: P,
        header: RasterHeader,
        initial_value: f64,
        config: RasterConfig,
    ) -> Result<Self> {
        if header.rows == 0 || header.columns == 0 {
            return Err(Error::CorruptHeader(format!(
                "raster must have at least one row and column, got {}x{}",
                header.rows, header.columns
            )));
        }
        Self::create_fresh(header_path, header, FileAccess::ReadWrite, initial_value, config)
    }

    fn create_fresh<P: AsRef<Path>>(
        header_path: P,
        header: RasterHeader,
        access: FileAccess,
        initial_value: f64,
        config: RasterConfig,
    ) -> Result<Self> {
        let paths = SidecarPaths::from_header(header_path);
        paths.remove_all()?;
        header.write(&paths.header)?;
        Ok(Self::assemble(paths, header, access, config, initial_value, true))
    }

    fn assemble(
        paths: SidecarPaths,
        header: RasterHeader,
        access: FileAccess,
        config: RasterConfig,
        initial_value: f64,
        created: bool,
    ) -> Self {
        let layout = RowLayout::new(header.columns, header.data_type, header.byte_order);
        let cache = RowCache::new(config.block_size(header.columns));
        log::debug!(
            "Opened {} ({}x{} {}, {:?}, {} cached rows)",
            paths.header.display(),
            header.rows,
            header.columns,
            header.data_type,
            access,
            cache.capacity()
        );

        Self {
            paths,
            header,
            access,
            config,
            layout,
            cache,
            data: None,
            initial_value,
            dirty: false,
            header_dirty: false,
            created,
            stats: None,
            stats_stale: created,
            cancel: None,
            progress: None,
            reads: 0,
            writes: 0,
            write_failure: None,
            closed: false,
        }
    }

    pub fn header(&self) -> &RasterHeader {
        &self.header
    }

    pub fn paths(&self) -> &SidecarPaths {
        &self.paths
    }

    pub fn access(&self) -> FileAccess {
        self.access
    }

    pub fn rows(&self) -> usize {
        self.header.rows
    }

    pub fn columns(&self) -> usize {
        self.header.columns
    }

    pub fn data_type(&self) -> DataType {
        self.header.data_type
    }

    pub fn no_data(&self) -> f64 {
        self.header.no_data
    }

    /// Maximum number of rows held in memory
    pub fn block_size(&self) -> usize {
        self.cache.capacity()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of rows read from the data file so far
    pub fn data_file_reads(&self) -> u64 {
        self.reads
    }

    /// Number of rows written to the data file so far
    pub fn data_file_writes(&self) -> u64 {
        self.writes
    }

    /// Whether cell values changed since the raster was opened
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_reflected_at_edges(&self) -> bool {
        self.config.reflect_at_edges
    }

    pub fn set_reflect_at_edges(&mut self, reflect: bool) {
        self.config.reflect_at_edges = reflect;
    }

    /// Marks the raster for deletion on close
    pub fn set_temporary(&mut self, temporary: bool) {
        self.config.temporary = temporary;
    }

    /// Attaches a flag checked between rows by full-grid scans
    pub fn set_cancel_flag(&mut self, cancel: CancelFlag) {
        self.cancel = Some(cancel);
    }

    /// Receives the completed fraction (0 to 1) of full-grid scans
    pub fn set_progress_callback<F: FnMut(f64) + Send + 'static>(&mut self, callback: F) {
        self.progress = Some(Box::new(callback));
    }

    /// Fails with [`Error::DimensionMismatch`] unless both rasters have the
    /// same number of rows and columns.
    ///
    /// Algorithms combining rasters cell-for-cell must call this themselves;
    /// cell access never checks alignment.
    pub fn check_same_dimensions(&self, other: &WhiteboxRaster) -> Result<()> {
        if self.header.rows != other.header.rows || self.header.columns != other.header.columns {
            return Err(Error::DimensionMismatch {
                expected_rows: self.header.rows,
                expected_cols: self.header.columns,
                actual_rows: other.header.rows,
                actual_cols: other.header.columns,
            });
        }
        Ok(())
    }

    /// Reads a cell, returning nodata outside the grid.
    ///
    /// With edge reflection enabled, an outside coordinate is mirrored back
    /// once before giving up. Read failures are logged and yield nodata.
    pub fn get_value(&mut self, row: isize, column: isize) -> f64 {
        match self.try_get_value(row, column) {
            Ok(value) => value,
            Err(e) => {
                log::error!(
                    "Failed to read row {} of {}: {}",
                    row,
                    self.paths.data.display(),
                    e
                );
                self.header.no_data
            }
        }
    }

    /// Like [`get_value`](Self::get_value) but surfaces I/O failures
    pub fn try_get_value(&mut self, row: isize, column: isize) -> Result<f64> {
        let Some((row, column)) = self.resolve(row, column) else {
            return Ok(self.header.no_data);
        };
        self.fault_in(row)?;
        Ok(self
            .cache
            .get(row)
            .map_or(self.header.no_data, |values| values[column]))
    }

    /// Writes a cell in memory; no-op when read-only or outside the grid.
    ///
    /// The change reaches the disk when the row is evicted or on close.
    /// Failures to page the row in are logged.
    pub fn set_value(&mut self, row: isize, column: isize, value: f64) {
        if let Err(e) = self.try_set_value(row, column, value) {
            log::error!(
                "Failed to write row {} of {}: {}",
                row,
                self.paths.data.display(),
                e
            );
        }
    }

    /// Like [`set_value`](Self::set_value) but surfaces I/O failures
    pub fn try_set_value(&mut self, row: isize, column: isize, value: f64) -> Result<()> {
        if !self.access.is_writable() || !self.header.contains(row, column) {
            return Ok(());
        }
        let (row, column) = (row as usize, column as usize);

        self.fault_in(row)?;
        if let Some(values) = self.cache.get_mut(row) {
            values[column] = value;
        }
        self.track_value(value);
        self.mark_dirty();
        Ok(())
    }

    /// Reads a whole row straight from the data file, bypassing the cache.
    ///
    /// Meant for single sequential passes. Rows outside the grid and read
    /// failures (logged) come back as nodata.
    pub fn get_row_values(&mut self, row: isize) -> Vec<f64> {
        match self.try_get_row_values(row) {
            Ok(values) => values,
            Err(e) => {
                log::error!(
                    "Failed to read row {} of {}: {}",
                    row,
                    self.paths.data.display(),
                    e
                );
                vec![self.header.no_data; self.header.columns]
            }
        }
    }

    /// Like [`get_row_values`](Self::get_row_values) but surfaces I/O failures
    pub fn try_get_row_values(&mut self, row: isize) -> Result<Vec<f64>> {
        if row < 0 || row as usize >= self.header.rows {
            return Ok(vec![self.header.no_data; self.header.columns]);
        }
        let row = row as usize;
        if self.cache.is_dirty(row) {
            self.flush_row(row)?;
        }
        self.read_row_from_disk(row)
    }

    /// Replaces a whole row; ignored when read-only, outside the grid, or
    /// when `values` is not exactly one row long
    pub fn set_row_values(&mut self, row: isize, values: &[f64]) {
        if let Err(e) = self.try_set_row_values(row, values) {
            log::error!(
                "Failed to write row {} of {}: {}",
                row,
                self.paths.data.display(),
                e
            );
        }
    }

    /// Like [`set_row_values`](Self::set_row_values) but surfaces I/O failures
    pub fn try_set_row_values(&mut self, row: isize, values: &[f64]) -> Result<()> {
        if !self.access.is_writable() || row < 0 || row as usize >= self.header.rows {
            return Ok(());
        }
        if values.len() != self.header.columns {
            log::warn!(
                "Ignoring row of {} values for a raster {} columns wide",
                values.len(),
                self.header.columns
            );
            return Ok(());
        }
        let row = row as usize;

        for &value in values {
            self.track_value(value);
        }
        self.mark_dirty();

        if self.cache.contains(row) {
            self.cache.insert(row, values.to_vec(), true);
            Ok(())
        } else {
            self.write_row_to_disk(row, values)
        }
    }

    pub fn metadata(&self) -> &[String] {
        self.header.metadata()
    }

    /// Appends a metadata entry; `;` is stored as `:`
    pub fn add_metadata_entry(&mut self, entry: &str) {
        self.header.add_metadata_entry(entry);
        self.header_dirty = true;
    }

    pub fn delete_metadata_entry(&mut self, index: usize) {
        self.header.delete_metadata_entry(index);
        self.header_dirty = true;
    }

    /// Sets the presentation range written to the header
    pub fn set_display_range(&mut self, minimum: f64, maximum: f64) {
        self.header.display_minimum = minimum;
        self.header.display_maximum = maximum;
        self.header_dirty = true;
    }

    pub fn set_preferred_palette(&mut self, palette: &str) {
        self.header.preferred_palette = palette.to_string();
        self.header_dirty = true;
    }

    pub fn set_z_units(&mut self, units: &str) {
        self.header.z_units = units.to_string();
        self.header_dirty = true;
    }

    pub fn set_xy_units(&mut self, units: &str) {
        self.header.xy_units = units.to_string();
        self.header_dirty = true;
    }

    pub fn set_projection(&mut self, projection: &str) {
        self.header.projection = projection.to_string();
        self.header_dirty = true;
    }

    pub fn set_data_scale(&mut self, scale: DataScale) {
        self.header.data_scale = scale;
        self.header_dirty = true;
    }

    /// Changes the nodata value recorded in the header.
    ///
    /// Cells already holding the old value are not rewritten, and the fill
    /// value of a data file not yet created stays as given at creation.
    pub fn set_no_data(&mut self, no_data: f64) {
        self.header.no_data = no_data;
        self.header_dirty = true;
    }

    /// Adds `delta` to a cell; no-op when read-only or outside the grid
    pub fn increment_value(&mut self, row: isize, column: isize, delta: f64) {
        if let Err(e) = self.try_adjust_value(row, column, delta) {
            log::error!(
                "Failed to update row {} of {}: {}",
                row,
                self.paths.data.display(),
                e
            );
        }
    }

    /// Subtracts `delta` from a cell; no-op when read-only or outside the grid
    pub fn decrement_value(&mut self, row: isize, column: isize, delta: f64) {
        self.increment_value(row, column, -delta);
    }

    fn try_adjust_value(&mut self, row: isize, column: isize, delta: f64) -> Result<()> {
        if !self.access.is_writable() || !self.header.contains(row, column) {
            return Ok(());
        }
        let (row, column) = (row as usize, column as usize);

        self.fault_in(row)?;
        let mut updated = None;
        if let Some(values) = self.cache.get_mut(row) {
            values[column] += delta;
            updated = Some(values[column]);
        }
        if let Some(value) = updated {
            self.track_value(value);
        }
        self.mark_dirty();
        Ok(())
    }

    /// Whether any valid cell has a fractional part larger than 0.001.
    ///
    /// Integer and byte rasters answer without scanning.
    pub fn contains_fractional_data(&mut self) -> Result<bool> {
        if self.header.data_type.is_integral() {
            return Ok(false);
        }
        self.flush()?;

        let no_data = self.header.no_data;
        let mut fractional = false;
        self.scan_rows("Checking for fractional values", |values| {
            fractional |= values
                .iter()
                .any(|&z| z != no_data && z - z.floor() > 0.001);
        })?;
        Ok(fractional)
    }

    /// Writes every dirty row back to the data file
    pub fn flush(&mut self) -> Result<()> {
        let dirty = self.cache.dirty_rows();
        if dirty.is_empty() {
            return Ok(());
        }
        self.ensure_data_file()?;
        let Some(file) = self.data.as_mut() else {
            return Ok(());
        };

        for row in dirty {
            if let Some(values) = self.cache.peek(row) {
                self.layout.write_row(file, row, values)?;
                self.writes += 1;
            }
            self.cache.mark_clean(row);
        }
        Ok(())
    }

    /// Rescans the whole grid and stores the exact value range in the header
    pub fn find_min_max(&mut self) -> Result<()> {
        self.flush()?;
        let mut range = RangeAccumulator::new(self.header.no_data);
        self.scan_rows("Finding min/max", |values| range.add_row(values))?;

        self.header.minimum = range.min();
        self.header.maximum = range.max();
        self.header_dirty = true;
        Ok(())
    }

    /// Statistics of the valid cells, loaded from the stats file when it is
    /// current and computed otherwise
    pub fn stats(&mut self) -> Result<&RasterStats> {
        let stats = match self.stats.take() {
            Some(stats) => stats,
            None => self.load_or_compute_stats()?,
        };
        Ok(self.stats.insert(stats))
    }

    /// Recomputes statistics with two passes over the grid and rewrites the
    /// stats file
    pub fn compute_stats(&mut self) -> Result<&RasterStats> {
        let stats = self.compute_fresh_stats()?;
        Ok(self.stats.insert(stats))
    }

    pub fn mean(&mut self) -> Result<f64> {
        Ok(self.stats()?.mean)
    }

    pub fn median(&mut self) -> Result<f64> {
        Ok(self.stats()?.median)
    }

    pub fn mode(&mut self) -> Result<f64> {
        Ok(self.stats()?.mode)
    }

    pub fn std_dev(&mut self) -> Result<f64> {
        Ok(self.stats()?.std_dev)
    }

    pub fn num_valid_cells(&mut self) -> Result<u64> {
        Ok(self.stats()?.num_valid_cells)
    }

    pub fn histogram(&mut self) -> Result<&Histogram> {
        Ok(&self.stats()?.histogram)
    }

    /// Value below which `percentile` percent of valid cells fall; nodata
    /// when there are no valid cells
    pub fn percentile(&mut self, percentile: f64) -> Result<f64> {
        let no_data = self.header.no_data;
        Ok(self.stats()?.percentile(percentile).unwrap_or(no_data))
    }

    /// Flushes, rescans and persists the header; deletes every sidecar
    /// instead when the raster is temporary
    pub fn close(mut self) -> Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.config.temporary {
            self.cache.clear();
            self.data = None;
            log::debug!("Deleting temporary raster {}", self.paths.header.display());
            return Ok(self.paths.remove_all()?);
        }

        let mut result = Ok(());
        if self.access.is_writable() {
            if self.dirty || self.created {
                self.ensure_data_file()?;
                self.flush()?;
                result = match self.find_min_max() {
                    Err(Error::Cancelled) => {
                        log::warn!(
                            "Min/max rescan of {} cancelled, keeping running values",
                            self.paths.header.display()
                        );
                        Err(Error::Cancelled)
                    }
                    other => other,
                };
                if self.stats_stale {
                    self.paths.remove_stats()?;
                }
                self.header_dirty = true;
            }
            if self.header_dirty {
                self.header.write(&self.paths.header)?;
                self.header_dirty = false;
            }
        }

        self.cache.clear();
        self.data = None;
        match self.write_failure.take() {
            Some(failure) if result.is_ok() => Err(Error::Io(std::io::Error::other(format!(
                "an earlier write to {} failed ({}); changes made meanwhile may be lost",
                self.paths.data.display(),
                failure
            )))),
            _ => result,
        }
    }

    fn resolve(&self, row: isize, column: isize) -> Option<(usize, usize)> {
        if self.header.contains(row, column) {
            return Some((row as usize, column as usize));
        }
        if !self.config.reflect_at_edges {
            return None;
        }

        let rows = self.header.rows as isize;
        let columns = self.header.columns as isize;
        let row = reflect(row, rows);
        let column = reflect(column, columns);
        self.header
            .contains(row, column)
            .then_some((row as usize, column as usize))
    }

    fn fault_in(&mut self, row: usize) -> Result<()> {
        if self.cache.contains(row) {
            return Ok(());
        }
        if self.cache.len() >= self.cache.capacity() {
            self.evict_lru()?;
        }
        let values = self.read_row_from_disk(row)?;
        self.cache.insert(row, values, false);
        Ok(())
    }

    /// Writes back and drops the least recently used row. A dirty row whose
    /// write fails stays cached and dirty.
    fn evict_lru(&mut self) -> Result<()> {
        let Some(evicted) = self.cache.pop_lru() else {
            return Ok(());
        };
        log::trace!("Evicted row {} (dirty: {})", evicted.row, evicted.dirty);
        if evicted.dirty {
            if let Err(e) = self.write_row_to_disk(evicted.row, &evicted.values) {
                self.cache.insert(evicted.row, evicted.values, true);
                return Err(e);
            }
        }
        Ok(())
    }

    fn flush_row(&mut self, row: usize) -> Result<()> {
        self.ensure_data_file()?;
        if let (Some(file), Some(values)) = (self.data.as_mut(), self.cache.peek(row)) {
            self.layout.write_row(file, row, values)?;
            self.writes += 1;
        }
        self.cache.mark_clean(row);
        Ok(())
    }

    fn read_row_from_disk(&mut self, row: usize) -> Result<Vec<f64>> {
        self.ensure_data_file()?;
        match self.data.as_mut() {
            Some(file) => {
                self.reads += 1;
                Ok(self.layout.read_row(file, row)?)
            }
            None => Ok(vec![self.initial_value; self.header.columns]),
        }
    }

    /// Positioned write of one row. A failure is remembered and reported
    /// again by `close()`.
    fn write_row_to_disk(&mut self, row: usize, values: &[f64]) -> Result<()> {
        let result = self.write_row_unrecorded(row, values);
        if let Err(e) = &result {
            if self.write_failure.is_none() {
                self.write_failure = Some(format!("row {}: {}", row, e));
            }
        }
        result
    }

    fn write_row_unrecorded(&mut self, row: usize, values: &[f64]) -> Result<()> {
        self.ensure_data_file()?;
        if let Some(file) = self.data.as_mut() {
            self.layout.write_row(file, row, values)?;
            self.writes += 1;
        }
        Ok(())
    }

    /// Opens the data file, creating it filled with the initial value when a
    /// writable raster has none yet. Read-only rasters without a data file
    /// stay detached and serve the initial value.
    fn ensure_data_file(&mut self) -> Result<()> {
        if self.data.is_some() {
            return Ok(());
        }
        let writable = self.access.is_writable();

        if self.paths.data.exists() {
            let file = OpenOptions::new()
                .read(true)
                .write(writable)
                .open(&self.paths.data)?;
            self.data = Some(file);
        } else if writable {
            log::debug!(
                "Creating {} filled with {}",
                self.paths.data.display(),
                self.initial_value
            );
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.paths.data)?;
            let mut writer = BufWriter::new(file);
            self.layout
                .fill(&mut writer, self.header.rows, self.initial_value)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            self.data = Some(file);
        }
        Ok(())
    }

    fn scan_rows<F: FnMut(&[f64])>(&mut self, label: &str, mut visit: F) -> Result<()> {
        let rows = self.header.rows;
        let mut last_percent = None;

        for row in 0..rows {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                log::debug!("{} cancelled at row {} of {}", label, row, rows);
                return Err(Error::Cancelled);
            }

            let values = self.read_row_from_disk(row)?;
            visit(&values);

            let percent = (row + 1) * 100 / rows;
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                log::debug!("{}: {}%", label, percent);
                if let Some(progress) = self.progress.as_mut() {
                    progress((row + 1) as f64 / rows as f64);
                }
            }
        }
        Ok(())
    }

    fn load_or_compute_stats(&mut self) -> Result<RasterStats> {
        if !self.stats_stale && self.paths.stats.exists() {
            match RasterStats::read(&self.paths.stats) {
                Ok(stats) => return Ok(stats),
                Err(e) => log::warn!(
                    "Recomputing statistics, could not read {}: {}",
                    self.paths.stats.display(),
                    e
                ),
            }
        }
        self.compute_fresh_stats()
    }

    fn compute_fresh_stats(&mut self) -> Result<RasterStats> {
        if self.header.data_scale == DataScale::Rgb {
            return Err(Error::Unsupported("statistics of RGB rasters".to_string()));
        }
        self.flush()?;

        let mut range = RangeAccumulator::new(self.header.no_data);
        self.scan_rows("Computing statistics (1/2)", |values| range.add_row(values))?;
        if range.count() > 0 {
            self.header.minimum = range.min();
            self.header.maximum = range.max();
            self.header_dirty |= self.access.is_writable();
        }

        let mut histogram = HistogramAccumulator::new(range, self.header.data_type);
        self.scan_rows("Computing statistics (2/2)", |values| histogram.add_row(values))?;
        let stats = histogram.finish();

        if let Err(e) = stats.write(&self.paths.stats) {
            log::warn!("Could not write {}: {}", self.paths.stats.display(), e);
        }
        self.stats_stale = false;
        Ok(stats)
    }

    fn track_value(&mut self, value: f64) {
        if value != self.header.no_data {
            self.header.minimum = self.header.minimum.min(value);
            self.header.maximum = self.header.maximum.max(value);
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.stats = None;
        self.stats_stale = true;
    }
}

impl Drop for WhiteboxRaster {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        log::warn!(
            "{} dropped without close(), closing now",
            self.paths.header.display()
        );
        if let Err(e) = self.close_inner() {
            log::warn!("Closing {} failed: {}", self.paths.header.display(), e);
        }
    }
}

/// Mirrors an index once across the nearer edge of `0..len`
fn reflect(index: isize, len: isize) -> isize {
    if index < 0 {
        index.saturating_neg()
    } else if index >= len {
        len - (index - len)
    } else {
        index
    }
}
