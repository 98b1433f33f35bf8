//! Whitebox sidecar raster format
//!
//! A raster is three files sharing a base name: a text header (`.dep`), a
//! row-major binary data file (`.tas`) and an optional statistics cache
//! (`.wstat`).

pub mod paths;
pub mod header;
pub mod stats;
pub mod raster;

pub use paths::{SidecarPaths, HEADER_EXTENSION, DATA_EXTENSION, STATS_EXTENSION};
pub use header::{RasterHeader, DEFAULT_NO_DATA};
pub use stats::{Histogram, RasterStats, RangeAccumulator, HistogramAccumulator};
pub use raster::WhiteboxRaster;
