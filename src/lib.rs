//! whitebox-raster - Paged storage for Whitebox sidecar rasters
//!
//! whitebox-raster reads and writes single-band rasters stored as a text
//! header, a binary data file and a lazily computed statistics file. Cells are
//! paged in whole rows through a bounded LRU cache, so grids far larger than
//! memory can be processed with plain `get_value`/`set_value` calls.
//!
//! # Examples
//!
//! ## Creating a raster from a template
//!
//! ```no_run
//! use whitebox_raster::{DataType, FileAccess, WhiteboxRaster};
//!
//! let mut dem = WhiteboxRaster::open("dem.dep", FileAccess::Read)?;
//! let mut slope = WhiteboxRaster::create_from_template(
//!     "slope.dep",
//!     FileAccess::ReadWrite,
//!     "dem.dep",
//!     DataType::Float,
//!     dem.no_data(),
//! )?;
//!
//! for row in 0..dem.rows() as isize {
//!     for col in 0..dem.columns() as isize {
//!         let z = dem.get_value(row, col);
//!         if z != dem.no_data() {
//!             let dz = dem.get_value(row, col + 1) - z;
//!             slope.set_value(row, col, dz.abs());
//!         }
//!     }
//! }
//!
//! slope.close()?;
//! dem.close()?;
//! # Ok::<(), whitebox_raster::Error>(())
//! ```
//!
//! ## Statistics
//!
//! ```no_run
//! use whitebox_raster::{FileAccess, WhiteboxRaster};
//!
//! let mut raster = WhiteboxRaster::open("dem.dep", FileAccess::Read)?;
//! println!("mean: {}", raster.mean()?);
//! println!("95th percentile: {}", raster.percentile(95.0)?);
//! raster.close()?;
//! # Ok::<(), whitebox_raster::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod config;
pub mod cancel;
pub mod cache;
pub mod formats;

pub use error::{Error, Result};
pub use types::{DataScale, DataType, FileAccess};
pub use config::RasterConfig;
pub use cancel::CancelFlag;
pub use cache::{CacheStats, RowCache};
pub use formats::whitebox::{
    Histogram, RasterHeader, RasterStats, SidecarPaths, WhiteboxRaster,
    DEFAULT_NO_DATA,
};
pub use io::ByteOrder;
