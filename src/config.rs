/// Configuration for opening a raster store

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Tuning knobs for a [`WhiteboxRaster`](crate::WhiteboxRaster)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Memory budget for the row cache, in bytes
    pub buffer_size_bytes: u64,

    /// Mirror out-of-bounds reads back into the grid instead of returning nodata
    pub reflect_at_edges: bool,

    /// Delete the header and data files on close
    pub temporary: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            buffer_size_bytes: 100 * 1_048_576,
            reflect_at_edges: false,
            temporary: false,
        }
    }
}

impl RasterConfig {
    /// Creates a configuration with a buffer size given in megabytes
    pub fn with_buffer_size_mb(megabytes: f64) -> Self {
        Self {
            buffer_size_bytes: (megabytes * BYTES_PER_MB) as u64,
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn buffer_size_mb(&self) -> f64 {
        self.buffer_size_bytes as f64 / BYTES_PER_MB
    }

    /// Number of rows the cache may hold for a raster `columns` wide.
    ///
    /// The budget is counted in 8-byte values whatever the on-disk cell
    /// width, so narrow data types use less memory than configured.
    pub fn block_size(&self, columns: usize) -> usize {
        ((self.buffer_size_bytes / 8) as usize / columns.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = RasterConfig::default();
        assert_eq!(config.buffer_size_mb(), 100.0);
        assert!(!config.reflect_at_edges);
        assert!(!config.temporary);
    }

    #[test]
    fn test_block_size() {
        let config = RasterConfig {
            buffer_size_bytes: 8 * 100,
            ..RasterConfig::default()
        };
        assert_eq!(config.block_size(10), 10);
        assert_eq!(config.block_size(30), 3);
        assert_eq!(config.block_size(1000), 1);
    }

    #[test]
    fn test_from_json_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raster.json");
        fs::write(&path, r#"{ "reflect_at_edges": true }"#).unwrap();

        let config = RasterConfig::from_json_file(&path).unwrap();
        assert!(config.reflect_at_edges);
        assert_eq!(config.buffer_size_bytes, RasterConfig::default().buffer_size_bytes);
    }

    #[test]
    fn test_from_json_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raster.json");
        fs::write(&path, "{ buffer_size_bytes: ").unwrap();

        assert!(matches!(
            RasterConfig::from_json_file(&path),
            Err(Error::Config(_))
        ));
    }
}
