//! Sidecar file naming

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Header file extension
pub const HEADER_EXTENSION: &str = "dep";

/// Data file extension
pub const DATA_EXTENSION: &str = "tas";

/// Statistics file extension
pub const STATS_EXTENSION: &str = "wstat";

/// The three files making up one raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarPaths {
    pub header: PathBuf,
    pub data: PathBuf,
    pub stats: PathBuf,
}

impl SidecarPaths {
    /// Derives the data and stats paths from a header path
    pub fn from_header<P: AsRef<Path>>(header: P) -> Self {
        let header = header.as_ref().to_path_buf();
        Self {
            data: header.with_extension(DATA_EXTENSION),
            stats: header.with_extension(STATS_EXTENSION),
            header,
        }
    }

    /// Deletes the stats file, ignoring a missing file
    pub fn remove_stats(&self) -> io::Result<()> {
        remove_if_exists(&self.stats)
    }

    /// Deletes every sidecar, ignoring missing files
    pub fn remove_all(&self) -> io::Result<()> {
        remove_if_exists(&self.header)?;
        remove_if_exists(&self.data)?;
        remove_if_exists(&self.stats)
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        let paths = SidecarPaths::from_header("/data/dem.dep");
        assert_eq!(paths.data, PathBuf::from("/data/dem.tas"));
        assert_eq!(paths.stats, PathBuf::from("/data/dem.wstat"));
        assert_eq!(paths.header, PathBuf::from("/data/dem.dep"));
    }

    #[test]
    fn test_remove_all_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SidecarPaths::from_header(dir.path().join("a.dep"));
        fs::write(&paths.header, "Rows:\t1").unwrap();

        paths.remove_all().unwrap();
        assert!(!paths.header.exists());
    }
}
