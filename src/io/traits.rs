//! Core I/O traits

use std::io::{Read, Seek, Write};

/// Trait for the random-access backing store of a data sidecar
///
/// Combines [`Read`], [`Write`] and [`Seek`] so row I/O can run against a
/// [`std::fs::File`] or an in-memory [`std::io::Cursor`]. It is implemented
/// automatically for any type that implements all three.
pub trait RasterFile: Read + Write + Seek {}

impl<T: Read + Write + Seek> RasterFile for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    #[test]
    fn test_cursor_implements_raster_file() {
        fn accepts_raster_file<F: RasterFile>(_f: F) {}
        accepts_raster_file(Cursor::new(Vec::<u8>::new()));
    }

    #[test]
    fn test_positioned_overwrite() {
        let mut file: Box<dyn RasterFile> = Box::new(Cursor::new(vec![0u8; 4]));

        file.seek(SeekFrom::Start(2)).unwrap();
        file.write_all(&[0xAA, 0xBB]).unwrap();

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = [0u8; 4];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0xAA, 0xBB]);
    }
}
