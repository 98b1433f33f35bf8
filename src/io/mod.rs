//! I/O utilities for whitebox-raster
//!
//! Provides the byte-order codecs and positioned row I/O used by the
//! raster store.

pub mod traits;
pub mod byte_order;
pub mod rows;

pub use traits::RasterFile;
pub use byte_order::{ByteOrder, ByteOrderHandler};
pub use rows::RowLayout;
