//! On-disk raster formats

pub mod whitebox;
