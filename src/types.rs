//! Core data types for whitebox-raster

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// On-disk cell encoding of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit floating point
    Double,
    /// 32-bit floating point
    Float,
    /// Signed 16-bit integer
    Integer,
    /// Unsigned 8-bit integer
    Byte,
}

impl DataType {
    /// Returns the size in bytes of one cell
    pub fn size(&self) -> usize {
        match self {
            DataType::Double => 8,
            DataType::Float => 4,
            DataType::Integer => 2,
            DataType::Byte => 1,
        }
    }

    /// Returns the name used in header files
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Double => "double",
            DataType::Float => "float",
            DataType::Integer => "integer",
            DataType::Byte => "byte",
        }
    }

    /// Whether cells hold whole numbers only
    pub fn is_integral(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Byte)
    }

    /// Parses a header value, falling back to `Float` for unknown names.
    ///
    /// Existing header files in the wild rely on this leniency.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::warn!("Unrecognized data type '{}', assuming float", value.trim());
            DataType::Float
        })
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "double" => Ok(DataType::Double),
            "float" => Ok(DataType::Float),
            "integer" => Ok(DataType::Integer),
            "byte" => Ok(DataType::Byte),
            other => Err(Error::UnsupportedDataType(other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Measurement scale of the cell values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataScale {
    #[default]
    Continuous,
    Categorical,
    Boolean,
    Rgb,
}

impl DataScale {
    /// Returns the name used in header files
    pub fn name(&self) -> &'static str {
        match self {
            DataScale::Continuous => "continuous",
            DataScale::Categorical => "categorical",
            DataScale::Boolean => "boolean",
            DataScale::Rgb => "rgb",
        }
    }
}

impl FromStr for DataScale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(DataScale::Continuous),
            "categorical" => Ok(DataScale::Categorical),
            "boolean" | "bool" => Ok(DataScale::Boolean),
            "rgb" => Ok(DataScale::Rgb),
            other => Err(Error::CorruptHeader(format!("unknown data scale '{}'", other))),
        }
    }
}

impl fmt::Display for DataScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a raster is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccess {
    Read,
    ReadWrite,
}

impl FileAccess {
    pub fn is_writable(&self) -> bool {
        matches!(self, FileAccess::ReadWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_size() {
        assert_eq!(DataType::Double.size(), 8);
        assert_eq!(DataType::Float.size(), 4);
        assert_eq!(DataType::Integer.size(), 2);
        assert_eq!(DataType::Byte.size(), 1);
    }

    #[test]
    fn test_data_type_parse_is_case_insensitive() {
        assert_eq!("DOUBLE".parse::<DataType>().unwrap(), DataType::Double);
        assert_eq!(" Integer ".parse::<DataType>().unwrap(), DataType::Integer);
    }

    #[test]
    fn test_data_type_strict_parse_rejects_unknown() {
        let err = "complex64".parse::<DataType>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedDataType(_)));
    }

    #[test_log::test]
    fn test_data_type_lenient_parse_falls_back_to_float() {
        assert_eq!(DataType::parse_lenient("complex64"), DataType::Float);
        assert_eq!(DataType::parse_lenient("byte"), DataType::Byte);
    }

    #[test]
    fn test_data_scale_round_trip_names() {
        for scale in [
            DataScale::Continuous,
            DataScale::Categorical,
            DataScale::Boolean,
            DataScale::Rgb,
        ] {
            assert_eq!(scale.name().parse::<DataScale>().unwrap(), scale);
        }
    }

    #[test]
    fn test_file_access() {
        assert!(FileAccess::ReadWrite.is_writable());
        assert!(!FileAccess::Read.is_writable());
    }
}
