//! Header sidecar (`.dep`) parsing and writing
//!
//! The header is a text file of `Key:\tValue` lines. Keys are matched
//! case-insensitively but exactly, so `Min:` and `Display Min:` can never be
//! confused with each other.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::{DataScale, DataType};

/// Nodata value used when a header does not declare one
pub const DEFAULT_NO_DATA: f64 = -32768.0;

const NOT_SPECIFIED: &str = "not specified";
const DEFAULT_PALETTE: &str = "grey.pal";

/// Every key a header line may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKey {
    Min,
    Max,
    North,
    South,
    East,
    West,
    Cols,
    Rows,
    DataType,
    DataScale,
    ZUnits,
    XyUnits,
    Projection,
    DisplayMin,
    DisplayMax,
    PreferredPalette,
    NoData,
    ByteOrder,
    MetadataEntry,
}

impl HeaderKey {
    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_end_matches(':').trim().to_ascii_lowercase();
        let key = match label.as_str() {
            "min" => HeaderKey::Min,
            "max" => HeaderKey::Max,
            "north" => HeaderKey::North,
            "south" => HeaderKey::South,
            "east" => HeaderKey::East,
            "west" => HeaderKey::West,
            "cols" => HeaderKey::Cols,
            "rows" => HeaderKey::Rows,
            "data type" => HeaderKey::DataType,
            "data scale" => HeaderKey::DataScale,
            "z units" => HeaderKey::ZUnits,
            "xy units" => HeaderKey::XyUnits,
            "projection" => HeaderKey::Projection,
            "display min" => HeaderKey::DisplayMin,
            "display max" => HeaderKey::DisplayMax,
            "preferred palette" => HeaderKey::PreferredPalette,
            "nodata" => HeaderKey::NoData,
            "byte order" => HeaderKey::ByteOrder,
            "metadata entry" => HeaderKey::MetadataEntry,
            _ => return None,
        };
        Some(key)
    }

    fn label(&self) -> &'static str {
        match self {
            HeaderKey::Min => "Min",
            HeaderKey::Max => "Max",
            HeaderKey::North => "North",
            HeaderKey::South => "South",
            HeaderKey::East => "East",
            HeaderKey::West => "West",
            HeaderKey::Cols => "Cols",
            HeaderKey::Rows => "Rows",
            HeaderKey::DataType => "Data Type",
            HeaderKey::DataScale => "Data Scale",
            HeaderKey::ZUnits => "Z Units",
            HeaderKey::XyUnits => "XY Units",
            HeaderKey::Projection => "Projection",
            HeaderKey::DisplayMin => "Display Min",
            HeaderKey::DisplayMax => "Display Max",
            HeaderKey::PreferredPalette => "Preferred Palette",
            HeaderKey::NoData => "NoData",
            HeaderKey::ByteOrder => "Byte Order",
            HeaderKey::MetadataEntry => "Metadata Entry",
        }
    }
}

/// Geometry, encoding and annotations of a raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterHeader {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub rows: usize,
    pub columns: usize,
    pub data_type: DataType,
    pub data_scale: DataScale,
    pub no_data: f64,
    /// Running minimum; authoritative only after a full scan
    pub minimum: f64,
    /// Running maximum; authoritative only after a full scan
    pub maximum: f64,
    /// Presentation hint; `+inf` when unset
    pub display_minimum: f64,
    /// Presentation hint; `-inf` when unset
    pub display_maximum: f64,
    pub z_units: String,
    pub xy_units: String,
    pub projection: String,
    pub preferred_palette: String,
    pub byte_order: ByteOrder,
    metadata: Vec<String>,
}

impl RasterHeader {
    /// Creates a header for a `rows` x `columns` grid of unit cells
    /// anchored at the origin
    pub fn new(rows: usize, columns: usize, data_type: DataType) -> Self {
        Self {
            north: rows as f64,
            south: 0.0,
            east: columns as f64,
            west: 0.0,
            rows,
            columns,
            data_type,
            data_scale: DataScale::Continuous,
            no_data: DEFAULT_NO_DATA,
            minimum: f64::MAX,
            maximum: -f64::MAX,
            display_minimum: f64::INFINITY,
            display_maximum: f64::NEG_INFINITY,
            z_units: NOT_SPECIFIED.to_string(),
            xy_units: NOT_SPECIFIED.to_string(),
            projection: NOT_SPECIFIED.to_string(),
            preferred_palette: DEFAULT_PALETTE.to_string(),
            byte_order: ByteOrder::LittleEndian,
            metadata: Vec::new(),
        }
    }

    /// Creates a header sharing `template`'s extent, shape, scale and
    /// georeferencing, with a new data type and fresh value range
    pub fn from_template(template: &RasterHeader, data_type: DataType) -> Self {
        Self {
            north: template.north,
            south: template.south,
            east: template.east,
            west: template.west,
            data_scale: template.data_scale,
            no_data: template.no_data,
            xy_units: template.xy_units.clone(),
            projection: template.projection.clone(),
            preferred_palette: template.preferred_palette.clone(),
            ..Self::new(template.rows, template.columns, data_type)
        }
    }

    /// Reads and parses a header file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses header text
    ///
    /// Fails with [`Error::CorruptHeader`] when a geometry field is missing
    /// or any numeric field does not parse. An absent byte order means
    /// little-endian.
    pub fn parse(text: &str) -> Result<Self> {
        let mut header = Self::new(1, 1, DataType::Float);
        let mut north = None;
        let mut south = None;
        let mut east = None;
        let mut west = None;
        let mut rows = None;
        let mut columns = None;
        let mut data_type_seen = false;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (label, value) = line.split_once('\t').unwrap_or((line, ""));
            let Some(key) = HeaderKey::from_label(label) else {
                log::debug!("Ignoring unknown header line '{}'", line);
                continue;
            };

            match key {
                HeaderKey::Min => header.minimum = parse_f64(key, value)?,
                HeaderKey::Max => header.maximum = parse_f64(key, value)?,
                HeaderKey::North => north = Some(parse_f64(key, value)?),
                HeaderKey::South => south = Some(parse_f64(key, value)?),
                HeaderKey::East => east = Some(parse_f64(key, value)?),
                HeaderKey::West => west = Some(parse_f64(key, value)?),
                HeaderKey::Cols => columns = Some(parse_dimension(key, value)?),
                HeaderKey::Rows => rows = Some(parse_dimension(key, value)?),
                HeaderKey::DataType => {
                    header.data_type = DataType::parse_lenient(value);
                    data_type_seen = true;
                }
                HeaderKey::DataScale => {
                    header.data_scale = value.parse().unwrap_or_else(|_| {
                        log::warn!("Unrecognized data scale '{}', assuming continuous", value.trim());
                        DataScale::Continuous
                    })
                }
                HeaderKey::ZUnits => header.z_units = value.trim().to_string(),
                HeaderKey::XyUnits => header.xy_units = value.trim().to_string(),
                HeaderKey::Projection => header.projection = value.trim().to_string(),
                HeaderKey::DisplayMin => header.display_minimum = parse_f64(key, value)?,
                HeaderKey::DisplayMax => header.display_maximum = parse_f64(key, value)?,
                HeaderKey::PreferredPalette => {
                    header.preferred_palette = value.trim().replace(".plt", ".pal")
                }
                HeaderKey::NoData => header.no_data = parse_f64(key, value)?,
                HeaderKey::ByteOrder => header.byte_order = ByteOrder::from_header_value(value),
                HeaderKey::MetadataEntry => {
                    if !value.is_empty() {
                        header.add_metadata_entry(value);
                    }
                }
            }
        }

        header.north = require(north, HeaderKey::North)?;
        header.south = require(south, HeaderKey::South)?;
        header.east = require(east, HeaderKey::East)?;
        header.west = require(west, HeaderKey::West)?;
        header.rows = require(rows, HeaderKey::Rows)?;
        header.columns = require(columns, HeaderKey::Cols)?;

        if !data_type_seen {
            log::warn!("Header has no data type, assuming float");
        }
        if header.display_minimum == f64::INFINITY {
            header.display_minimum = header.minimum;
        }
        if header.display_maximum == f64::NEG_INFINITY {
            header.display_maximum = header.maximum;
        }

        Ok(header)
    }

    /// Renders the header as `Key:\tValue` lines
    pub fn to_text(&self) -> String {
        let (display_min, display_max) = self.display_range();
        let mut text = String::new();
        let mut line = |key: HeaderKey, value: &dyn std::fmt::Display| {
            let _ = writeln!(text, "{}:\t{}", key.label(), value);
        };

        line(HeaderKey::Min, &format_f64(self.minimum));
        line(HeaderKey::Max, &format_f64(self.maximum));
        line(HeaderKey::North, &format_f64(self.north));
        line(HeaderKey::South, &format_f64(self.south));
        line(HeaderKey::East, &format_f64(self.east));
        line(HeaderKey::West, &format_f64(self.west));
        line(HeaderKey::Cols, &self.columns);
        line(HeaderKey::Rows, &self.rows);
        line(HeaderKey::DataType, &self.data_type);
        line(HeaderKey::ZUnits, &self.z_units);
        line(HeaderKey::XyUnits, &self.xy_units);
        line(HeaderKey::Projection, &self.projection);
        line(HeaderKey::DataScale, &self.data_scale);
        line(HeaderKey::DisplayMin, &format_f64(display_min));
        line(HeaderKey::DisplayMax, &format_f64(display_max));
        line(
            HeaderKey::PreferredPalette,
            &self.preferred_palette.replace(".plt", ".pal"),
        );
        line(HeaderKey::NoData, &format_f64(self.no_data));
        line(HeaderKey::ByteOrder, &self.byte_order.header_name());
        for entry in &self.metadata {
            line(HeaderKey::MetadataEntry, &entry.replace(':', ";"));
        }

        text
    }

    /// Writes the header file, replacing any previous content
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Display range to persist, falling back to the value range when unset
    /// or empty
    pub fn display_range(&self) -> (f64, f64) {
        let mut min = self.display_minimum;
        let mut max = self.display_maximum;
        if min == f64::INFINITY {
            min = self.minimum;
        }
        if max == f64::NEG_INFINITY {
            max = self.maximum;
        }
        if max <= min {
            (self.minimum, self.maximum)
        } else {
            (min, max)
        }
    }

    /// Appends a free-text annotation; `;` is stored as `:`
    pub fn add_metadata_entry(&mut self, entry: &str) {
        self.metadata.push(entry.replace(';', ":"));
    }

    /// Removes the annotation at `index`, if present
    pub fn delete_metadata_entry(&mut self, index: usize) {
        if index < self.metadata.len() {
            self.metadata.remove(index);
        }
    }

    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    pub fn cell_size_x(&self) -> f64 {
        (self.east - self.west) / self.columns as f64
    }

    pub fn cell_size_y(&self) -> f64 {
        (self.north - self.south) / self.rows as f64
    }

    /// Expected length of the data file in bytes
    pub fn data_file_len(&self) -> u64 {
        self.rows as u64 * self.columns as u64 * self.data_type.size() as u64
    }

    /// Whether (`row`, `column`) lies inside the grid
    pub fn contains(&self, row: isize, column: isize) -> bool {
        row >= 0 && column >= 0 && (row as usize) < self.rows && (column as usize) < self.columns
    }

    /// Column whose cell centre is nearest to `x`; may lie outside the grid
    pub fn column_from_x(&self, x: f64) -> isize {
        ((x - self.west) / self.cell_size_x() - 0.5).round() as isize
    }

    /// Row whose cell centre is nearest to `y`; may lie outside the grid
    pub fn row_from_y(&self, y: f64) -> isize {
        ((self.north - y) / self.cell_size_y() - 0.5).round() as isize
    }

    /// X coordinate of the centre of `column`
    pub fn x_from_column(&self, column: isize) -> f64 {
        let cell = self.cell_size_x();
        self.west + cell / 2.0 + column as f64 * cell
    }

    /// Y coordinate of the centre of `row`
    pub fn y_from_row(&self, row: isize) -> f64 {
        let cell = self.cell_size_y();
        self.north - cell / 2.0 - row as f64 * cell
    }
}

fn format_f64(value: f64) -> String {
    format!("{:?}", value)
}

fn parse_f64(key: HeaderKey, value: &str) -> Result<f64> {
    value.trim().parse().map_err(|_| {
        Error::CorruptHeader(format!("invalid value '{}' for '{}'", value.trim(), key.label()))
    })
}

fn parse_dimension(key: HeaderKey, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::CorruptHeader(format!(
            "invalid value '{}' for '{}'",
            value.trim(),
            key.label()
        ))),
    }
}

fn require<T>(value: Option<T>, key: HeaderKey) -> Result<T> {
    value.ok_or_else(|| Error::CorruptHeader(format!("missing '{}'", key.label())))
}
