//! Positioned row I/O over a data sidecar
//!
//! A data sidecar is a row-major matrix of fixed-width cells. [`RowLayout`]
//! knows the width of a row and how to transcode it between the on-disk
//! representation and `f64` values.

use std::io::{Result, SeekFrom, Write};

use crate::io::{ByteOrder, RasterFile};
use crate::types::DataType;

/// Shape and encoding of one row of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub columns: usize,
    pub data_type: DataType,
    pub byte_order: ByteOrder,
}

impl RowLayout {
    pub fn new(columns: usize, data_type: DataType, byte_order: ByteOrder) -> Self {
        Self {
            columns,
            data_type,
            byte_order,
        }
    }

    /// Number of bytes one row occupies on disk
    pub fn row_bytes(&self) -> usize {
        self.columns * self.data_type.size()
    }

    /// Byte offset of the first cell of `row`
    pub fn row_offset(&self, row: usize) -> u64 {
        row as u64 * self.row_bytes() as u64
    }

    /// Decodes `bytes` into `out`, one value per cell
    pub fn decode(&self, bytes: &[u8], out: &mut [f64]) {
        let handler = self.byte_order.handler();
        let width = self.data_type.size();

        for (value, cell) in out.iter_mut().zip(bytes.chunks_exact(width)) {
            *value = match self.data_type {
                DataType::Double => {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(cell);
                    handler.read_f64(buf)
                }
                DataType::Float => {
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(cell);
                    handler.read_f32(buf) as f64
                }
                DataType::Integer => handler.read_i16([cell[0], cell[1]]) as f64,
                DataType::Byte => cell[0] as f64,
            };
        }
    }

    /// Encodes `values` into `out`, narrowing to the cell type.
    ///
    /// Float rounds to single precision; integer and byte cells saturate to
    /// their range and truncate toward zero.
    pub fn encode(&self, values: &[f64], out: &mut Vec<u8>) {
        let handler = self.byte_order.handler();
        out.clear();
        out.reserve(values.len() * self.data_type.size());

        for &value in values {
            match self.data_type {
                DataType::Double => out.extend_from_slice(&handler.write_f64(value)),
                DataType::Float => out.extend_from_slice(&handler.write_f32(value as f32)),
                DataType::Integer => out.extend_from_slice(&handler.write_i16(value as i16)),
                DataType::Byte => out.push(value as u8),
            }
        }
    }

    /// Reads and decodes `row` from `file`
    pub fn read_row<F: RasterFile + ?Sized>(&self, file: &mut F, row: usize) -> Result<Vec<f64>> {
        let mut bytes = vec![0u8; self.row_bytes()];
        file.seek(SeekFrom::Start(self.row_offset(row)))?;
        file.read_exact(&mut bytes)?;

        let mut values = vec![0.0; self.columns];
        self.decode(&bytes, &mut values);
        Ok(values)
    }

    /// Encodes and writes `values` as `row` of `file`
    pub fn write_row<F: RasterFile + ?Sized>(
        &self,
        file: &mut F,
        row: usize,
        values: &[f64],
    ) -> Result<()> {
        let mut bytes = Vec::new();
        self.encode(values, &mut bytes);
        file.seek(SeekFrom::Start(self.row_offset(row)))?;
        file.write_all(&bytes)
    }

    /// Writes `rows` rows of `value` sequentially to `writer`
    pub fn fill<W: Write>(&self, writer: &mut W, rows: usize, value: f64) -> Result<()> {
        let mut bytes = Vec::new();
        self.encode(&vec![value; self.columns], &mut bytes);
        for _ in 0..rows {
            writer.write_all(&bytes)?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn layout(data_type: DataType, byte_order: ByteOrder) -> RowLayout {
        RowLayout::new(3, data_type, byte_order)
    }

    #[test]
    fn test_row_bytes_and_offset() {
        let l = layout(DataType::Integer, ByteOrder::LittleEndian);
        assert_eq!(l.row_bytes(), 6);
        assert_eq!(l.row_offset(4), 24);
    }

    #[test]
    fn test_double_is_lossless() {
        let l = layout(DataType::Double, ByteOrder::BigEndian);
        let values = [0.1, -1.0e300, std::f64::consts::PI];
        let mut bytes = Vec::new();
        l.encode(&values, &mut bytes);
        assert_eq!(bytes.len(), 24);

        let mut decoded = [0.0; 3];
        l.decode(&bytes, &mut decoded);
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_float_rounds_to_single_precision() {
        let l = layout(DataType::Float, ByteOrder::LittleEndian);
        let mut bytes = Vec::new();
        l.encode(&[0.1, 2.5, -7.0], &mut bytes);

        let mut decoded = [0.0; 3];
        l.decode(&bytes, &mut decoded);
        assert_eq!(decoded, [0.1f32 as f64, 2.5, -7.0]);
    }

    #[test]
    fn test_integer_truncates_and_saturates() {
        let l = layout(DataType::Integer, ByteOrder::BigEndian);
        let mut bytes = Vec::new();
        l.encode(&[12.9, -40000.0, 70000.0], &mut bytes);
        assert_eq!(&bytes[0..2], &[0x00, 0x0C]);

        let mut decoded = [0.0; 3];
        l.decode(&bytes, &mut decoded);
        assert_eq!(decoded, [12.0, -32768.0, 32767.0]);
    }

    #[test]
    fn test_byte_is_unsigned() {
        let l = layout(DataType::Byte, ByteOrder::LittleEndian);
        let mut bytes = Vec::new();
        l.encode(&[200.0, -5.0, 300.0], &mut bytes);
        assert_eq!(bytes, vec![200, 0, 255]);

        let mut decoded = [0.0; 3];
        l.decode(&bytes, &mut decoded);
        assert_eq!(decoded, [200.0, 0.0, 255.0]);
    }

    #[test]
    fn test_write_then_read_row_in_place() {
        let l = layout(DataType::Integer, ByteOrder::LittleEndian);
        let mut file = Cursor::new(Vec::new());
        l.fill(&mut file, 4, -1.0).unwrap();
        assert_eq!(file.get_ref().len(), 24);

        l.write_row(&mut file, 2, &[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(l.read_row(&mut file, 1).unwrap(), vec![-1.0; 3]);
        assert_eq!(l.read_row(&mut file, 2).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(l.read_row(&mut file, 3).unwrap(), vec![-1.0; 3]);
    }

    #[test]
    fn test_read_past_end_fails() {
        let l = layout(DataType::Double, ByteOrder::LittleEndian);
        let mut file = Cursor::new(vec![0u8; 24]);
        assert!(l.read_row(&mut file, 1).is_err());
    }
}
