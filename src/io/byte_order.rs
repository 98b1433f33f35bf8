//! Byte order (endianness) handling
//!
//! Whitebox data sidecars may be written in either byte order; the header
//! records which one. Cells are decoded from and encoded to fixed-width
//! byte arrays through a [`ByteOrderHandler`].

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    #[default]
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

static LITTLE_ENDIAN: LittleEndian = LittleEndian;
static BIG_ENDIAN: BigEndian = BigEndian;

impl ByteOrder {
    /// Interprets a `Byte Order` header value.
    ///
    /// Anything mentioning little, lsb, least or intel is little-endian;
    /// every other value is big-endian.
    pub fn from_header_value(value: &str) -> Self {
        let value = value.to_ascii_lowercase();
        if ["little", "lsb", "least", "intel"]
            .iter()
            .any(|token| value.contains(token))
        {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// Returns the name written to header files
    pub fn header_name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "LITTLE_ENDIAN",
            ByteOrder::BigEndian => "BIG_ENDIAN",
        }
    }

    /// Returns the handler for this byte order
    pub fn handler(&self) -> &'static dyn ByteOrderHandler {
        match self {
            ByteOrder::LittleEndian => &LITTLE_ENDIAN,
            ByteOrder::BigEndian => &BIG_ENDIAN,
        }
    }
}

/// Converts typed values to and from bytes in a specific byte order
pub trait ByteOrderHandler: Send + Sync {
    /// Decodes a signed 16-bit integer
    fn read_i16(&self, buf: [u8; 2]) -> i16;

    /// Decodes a 32-bit floating point number
    fn read_f32(&self, buf: [u8; 4]) -> f32;

    /// Decodes a 64-bit floating point number
    fn read_f64(&self, buf: [u8; 8]) -> f64;

    /// Encodes a signed 16-bit integer
    fn write_i16(&self, value: i16) -> [u8; 2];

    /// Encodes a 32-bit floating point number
    fn write_f32(&self, value: f32) -> [u8; 4];

    /// Encodes a 64-bit floating point number
    fn write_f64(&self, value: f64) -> [u8; 8];
}

struct LittleEndian;

impl ByteOrderHandler for LittleEndian {
    fn read_i16(&self, buf: [u8; 2]) -> i16 {
        i16::from_le_bytes(buf)
    }

    fn read_f32(&self, buf: [u8; 4]) -> f32 {
        f32::from_le_bytes(buf)
    }

    fn read_f64(&self, buf: [u8; 8]) -> f64 {
        f64::from_le_bytes(buf)
    }

    fn write_i16(&self, value: i16) -> [u8; 2] {
        value.to_le_bytes()
    }

    fn write_f32(&self, value: f32) -> [u8; 4] {
        value.to_le_bytes()
    }

    fn write_f64(&self, value: f64) -> [u8; 8] {
        value.to_le_bytes()
    }
}

struct BigEndian;

impl ByteOrderHandler for BigEndian {
    fn read_i16(&self, buf: [u8; 2]) -> i16 {
        i16::from_be_bytes(buf)
    }

    fn read_f32(&self, buf: [u8; 4]) -> f32 {
        f32::from_be_bytes(buf)
    }

    fn read_f64(&self, buf: [u8; 8]) -> f64 {
        f64::from_be_bytes(buf)
    }

    fn write_i16(&self, value: i16) -> [u8; 2] {
        value.to_be_bytes()
    }

    fn write_f32(&self, value: f32) -> [u8; 4] {
        value.to_be_bytes()
    }

    fn write_f64(&self, value: f64) -> [u8; 8] {
        value.to_be_bytes()
    }
}
