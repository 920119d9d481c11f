//! Peak list decoding for mzXML
//!
//! mzXML stores each scan's peaks as one Base64 string of interleaved
//! m/z-intensity pairs, optionally zlib compressed. The `<peaks>` attributes
//! describe the layout:
//!
//! 1. Base64 decode the text
//! 2. Decompress if `compressionType="zlib"`
//! 3. Read 32- or 64-bit floats in the declared byte order (`network` is big-endian)
//! 4. Split the pairs into m/z and intensity arrays

use std::io::{Read, Write};

use base64::prelude::*;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

/// Compression of the peak bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    #[default]
    None,
    Zlib,
}

impl CompressionType {
    /// Read the `compressionType` attribute; anything but `zlib` is uncompressed
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("zlib") => CompressionType::Zlib,
            _ => CompressionType::None,
        }
    }
}

/// Floating point width of the peak values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Float32,
    Float64,
}

impl Precision {
    /// Read the `precision` attribute; `64` selects doubles, anything else singles
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("64") => Precision::Float64,
            _ => Precision::Float32,
        }
    }

    pub fn byte_size(&self) -> usize {
        match self {
            Precision::Float32 => 4,
            Precision::Float64 => 8,
        }
    }
}

/// Byte order of the peak values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// `network` order
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    /// Read the `byteOrder` attribute; only `little` selects little-endian
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("little") => ByteOrder::Little,
            _ => ByteOrder::Big,
        }
    }
}

/// Errors that can occur during peak decoding
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Decompression error: {0}")]
    DecompressionError(#[from] std::io::Error),

    #[error("Invalid data length: expected a multiple of {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Decoder for mzXML peak lists
pub struct BinaryDecoder;

impl BinaryDecoder {
    /// Decode a Base64 `<peaks>` payload into a flat value array
    pub fn decode(
        base64_data: &str,
        precision: Precision,
        byte_order: ByteOrder,
        compression: CompressionType,
    ) -> Result<Vec<f64>, BinaryDecodeError> {
        let trimmed = base64_data.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let decoded_bytes = BASE64_STANDARD.decode(trimmed)?;

        let uncompressed = match compression {
            CompressionType::None => decoded_bytes,
            CompressionType::Zlib => {
                let mut decoder = ZlibDecoder::new(&decoded_bytes[..]);
                let mut uncompressed = Vec::new();
                decoder.read_to_end(&mut uncompressed)?;
                uncompressed
            }
        };

        Self::bytes_to_floats(&uncompressed, precision, byte_order)
    }

    /// Decode a payload of interleaved pairs into `(mz, intensity)` arrays
    pub fn decode_peaks(
        base64_data: &str,
        precision: Precision,
        byte_order: ByteOrder,
        compression: CompressionType,
    ) -> Result<(Vec<f64>, Vec<f64>), BinaryDecodeError> {
        let values = Self::decode(base64_data, precision, byte_order, compression)?;
        if values.len() % 2 != 0 {
            return Err(BinaryDecodeError::InvalidLength {
                expected: 2 * precision.byte_size(),
                actual: values.len() * precision.byte_size(),
            });
        }
        let mz = values.iter().step_by(2).copied().collect();
        let intensity = values.iter().skip(1).step_by(2).copied().collect();
        Ok((mz, intensity))
    }

    fn bytes_to_floats(
        bytes: &[u8],
        precision: Precision,
        byte_order: ByteOrder,
    ) -> Result<Vec<f64>, BinaryDecodeError> {
        let byte_size = precision.byte_size();

        if bytes.len() % byte_size != 0 {
            return Err(BinaryDecodeError::InvalidLength {
                expected: byte_size,
                actual: bytes.len(),
            });
        }

        let count = bytes.len() / byte_size;
        let mut values = Vec::with_capacity(count);
        let mut cursor = std::io::Cursor::new(bytes);

        for _ in 0..count {
            let val = match (precision, byte_order) {
                (Precision::Float32, ByteOrder::Big) => cursor.read_f32::<BigEndian>()? as f64,
                (Precision::Float32, ByteOrder::Little) => {
                    cursor.read_f32::<LittleEndian>()? as f64
                }
                (Precision::Float64, ByteOrder::Big) => cursor.read_f64::<BigEndian>()?,
                (Precision::Float64, ByteOrder::Little) => cursor.read_f64::<LittleEndian>()?,
            };
            values.push(val);
        }

        Ok(values)
    }
}

/// Encode `(mz, intensity)` pairs the way `<peaks>` stores them
pub fn encode_peaks(
    mz: &[f64],
    intensity: &[f64],
    precision: Precision,
    byte_order: ByteOrder,
    compression: CompressionType,
) -> Result<String, std::io::Error> {
    let mut bytes = Vec::with_capacity(mz.len() * 2 * precision.byte_size());
    for (&m, &i) in mz.iter().zip(intensity.iter()) {
        for value in [m, i] {
            match (precision, byte_order) {
                (Precision::Float32, ByteOrder::Big) => bytes.write_f32::<BigEndian>(value as f32)?,
                (Precision::Float32, ByteOrder::Little) => {
                    bytes.write_f32::<LittleEndian>(value as f32)?
                }
                (Precision::Float64, ByteOrder::Big) => bytes.write_f64::<BigEndian>(value)?,
                (Precision::Float64, ByteOrder::Little) => bytes.write_f64::<LittleEndian>(value)?,
            }
        }
    }

    let payload = match compression {
        CompressionType::None => bytes,
        CompressionType::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&bytes)?;
            encoder.finish()?
        }
    };
    Ok(BASE64_STANDARD.encode(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_network_float32() {
        // 100.0 and 200.0 as big-endian f32
        let bytes: [u8; 8] = [0x42, 0xc8, 0x00, 0x00, 0x43, 0x48, 0x00, 0x00];
        let base64_data = BASE64_STANDARD.encode(bytes);

        let (mz, intensity) = BinaryDecoder::decode_peaks(
            &base64_data,
            Precision::Float32,
            ByteOrder::Big,
            CompressionType::None,
        )
        .unwrap();

        assert_eq!(mz, vec![100.0]);
        assert_eq!(intensity, vec![200.0]);
    }

    #[test]
    fn test_decode_little_float64() {
        let bytes: [u8; 16] = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x59, 0x40, // 100.0
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x69, 0x40, // 200.0
        ];
        let base64_data = BASE64_STANDARD.encode(bytes);

        let values = BinaryDecoder::decode(
            &base64_data,
            Precision::Float64,
            ByteOrder::Little,
            CompressionType::None,
        )
        .unwrap();

        assert_eq!(values, vec![100.0, 200.0]);
    }

    #[test]
    fn test_decode_empty() {
        let (mz, intensity) = BinaryDecoder::decode_peaks(
            "",
            Precision::Float64,
            ByteOrder::Big,
            CompressionType::Zlib,
        )
        .unwrap();
        assert!(mz.is_empty() && intensity.is_empty());
    }

    #[test]
    fn test_zlib_network_roundtrip() {
        let mz = [400.1, 400.2, 400.3];
        let intensity = [10.0, 2500.5, 7.25];
        let encoded = encode_peaks(
            &mz,
            &intensity,
            Precision::Float64,
            ByteOrder::Big,
            CompressionType::Zlib,
        )
        .unwrap();
        let (dm, di) = BinaryDecoder::decode_peaks(
            &encoded,
            Precision::Float64,
            ByteOrder::Big,
            CompressionType::Zlib,
        )
        .unwrap();
        assert_eq!(dm, mz.to_vec());
        assert_eq!(di, intensity.to_vec());
    }

    #[test]
    fn test_odd_value_count_rejected() {
        let base64_data = BASE64_STANDARD.encode(100.0f32.to_be_bytes());
        let result = BinaryDecoder::decode_peaks(
            &base64_data,
            Precision::Float32,
            ByteOrder::Big,
            CompressionType::None,
        );
        assert!(matches!(result, Err(BinaryDecodeError::InvalidLength { .. })));
    }

    #[test]
    fn test_attribute_defaults() {
        assert_eq!(Precision::from_attribute(None), Precision::Float32);
        assert_eq!(Precision::from_attribute(Some("64")), Precision::Float64);
        assert_eq!(ByteOrder::from_attribute(Some("network")), ByteOrder::Big);
        assert_eq!(ByteOrder::from_attribute(Some("little")), ByteOrder::Little);
        assert_eq!(CompressionType::from_attribute(Some("none")), CompressionType::None);
        assert_eq!(CompressionType::from_attribute(Some("zlib")), CompressionType::Zlib);
    }
}
