//! Decodes raw curve responses into physical-unit samples.

use crate::{Error, Result};

/// Encoding of the curve response, from the ENCDG header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Binary,
}

/// Byte order of binary elements, from the BYT_OR header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Msb,
    Lsb,
}

/// Element type of a binary curve, from the (BYT_NR, BN_FMT) header fields.
///
/// RI is signed integer, RP is unsigned ("positive") integer, FP is IEEE
/// floating point. Floating point elements only exist in 4 and 8 byte widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    I8, U8,
    I16, U16,
    I32, U32, F32,
    I64, U64, F64,
}

impl SampleFormat {
    pub fn from_codes(width: &str, format: &str) -> Result<SampleFormat> {
        match (width, format) {
            ("1", "RI") => Ok(SampleFormat::I8),
            ("1", "RP") => Ok(SampleFormat::U8),
            ("2", "RI") => Ok(SampleFormat::I16),
            ("2", "RP") => Ok(SampleFormat::U16),
            ("4", "RI") => Ok(SampleFormat::I32),
            ("4", "RP") => Ok(SampleFormat::U32),
            ("4", "FP") => Ok(SampleFormat::F32),
            ("8", "RI") => Ok(SampleFormat::I64),
            ("8", "RP") => Ok(SampleFormat::U64),
            ("8", "FP") => Ok(SampleFormat::F64),
            _ => Err(Error::UnsupportedFormat {
                width: width.to_string(),
                format: format.to_string(),
            }),
        }
    }

    /// Element width in bytes.
    pub fn width(self) -> usize {
        match self {
            SampleFormat::I8  | SampleFormat::U8 => 1,
            SampleFormat::I16 | SampleFormat::U16 => 2,
            SampleFormat::I32 | SampleFormat::U32 | SampleFormat::F32 => 4,
            SampleFormat::I64 | SampleFormat::U64 | SampleFormat::F64 => 8,
        }
    }
}

/// Vertical calibration constants, from the YMULT/YOFF/YZERO header fields.
///
/// Converts a raw sample into physical units as
/// `(raw - offset) * mult + zero`. The transform is applied uniformly to both
/// ASCII and binary curve data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub mult: f64,
    pub offset: f64,
    pub zero: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling { mult: 1.0, offset: 0.0, zero: 0.0 }
    }
}

impl Scaling {
    pub fn apply(self, raw: f64) -> f64 {
        (raw - self.offset) * self.mult + self.zero
    }
}

/// Decodes a comma-separated list of numeric literals.
pub fn decode_ascii(text: &str, scaling: Scaling) -> Result<Vec<f64>> {
    text.trim()
        .split(',')
        .map(|token| {
            token.trim().parse::<f64>()
                .map(|raw| scaling.apply(raw))
                .map_err(|_| Error::MalformedSample(
                    format!("not a numeric literal: {:?}", token)))
        })
        .collect()
}

/// Decodes a fixed-width binary element sequence.
pub fn decode_binary(data: &[u8], format: SampleFormat, order: ByteOrder,
                     scaling: Scaling) -> Result<Vec<f64>> {
    let width = format.width();
    if data.len() % width != 0 {
        return Err(Error::MalformedSample(
            format!("{} bytes is not a multiple of the {}-byte element size",
                    data.len(), width)));
    }
    let samples = data.chunks_exact(width)
        .map(|chunk| scaling.apply(raw_value(format, order, chunk)))
        .collect();
    Ok(samples)
}

fn raw_value(format: SampleFormat, order: ByteOrder, chunk: &[u8]) -> f64 {
    // `chunk` is always exactly `format.width()` bytes long.
    fn bytes<const N: usize>(chunk: &[u8]) -> [u8; N] {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(chunk);
        bytes
    }
    use ByteOrder::*;
    use SampleFormat::*;
    match (format, order) {
        (I8, _) => chunk[0] as i8 as f64,
        (U8, _) => chunk[0] as f64,
        (I16, Msb) => i16::from_be_bytes(bytes(chunk)) as f64,
        (I16, Lsb) => i16::from_le_bytes(bytes(chunk)) as f64,
        (U16, Msb) => u16::from_be_bytes(bytes(chunk)) as f64,
        (U16, Lsb) => u16::from_le_bytes(bytes(chunk)) as f64,
        (I32, Msb) => i32::from_be_bytes(bytes(chunk)) as f64,
        (I32, Lsb) => i32::from_le_bytes(bytes(chunk)) as f64,
        (U32, Msb) => u32::from_be_bytes(bytes(chunk)) as f64,
        (U32, Lsb) => u32::from_le_bytes(bytes(chunk)) as f64,
        (F32, Msb) => f32::from_be_bytes(bytes(chunk)) as f64,
        (F32, Lsb) => f32::from_le_bytes(bytes(chunk)) as f64,
        (I64, Msb) => i64::from_be_bytes(bytes(chunk)) as f64,
        (I64, Lsb) => i64::from_le_bytes(bytes(chunk)) as f64,
        (U64, Msb) => u64::from_be_bytes(bytes(chunk)) as f64,
        (U64, Lsb) => u64::from_le_bytes(bytes(chunk)) as f64,
        (F64, Msb) => f64::from_be_bytes(bytes(chunk)),
        (F64, Lsb) => f64::from_le_bytes(bytes(chunk)),
    }
}
