//! Waveform preamble parsing and typed access to calibration fields.

use std::collections::HashMap;

use crate::decode::{ByteOrder, Encoding, SampleFormat, Scaling};
use crate::{Error, Result};

/// Prefix of a `wfmoutpre?` response when header reporting is enabled.
const WFMOUTPRE_PREFIX: &str = ":WFMOUTPRE:";

/// Per-acquisition calibration and metadata fields, keyed by field name.
///
/// Values are kept in the instrument's own string encoding; the typed
/// accessors parse the fields the decoder needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformHeader {
    fields: HashMap<String, String>,
}

impl WaveformHeader {
    pub fn new() -> WaveformHeader {
        WaveformHeader::default()
    }

    /// Parses a `wfmoutpre?` response: a semicolon-delimited sequence of
    /// `KEY VALUE` segments, with the `:WFMOUTPRE:` prefix stripped first.
    ///
    /// The value is everything after the first space, so multi-word fields
    /// like WFID survive intact.
    pub fn parse_scpi(response: &str) -> Result<WaveformHeader> {
        let response = response.trim();
        let response = response.strip_prefix(WFMOUTPRE_PREFIX).unwrap_or(response);
        let mut header = WaveformHeader::new();
        for segment in response.split(';') {
            let (key, value) = segment.trim().split_once(' ')
                .ok_or_else(|| Error::MalformedHeader(
                    format!("segment {:?} has no value", segment)))?;
            header.insert(key, value);
        }
        Ok(header)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Adds every field of `other`, overwriting on key collision.
    pub fn extend(&mut self, other: WaveformHeader) {
        self.fields.extend(other.fields);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::MalformedHeader(format!("missing field {:?}", key)))
    }

    fn require_f64(&self, key: &str) -> Result<f64> {
        let value = self.require(key)?;
        value.parse().map_err(|_| Error::MalformedHeader(
            format!("field {} value {:?} is not numeric", key, value)))
    }

    /// Vertical calibration constants, from YMULT/YOFF/YZERO.
    pub fn scaling(&self) -> Result<Scaling> {
        Ok(Scaling {
            mult: self.require_f64("YMULT")?,
            offset: self.require_f64("YOFF")?,
            zero: self.require_f64("YZERO")?,
        })
    }

    /// Curve encoding, from ENCDG.
    pub fn encoding(&self) -> Result<Encoding> {
        match self.require("ENCDG")? {
            "ASCII" => Ok(Encoding::Ascii),
            "BINARY" => Ok(Encoding::Binary),
            other => Err(Error::MalformedHeader(
                format!("unknown encoding {:?}", other))),
        }
    }

    /// Binary element type, from BYT_NR and BN_FMT.
    pub fn sample_format(&self) -> Result<SampleFormat> {
        SampleFormat::from_codes(self.require("BYT_NR")?, self.require("BN_FMT")?)
    }

    /// Binary element byte order, from BYT_OR. Anything other than "MSB"
    /// means least-significant-byte-first.
    pub fn byte_order(&self) -> Result<ByteOrder> {
        Ok(match self.require("BYT_OR")? {
            "MSB" => ByteOrder::Msb,
            _ => ByteOrder::Lsb,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RESPONSE: &str = "\
        :WFMOUTPRE:BYT_NR 2;BIT_NR 16;ENCDG BINARY;BN_FMT RI;BYT_OR MSB;\
        WFID \"Ch1, DC coupling, 100.0mV/div, 4.000us/div, 10000 points\";\
        NR_PT 10000;PT_FMT Y;XINCR 4.0000E-9;XZERO -20.0000E-6;\
        YUNIT \"V\";YMULT 4.0000E-6;YOFF 25.0;YZERO 1.0E-3";

    #[test]
    fn test_parse_scpi() {
        let header = WaveformHeader::parse_scpi(RESPONSE).unwrap();
        assert_eq!(header.get("BYT_NR"), Some("2"));
        assert_eq!(header.get("ENCDG"), Some("BINARY"));
        assert_eq!(header.get("NR_PT"), Some("10000"));
        // multi-word value is preserved past the first space
        assert_eq!(header.get("WFID"),
            Some("\"Ch1, DC coupling, 100.0mV/div, 4.000us/div, 10000 points\""));
        assert_eq!(header.len(), 14);
    }

    #[test]
    fn test_parse_scpi_without_prefix() {
        let header = WaveformHeader::parse_scpi("ENCDG ASCII;NR_PT 500").unwrap();
        assert_eq!(header.get("ENCDG"), Some("ASCII"));
        assert_eq!(header.get("NR_PT"), Some("500"));
    }

    #[test]
    fn test_parse_scpi_malformed_segment() {
        let result = WaveformHeader::parse_scpi("ENCDG ASCII;ORPHAN");
        assert!(matches!(result, Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_scaling() {
        let header = WaveformHeader::parse_scpi(RESPONSE).unwrap();
        let scaling = header.scaling().unwrap();
        assert_eq!(scaling.mult, 4.0e-6);
        assert_eq!(scaling.offset, 25.0);
        assert_eq!(scaling.zero, 1.0e-3);
    }

    #[test]
    fn test_scaling_missing_field() {
        let header = WaveformHeader::parse_scpi("YMULT 1.0;YOFF 0").unwrap();
        assert!(matches!(header.scaling(), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_scaling_non_numeric_field() {
        let header = WaveformHeader::parse_scpi("YMULT 1.0;YOFF 0;YZERO oops").unwrap();
        assert!(matches!(header.scaling(), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_encoding() {
        let mut header = WaveformHeader::new();
        header.insert("ENCDG", "ASCII");
        assert_eq!(header.encoding().unwrap(), Encoding::Ascii);
        header.insert("ENCDG", "BINARY");
        assert_eq!(header.encoding().unwrap(), Encoding::Binary);
        header.insert("ENCDG", "SRIBINARY");
        assert!(matches!(header.encoding(), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_binary_fields() {
        let header = WaveformHeader::parse_scpi(RESPONSE).unwrap();
        assert_eq!(header.sample_format().unwrap(), SampleFormat::I16);
        assert_eq!(header.byte_order().unwrap(), ByteOrder::Msb);
    }

    #[test]
    fn test_byte_order_defaults_to_lsb() {
        let mut header = WaveformHeader::new();
        header.insert("BYT_OR", "LSB");
        assert_eq!(header.byte_order().unwrap(), ByteOrder::Lsb);
        header.insert("BYT_OR", "anything");
        assert_eq!(header.byte_order().unwrap(), ByteOrder::Lsb);
    }

    #[test]
    fn test_extend_overwrites() {
        let mut left = WaveformHeader::new();
        left.insert("ENCDG", "ASCII");
        left.insert("NR_PT", "100");
        let mut right = WaveformHeader::new();
        right.insert("ENCDG", "BINARY");
        left.extend(right);
        assert_eq!(left.get("ENCDG"), Some("BINARY"));
        assert_eq!(left.get("NR_PT"), Some("100"));
    }
}
