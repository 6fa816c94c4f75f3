//! The merged per-channel result of an acquisition.

use std::ops::Add;

use crate::header::WaveformHeader;
use crate::{Error, Result};

/// Physical-unit samples for one or more channels of a single instrument.
///
/// Holds the instrument identity (`idn`, empty if the transport does not
/// report one), one shared header, and a channel-name to sample-sequence map
/// that preserves insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformCollection {
    idn: String,
    header: WaveformHeader,
    channels: Vec<(String, Vec<f64>)>,
}

impl WaveformCollection {
    pub fn new() -> WaveformCollection {
        WaveformCollection::default()
    }

    /// Instrument identification string; empty if never set.
    pub fn idn(&self) -> &str {
        &self.idn
    }

    pub fn set_idn(&mut self, idn: impl Into<String>) {
        self.idn = idn.into();
    }

    pub fn header(&self) -> &WaveformHeader {
        &self.header
    }

    /// Replaces the shared header. The acquisition loop calls this once per
    /// channel, so after a multi-channel fetch the header reflects the last
    /// channel processed.
    pub fn set_header(&mut self, header: WaveformHeader) {
        self.header = header;
    }

    /// Adds a channel, overwriting its samples if the name is already present
    /// (the original insertion position is kept).
    pub fn insert(&mut self, name: impl Into<String>, samples: Vec<f64>) {
        let name = name.into();
        match self.channels.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = samples,
            None => self.channels.push((name, samples)),
        }
    }

    pub fn channel(&self, name: &str) -> Result<&[f64]> {
        self.channels.iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, samples)| samples.as_slice())
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    /// Channel names in insertion order.
    pub fn sources(&self) -> Vec<&str> {
        self.channels.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Combines two collections acquired from the same instrument.
    ///
    /// The `idn` strings must match exactly (two empty strings match). The
    /// headers are unioned and the channel maps are unioned, with `other`
    /// winning on collision.
    pub fn merge(mut self, other: WaveformCollection) -> Result<WaveformCollection> {
        if self.idn != other.idn {
            return Err(Error::IncompatibleMerge { left: self.idn, right: other.idn });
        }
        self.header.extend(other.header);
        for (name, samples) in other.channels {
            self.insert(name, samples);
        }
        Ok(self)
    }
}

impl Add for WaveformCollection {
    type Output = Result<WaveformCollection>;

    fn add(self, other: WaveformCollection) -> Self::Output {
        self.merge(other)
    }
}
