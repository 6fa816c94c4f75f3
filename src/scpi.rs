//! SCPI instrument-control transport over a raw TCP socket.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::collection::WaveformCollection;
use crate::config::SampleRange;
use crate::decode::{self, Encoding};
use crate::header::WaveformHeader;
use crate::{Error, Result};

/// Port of the raw SCPI socket on Tektronix bench instruments.
pub const DEFAULT_SCPI_PORT: u16 = 4000;

/// Line-oriented SCPI client, generic over the underlying byte stream.
///
/// Commands and responses are `\n`-terminated on both sides; binary curve
/// data arrives as an IEEE 488.2 definite-length block.
#[derive(Debug)]
pub struct ScpiClient<S> {
    stream: S,
}

impl ScpiClient<TcpStream> {
    /// Connects to `host` (with [`DEFAULT_SCPI_PORT`] appended unless the
    /// host string carries an explicit port) and applies `timeout` to
    /// connection setup and to every read and write for the session.
    pub fn connect(host: &str, timeout: Duration) -> Result<ScpiClient<TcpStream>> {
        let target = if host.contains(':') {
            host.to_string()
        } else {
            format!("{}:{}", host, DEFAULT_SCPI_PORT)
        };
        let addr = target.to_socket_addrs()?.next()
            .ok_or_else(|| Error::Transport(format!("cannot resolve {:?}", target)))?;
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        log::info!("connected to {}", addr);
        Ok(ScpiClient::new(stream))
    }
}

impl<S: Read + Write> ScpiClient<S> {
    pub fn new(stream: S) -> ScpiClient<S> {
        ScpiClient { stream }
    }

    pub fn write_line(&mut self, command: &str) -> Result<()> {
        log::debug!("send {:?}", command);
        self.stream.write_all(command.as_bytes())?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8];
        self.stream.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn read_line(&mut self) -> Result<String> {
        let mut response = Vec::new();
        loop {
            match self.read_byte()? {
                b'\n' => break,
                byte => response.push(byte),
            }
        }
        let response = String::from_utf8(response)
            .map_err(|_| Error::Transport("response is not valid UTF-8".to_string()))?;
        Ok(response.trim().to_string())
    }

    pub fn query(&mut self, command: &str) -> Result<String> {
        self.write_line(command)?;
        let response = self.read_line()?;
        log::debug!("recv {:?}", response);
        Ok(response)
    }

    /// Issues a query whose response is an IEEE 488.2 definite-length block:
    /// `#`, one digit giving the length of the length, the length digits,
    /// the payload, and the terminating newline.
    pub fn query_block(&mut self, command: &str) -> Result<Vec<u8>> {
        self.write_line(command)?;
        match self.read_byte()? {
            b'#' => (),
            other => return Err(Error::MalformedSample(
                format!("expected '#' at start of block, got {:?}", other as char))),
        }
        let count = block_digit(self.read_byte()?)?;
        if count == 0 {
            return Err(Error::MalformedSample(
                "indefinite-length blocks are not supported".to_string()));
        }
        let mut length = 0usize;
        for _ in 0..count {
            length = length * 10 + block_digit(self.read_byte()?)?;
        }
        let mut payload = vec![0u8; length];
        self.stream.read_exact(&mut payload)?;
        match self.read_byte()? {
            b'\n' => (),
            other => return Err(Error::MalformedSample(
                format!("expected newline after block, got {:?}", other as char))),
        }
        log::debug!("recv {} byte block", length);
        Ok(payload)
    }

    /// Queries the instrument identification string.
    pub fn identify(&mut self) -> Result<String> {
        self.query("*IDN?")
    }

    /// Fetches the waveform preamble for `source`, toggling verbose/header
    /// reporting on around the query so the response is machine-parseable.
    fn fetch_header(&mut self, source: &str) -> Result<WaveformHeader> {
        self.write_line(&format!("data:source {}", source))?;
        self.write_line("verbose ON;header ON")?;
        let response = self.query("wfmoutpre?")?;
        self.write_line("verbose OFF;header OFF")?;
        WaveformHeader::parse_scpi(&response)
    }

    fn channel_enabled(&mut self, source: &str) -> Result<bool> {
        let response = self.query(&format!("select:{}?", source))?;
        Ok(!response.starts_with('0'))
    }

    fn fetch_channel(&mut self, source: &str, range: SampleRange)
            -> Result<(Vec<f64>, WaveformHeader)> {
        self.write_line(&format!("data:source {}", source))?;
        self.write_line(&format!("data:start {}", range.start))?;
        let stop = match range.stop {
            Some(stop) => stop.to_string(),
            None => self.query("horizontal:recordlength?")?,
        };
        self.write_line(&format!("data:stop {}", stop))?;
        let header = self.fetch_header(source)?;
        if !self.channel_enabled(source)? {
            // the channel is off; empty data plus the header, not an error
            log::debug!("{} is off, returning empty data", source);
            return Ok((Vec::new(), header));
        }
        let scaling = header.scaling()?;
        let samples = match header.encoding()? {
            Encoding::Ascii =>
                decode::decode_ascii(&self.query("curve?")?, scaling)?,
            Encoding::Binary => {
                let format = header.sample_format()?;
                let order = header.byte_order()?;
                decode::decode_binary(&self.query_block("curv?")?, format, order, scaling)?
            }
        };
        Ok((samples, header))
    }

    /// Fetches `sources` one at a time, in request order, as a lazy sequence
    /// of (channel name, decoded samples, header) triples.
    pub fn fetch<'a>(&'a mut self, sources: &'a [&'a str], range: SampleRange)
            -> ChannelReads<'a, S> {
        ChannelReads { client: self, sources: sources.iter(), range }
    }

    /// Queries the identity once, then folds every requested channel into one
    /// collection. Each iteration overwrites the shared header, so the final
    /// header is the last channel's.
    pub fn acquire(&mut self, sources: &[&str], range: SampleRange)
            -> Result<WaveformCollection> {
        let mut collection = WaveformCollection::new();
        collection.set_idn(self.identify()?);
        for read in self.fetch(sources, range) {
            let (source, samples, header) = read?;
            collection.insert(source, samples);
            collection.set_header(header);
        }
        Ok(collection)
    }
}

fn block_digit(byte: u8) -> Result<usize> {
    (byte as char).to_digit(10)
        .map(|digit| digit as usize)
        .ok_or_else(|| Error::MalformedSample(
            format!("expected digit in block length, got {:?}", byte as char)))
}

/// Lazy per-channel fetch sequence returned by [`ScpiClient::fetch`].
pub struct ChannelReads<'a, S> {
    client: &'a mut ScpiClient<S>,
    sources: std::slice::Iter<'a, &'a str>,
    range: SampleRange,
}

impl<'a, S: Read + Write> Iterator for ChannelReads<'a, S> {
    type Item = Result<(String, Vec<f64>, WaveformHeader)>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.sources.next()?;
        Some(self.client.fetch_channel(source, self.range)
            .map(|(samples, header)| (source.to_string(), samples, header)))
    }
}
