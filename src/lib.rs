//! Client library for retrieving waveform data from Tektronix-style digital
//! oscilloscopes, over either a raw SCPI control socket or the waveform export
//! endpoint of the instrument's built-in web server.
//!
//! ```no_run
//! use tekscope::{Oscilloscope, ScopeConfig};
//!
//! fn main() -> tekscope::Result<()> {
//!     let mut scope = Oscilloscope::connect(ScopeConfig::new("192.168.3.83"))?;
//!     let data = scope.get_data(&["CH2", "CH1"])?;
//!     println!("{:?}", data.sources());
//!     println!("{:?}", data.channel("CH1")?);
//!     println!("{:?}", data.header());
//!     Ok(())
//! }
//! ```

mod config;
mod header;
mod decode;
mod collection;
mod scpi;
mod http;
mod device;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Protocol-level transport failure, including a non-OK HTTP status.
    #[error("transport error: {0}")]
    Transport(String),
    /// Socket-level transport failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Header text does not parse, or a required calibration field is missing
    /// or not numeric.
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// Sample data is not parseable under the encoding the header declares.
    #[error("malformed sample data: {0}")]
    MalformedSample(String),
    /// The (byte width, format code) pair is absent from the decode table.
    #[error("unsupported sample format: BYT_NR {width:?}, BN_FMT {format:?}")]
    UnsupportedFormat { width: String, format: String },
    /// Lookup of a channel that is not part of the collection.
    #[error("no such channel: {0:?}")]
    KeyNotFound(String),
    /// Merge of collections acquired from different instruments.
    #[error("cannot merge data from different instruments ({left:?} vs {right:?})")]
    IncompatibleMerge { left: String, right: String },
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use config::{
    ScopeConfig,
    SampleRange,
    Transport,
};

pub use header::WaveformHeader;

pub use decode::{
    Encoding,
    ByteOrder,
    SampleFormat,
    Scaling,
    decode_ascii,
    decode_binary,
};

pub use collection::WaveformCollection;

pub use scpi::{ScpiClient, ChannelReads, DEFAULT_SCPI_PORT};
pub use http::HttpClient;
pub use device::Oscilloscope;
