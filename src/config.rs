//! Construction-time configuration of an acquisition session.

use std::time::Duration;

/// Transport used to talk to the instrument, fixed when the session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Plain-text SCPI queries over a raw TCP socket.
    #[default]
    Scpi,
    /// Form-encoded POSTs to the waveform export page of the built-in
    /// web server.
    Http,
}

/// Sample-range bounds sent as `data:start`/`data:stop` before each fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    /// First sample to transfer, 1-based.
    pub start: u64,
    /// Last sample to transfer; `None` transfers up to the full record length
    /// queried from the instrument.
    pub stop: Option<u64>,
}

impl Default for SampleRange {
    fn default() -> Self {
        SampleRange { start: 1, stop: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeConfig {
    /// Instrument address, `host` or `host:port`. Without an explicit port,
    /// the SCPI transport uses [`crate::DEFAULT_SCPI_PORT`] and the HTTP
    /// transport uses port 80.
    pub host: String,
    pub transport: Transport,
    /// Read/write timeout held for the whole session.
    pub timeout: Duration,
    pub range: SampleRange,
    /// Print the `*IDN?` response right after connecting (SCPI only).
    pub print_idn: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        ScopeConfig {
            host: String::new(),
            transport: Transport::default(),
            timeout: Duration::from_millis(5000),
            range: SampleRange::default(),
            print_idn: false,
        }
    }
}

impl ScopeConfig {
    pub fn new(host: impl Into<String>) -> ScopeConfig {
        ScopeConfig { host: host.into(), ..ScopeConfig::default() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScopeConfig::new("192.168.3.83");
        assert_eq!(config.host, "192.168.3.83");
        assert_eq!(config.transport, Transport::Scpi);
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.range, SampleRange { start: 1, stop: None });
        assert!(!config.print_idn);
    }
}
