//! Acquisition orchestration over the configured transport.

use std::net::TcpStream;

use crate::collection::WaveformCollection;
use crate::config::{ScopeConfig, Transport};
use crate::http::HttpClient;
use crate::scpi::ScpiClient;
use crate::{Error, Result};

/// One oscilloscope acquisition session.
///
/// The transport is selected by the configuration when the session is opened
/// and exclusively owned for the session's lifetime. Channels are always
/// fetched sequentially, in the order the caller requests them.
pub struct Oscilloscope {
    config: ScopeConfig,
    link: Link,
}

enum Link {
    Scpi(ScpiClient<TcpStream>),
    Http(HttpClient),
}

impl Oscilloscope {
    pub fn connect(config: ScopeConfig) -> Result<Oscilloscope> {
        let link = match config.transport {
            Transport::Scpi => {
                let mut client = ScpiClient::connect(&config.host, config.timeout)?;
                if config.print_idn {
                    println!("{}", client.identify()?);
                }
                Link::Scpi(client)
            }
            Transport::Http =>
                Link::Http(HttpClient::new(config.host.clone(), config.timeout)),
        };
        Ok(Oscilloscope { config, link })
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// Queries the instrument identification string (SCPI transport only).
    pub fn identify(&mut self) -> Result<String> {
        match &mut self.link {
            Link::Scpi(client) => client.identify(),
            Link::Http(_) => Err(Error::Transport(
                "identification requires the SCPI transport".to_string())),
        }
    }

    /// Fetches the requested channels and returns them as one collection.
    ///
    /// Over SCPI, the identity is queried once and each channel fetch
    /// overwrites the shared header, so the final header is the last
    /// channel's. Over HTTP, each channel yields its own collection and the
    /// results are merged.
    pub fn get_data(&mut self, channels: &[&str]) -> Result<WaveformCollection> {
        match &mut self.link {
            Link::Scpi(client) => client.acquire(channels, self.config.range),
            Link::Http(client) => client.acquire(channels),
        }
    }
}
