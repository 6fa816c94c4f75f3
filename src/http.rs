//! HTTP file-export transport using the instrument's built-in web server.

use std::time::Duration;

use crate::collection::WaveformCollection;
use crate::header::WaveformHeader;
use crate::{Error, Result};

/// Path of the waveform export page.
const EXPORT_PATH: &str = "/data/mdo_data4.html";

/// The export preamble is at most this many lines, fewer if terminated by a
/// "Label" sentinel line.
const PREAMBLE_LINES: usize = 21;

/// Fetches spreadsheet-format waveform exports over HTTP, one channel per
/// round-trip.
pub struct HttpClient {
    host: String,
    agent: ureq::Agent,
}

impl HttpClient {
    /// `host` may carry an explicit port; otherwise port 80 is used.
    pub fn new(host: impl Into<String>, timeout: Duration) -> HttpClient {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        HttpClient { host: host.into(), agent }
    }

    /// Requests one channel as a spreadsheet-format export and parses the
    /// response body into a collection. Anything but a 200 response is a
    /// transport error.
    pub fn fetch(&self, channel: &str) -> Result<WaveformCollection> {
        let url = format!("http://{}{}", self.host, EXPORT_PATH);
        log::debug!("POST {} for {}", url, channel);
        let filename = channel.to_uppercase();
        let select = format!("select:control {}", channel.to_lowercase());
        let response = self.agent.post(&url).send_form(&[
            ("WFMFILENAME", filename.as_str()),
            ("WFMFILEEXT", "csv"),
            ("command", select.as_str()),
            ("command1", "save:waveform:fileformat spreadsheet"),
            ("wfmsend", "Get"),
        ]);
        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) =>
                return Err(Error::Transport(format!("device returned HTTP status {}", code))),
            Err(error) =>
                return Err(Error::Transport(error.to_string())),
        };
        let body = response.into_string().map_err(Error::Io)?;
        parse_export(&body)
    }

    /// Fetches every requested channel in order and merges the per-channel
    /// collections. A failure on any channel aborts the whole request.
    pub fn acquire(&self, channels: &[&str]) -> Result<WaveformCollection> {
        let mut collection = None;
        for channel in channels {
            let fetched = self.fetch(channel)?;
            collection = Some(match collection {
                None => fetched,
                Some(collection) => (collection + fetched)?,
            });
        }
        Ok(collection.unwrap_or_default())
    }
}

/// Parses a spreadsheet-format export body.
///
/// The preamble is up to [`PREAMBLE_LINES`] lines of `key,value` pairs; a
/// line whose first field is "Label" ends it early, and blank lines or lines
/// with any other field count are skipped. The line after the preamble is the
/// column-label row; the rest is a numeric table whose columns map
/// positionally to the labels.
pub fn parse_export(text: &str) -> Result<WaveformCollection> {
    let mut lines = text.lines();
    let mut header = WaveformHeader::new();
    for _ in 0..PREAMBLE_LINES {
        let Some(line) = lines.next() else { break };
        let fields: Vec<&str> = line.trim().split(',').collect();
        if fields[0] == "Label" {
            break;
        }
        if fields.len() == 2 && !fields[0].is_empty() {
            header.insert(fields[0], fields[1]);
        }
    }
    let labels: Vec<&str> = lines.next()
        .ok_or_else(|| Error::MalformedHeader(
            "export is missing the column label row".to_string()))?
        .trim().split(',').map(str::trim).collect();
    let mut columns = vec![Vec::new(); labels.len()];
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != labels.len() {
            return Err(Error::MalformedSample(
                format!("row has {} fields, expected {}", cells.len(), labels.len())));
        }
        for (column, cell) in columns.iter_mut().zip(&cells) {
            let value = cell.trim().parse::<f64>()
                .map_err(|_| Error::MalformedSample(
                    format!("not a numeric literal: {:?}", cell)))?;
            column.push(value);
        }
    }
    let mut collection = WaveformCollection::new();
    collection.set_header(header);
    for (label, column) in labels.into_iter().zip(columns) {
        collection.insert(label, column);
    }
    Ok(collection)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    const EXPORT: &str = "\
        Model,MDO3014\n\
        Firmware Version,1.26\n\
        \n\
        Point Format,Y,extra\n\
        Record Length,5\n\
        Sample Interval,4e-9\n\
        Label,\n\
        TIME,CH1\n\
        0.0,1.5\n\
        4e-9,2.5\n\
        8e-9,-0.5\n";

    #[test]
    fn test_parse_export() {
        let data = parse_export(EXPORT).unwrap();
        assert_eq!(data.idn(), "");
        assert_eq!(data.header().get("Model"), Some("MDO3014"));
        assert_eq!(data.header().get("Record Length"), Some("5"));
        // blank lines and lines with more than two fields are skipped
        assert_eq!(data.header().get("Point Format"), None);
        assert_eq!(data.sources(), vec!["TIME", "CH1"]);
        assert_eq!(data.channel("TIME").unwrap(), &[0.0, 4e-9, 8e-9]);
        assert_eq!(data.channel("CH1").unwrap(), &[1.5, 2.5, -0.5]);
    }

    #[test]
    fn test_parse_export_label_sentinel_stops_preamble() {
        // the sentinel ends the preamble well before the 21-line budget;
        // everything after it is labels and data, not header fields
        let data = parse_export("\
            Model,MDO3014\n\
            Label,\n\
            CH2\n\
            7.0\n\
            8.0\n").unwrap();
        assert_eq!(data.header().len(), 1);
        assert_eq!(data.sources(), vec!["CH2"]);
        assert_eq!(data.channel("CH2").unwrap(), &[7.0, 8.0]);
    }

    #[test]
    fn test_parse_export_full_preamble_budget() {
        let mut text = String::new();
        for index in 0..21 {
            text.push_str(&format!("Field {},{}\n", index, index));
        }
        text.push_str("CH1\n1.0\n");
        let data = parse_export(&text).unwrap();
        assert_eq!(data.header().len(), 21);
        assert_eq!(data.header().get("Field 20"), Some("20"));
        assert_eq!(data.channel("CH1").unwrap(), &[1.0]);
    }

    #[test]
    fn test_parse_export_missing_label_row() {
        let result = parse_export("Model,MDO3014\n");
        assert!(matches!(result, Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_parse_export_bad_cell() {
        let result = parse_export("Label,\nCH1\nnot-a-number\n");
        assert!(matches!(result, Err(Error::MalformedSample(_))));
    }

    #[test]
    fn test_parse_export_ragged_row() {
        let result = parse_export("Label,\nTIME,CH1\n1.0\n");
        assert!(matches!(result, Err(Error::MalformedSample(_))));
    }

    /// Serves one canned HTTP response per body and reports the request text
    /// back through the channel.
    fn serve(bodies: Vec<&'static str>, status: &'static str)
            -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            for body in bodies {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut byte = [0u8];
                while !request.ends_with(b"\r\n\r\n") {
                    stream.read_exact(&mut byte).unwrap();
                    request.push(byte[0]);
                }
                let request = String::from_utf8(request).unwrap();
                let content_length: usize = request.lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse().unwrap())
                    })
                    .unwrap_or(0);
                let mut content = vec![0u8; content_length];
                stream.read_exact(&mut content).unwrap();
                sender.send(request + &String::from_utf8(content).unwrap()).unwrap();
                let response = format!("HTTP/1.1 {}\r\n\
                    Content-Length: {}\r\n\
                    Connection: close\r\n\r\n{}", status, body.len(), body);
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        (addr, receiver)
    }

    #[test]
    fn test_fetch() {
        let (addr, requests) = serve(vec![EXPORT], "200 OK");
        let client = HttpClient::new(addr, Duration::from_secs(5));
        let data = client.fetch("ch1").unwrap();
        assert_eq!(data.channel("CH1").unwrap(), &[1.5, 2.5, -0.5]);
        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /data/mdo_data4.html"));
        assert!(request.contains("WFMFILENAME=CH1"));
        assert!(request.contains("WFMFILEEXT=csv"));
        assert!(request.contains("command=select%3Acontrol+ch1"));
        assert!(request.contains("command1=save%3Awaveform%3Afileformat+spreadsheet"));
        assert!(request.contains("wfmsend=Get"));
    }

    #[test]
    fn test_fetch_error_status() {
        let (addr, _requests) = serve(vec!["busy"], "503 Service Unavailable");
        let client = HttpClient::new(addr, Duration::from_secs(5));
        match client.fetch("CH1") {
            Err(Error::Transport(message)) => assert!(message.contains("503")),
            other => panic!("expected Transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_acquire_merges_channels() {
        let (addr, _requests) = serve(vec![
            "Label,\nTIME,CH1\n0.0,1.0\n",
            "Label,\nTIME,CH2\n0.0,2.0\n",
        ], "200 OK");
        let client = HttpClient::new(addr, Duration::from_secs(5));
        let data = client.acquire(&["CH1", "CH2"]).unwrap();
        assert_eq!(data.idn(), "");
        assert_eq!(data.sources(), vec!["TIME", "CH1", "CH2"]);
        assert_eq!(data.channel("CH1").unwrap(), &[1.0]);
        assert_eq!(data.channel("CH2").unwrap(), &[2.0]);
    }

    #[test]
    fn test_acquire_no_channels() {
        let client = HttpClient::new("127.0.0.1:1", Duration::from_secs(5));
        let data = client.acquire(&[]).unwrap();
        assert!(data.is_empty());
    }
}
