//! Real HTTP transport using ureq
//!
//! Blocking client; streaming responses are consumed line by line so both
//! SSE (`data:` prefixed) and NDJSON bodies flow through the same path.

use std::io::{BufRead, BufReader, Read};
use std::time::Duration;

use tracing::debug;

use crate::backend::transport::SyncTransport;
use crate::backend::BackendError;

/// Real HTTP transport
#[derive(Debug)]
pub struct UreqTransport {
    timeout: Duration,
}

impl UreqTransport {
    /// Default timeout (120s — local engines can be slow to first token)
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(120),
        }
    }

    /// Transport with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn send(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<ureq::Response, BackendError> {
        let mut request = ureq::request("POST", url).timeout(self.timeout);
        for (key, value) in headers {
            request = request.set(key, value);
        }
        debug!(url, body_len = body.len(), "POST");
        let response = request.send_string(body)?;
        debug!(url, status = response.status(), "response");
        Ok(response)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, BackendError> {
        let response = self.send(url, headers, body)?;
        let mut reader = response.into_reader();
        let mut body = String::new();
        reader
            .read_to_string(&mut body)
            .map_err(|e| BackendError::Generation(format!("response read failed: {}", e)))?;
        Ok(body)
    }

    fn post_stream<F>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        mut on_line: F,
    ) -> Result<usize, BackendError>
    where
        F: FnMut(&str),
    {
        let response = self.send(url, headers, body)?;
        let mut reader = BufReader::new(response.into_reader());
        let mut line = String::new();
        let mut delivered = 0usize;

        loop {
            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                // Body broke after the stream began
                BackendError::StreamInterrupted {
                    delivered,
                    reason: e.to_string(),
                }
            })?;
            if bytes == 0 {
                break;
            }
            on_line(line.trim_end());
            delivered += 1;
        }

        Ok(delivered)
    }
}
