//! Fake transport for tests — scripted bodies, stream lines, and failures

use crate::backend::transport::SyncTransport;
use crate::backend::BackendError;

/// Scripted transport: fixed response body, fixed stream lines, optional
/// error injection (up-front or after N delivered lines)
#[derive(Debug, Default)]
pub struct FakeTransport {
    body: String,
    lines: Vec<String>,
    error: Option<BackendError>,
    fail_after_lines: Option<usize>,
}

impl FakeTransport {
    /// Respond to `post_json` with `body`
    pub fn with_body(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Self::default()
        }
    }

    /// Respond to `post_stream` with the given lines, in order
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Fail every request with `error`
    pub fn with_error(error: BackendError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Deliver `count` lines, then break the stream
    pub fn failing_after(lines: &[&str], count: usize) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            fail_after_lines: Some(count),
            ..Self::default()
        }
    }

    /// Also carry a `post_json` body (for adapters that fall back)
    pub fn and_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

impl SyncTransport for FakeTransport {
    fn post_json(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _body: &str,
    ) -> Result<String, BackendError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(self.body.clone())
    }

    fn post_stream<F>(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _body: &str,
        mut on_line: F,
    ) -> Result<usize, BackendError>
    where
        F: FnMut(&str),
    {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let mut delivered = 0usize;
        for line in &self.lines {
            if self.fail_after_lines == Some(delivered) {
                return Err(BackendError::StreamInterrupted {
                    delivered,
                    reason: "scripted stream failure".to_string(),
                });
            }
            on_line(line);
            delivered += 1;
        }
        if self.fail_after_lines == Some(delivered) {
            return Err(BackendError::StreamInterrupted {
                delivered,
                reason: "scripted stream failure".to_string(),
            });
        }
        Ok(delivered)
    }
}
