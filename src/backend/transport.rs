//! HTTP transport seam for the network-facing backends
//!
//! Abstraction over the blocking HTTP client so adapters can be exercised
//! with scripted responses instead of live endpoints.

use crate::backend::transport_fake::FakeTransport;
use crate::backend::transport_ureq::UreqTransport;
use crate::backend::BackendError;

/// Synchronous HTTP transport
pub trait SyncTransport: Send + Sync {
    /// POST a JSON body and return the full response body
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, BackendError>;

    /// POST a JSON body and hand each response line to `on_line`
    ///
    /// Returns the number of lines delivered. A failure after the first
    /// delivered line surfaces as `BackendError::StreamInterrupted`.
    fn post_stream<F>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        on_line: F,
    ) -> Result<usize, BackendError>
    where
        F: FnMut(&str);
}

/// Concrete transport (enum dispatch; generic methods keep the trait
/// out of `dyn` territory)
#[derive(Debug)]
pub enum Transport {
    Real(UreqTransport),
    Fake(FakeTransport),
}

impl SyncTransport for Transport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, BackendError> {
        match self {
            Transport::Real(t) => t.post_json(url, headers, body),
            Transport::Fake(t) => t.post_json(url, headers, body),
        }
    }

    fn post_stream<F>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        on_line: F,
    ) -> Result<usize, BackendError>
    where
        F: FnMut(&str),
    {
        match self {
            Transport::Real(t) => t.post_stream(url, headers, body, on_line),
            Transport::Fake(t) => t.post_stream(url, headers, body, on_line),
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Transport::Real(UreqTransport::new())
    }
}
