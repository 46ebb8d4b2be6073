// The byte-range transport boundary for remote input. Deliberately
// synchronous/blocking: the crate commits to no async runtime (none appears
// anywhere in the example pack this crate is grounded on), so `fetch_range`
// is a plain blocking call. An implementor backed by an async HTTP client is
// free to block on its own executor internally; see SPEC_FULL.md §5.

use thiserror::Error;

/// A request for a byte range `[start, end)` of a remote resource.
#[derive(Debug, Clone)]
pub struct RangeRequest {
    pub resource: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub with_credentials: bool,
    pub start: u64,
    pub end: u64,
}

impl RangeRequest {
    pub fn new(resource: impl Into<String>, start: u64, end: u64) -> Self {
        RangeRequest {
            resource: resource.into(),
            headers: Vec::new(),
            body: None,
            with_credentials: false,
            start,
            end,
        }
    }
}

/// The bytes returned for a `RangeRequest`, decoded as text.
#[derive(Debug, Clone)]
pub struct RangeResponse {
    pub text: String,
    pub bytes_read: u64,
    /// True when fewer bytes than requested were returned, i.e. the
    /// resource is exhausted.
    pub eof: bool,
}

/// Transport failure surfaced to the Streamer's `error` callback (or
/// `Result::Err` for a synchronous call with no callback configured).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("transport request failed: {0}")]
    RequestFailed(String),

    #[error("response was not valid text: {0}")]
    InvalidEncoding(String),
}

/// Minimal byte-range source the Streamer consumes for remote input. The
/// transport itself (HTTP client, retries, TLS) is external to this crate;
/// it implements this trait.
pub trait Transport {
    fn fetch_range(&self, request: RangeRequest) -> Result<RangeResponse, TransportError>;
}

/// An in-memory `Transport`, useful for tests and for embedding a
/// pre-fetched buffer behind the same interface the Streamer uses for
/// genuinely remote sources.
pub struct StaticTransport {
    data: Vec<u8>,
}

impl StaticTransport {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        StaticTransport { data: data.into() }
    }
}

impl Transport for StaticTransport {
    fn fetch_range(&self, request: RangeRequest) -> Result<RangeResponse, TransportError> {
        let start = request.start as usize;
        let len = self.data.len();
        if start >= len {
            return Ok(RangeResponse {
                text: String::new(),
                bytes_read: 0,
                eof: true,
            });
        }
        let end = (request.end as usize).min(len);
        let slice = &self.data[start..end];
        let text = String::from_utf8(slice.to_vec())
            .map_err(|e| TransportError::InvalidEncoding(e.to_string()))?;
        Ok(RangeResponse {
            bytes_read: slice.len() as u64,
            eof: end >= len,
            text,
        })
    }
}
