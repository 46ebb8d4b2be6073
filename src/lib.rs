//! A streaming parser for delimited text (CSV and related formats),
//! conforming broadly to RFC 4180 and extending it with configurable
//! quoting, escaping, comments, delimiter/newline auto-detection, header
//! interpretation, and chunked or resumable consumption of in-memory or
//! remote input.
//!
//! The core is a character-at-a-time [`scanner`] state machine driven by a
//! chunk-ingesting [`streamer::Streamer`]; delimiter auto-detection
//! ([`detect`]) and header projection ([`header`]) sit between them.
//!
//! ```
//! use delimited_stream::{parse_str, Config};
//!
//! let summary = parse_str(b"a,b,c\nd,e,f\n", Config::new()).unwrap();
//! assert_eq!(summary.data.len(), 2);
//! ```
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod detect;
pub mod error;
pub mod header;
pub mod model;
pub mod newline;
pub mod scanner;
pub mod streamer;
pub mod transport;

pub use config::{Config, Defaults, SkipEmptyLines};
pub use error::{FatalError, ParseError, ParseErrorCode, ParseErrorType};
pub use model::{ParseMeta, ParsedRow, Record, Row};
pub use newline::Newline;
pub use scanner::AbortFlag;
pub use streamer::{Callbacks, ParseSummary, Streamer};
pub use transport::{RangeRequest, RangeResponse, Transport, TransportError};

/// Parse an in-memory buffer to completion, accumulating all rows into the
/// returned [`ParseSummary`]. Equivalent to [`Streamer::run_str`] with no
/// step/chunk callbacks.
pub fn parse_str(input: &[u8], config: Config) -> Result<ParseSummary, FatalError> {
    Streamer::run_str(input, config, &mut Callbacks::none())
}

/// Parse an in-memory buffer with caller-supplied step/chunk callbacks. See
/// [`Streamer::run_str`].
pub fn parse_str_with_callbacks(input: &[u8], config: Config, callbacks: &mut Callbacks) -> Result<ParseSummary, FatalError> {
    Streamer::run_str(input, config, callbacks)
}

/// Parse a remote resource fetched in byte-range chunks through `transport`.
/// See [`Streamer::run_remote`].
pub fn parse_remote(
    resource: &str,
    transport: &dyn Transport,
    config: Config,
    callbacks: &mut Callbacks,
) -> Result<ParseSummary, FatalError> {
    Streamer::run_remote(resource, transport, config, callbacks)
}

/// Parse an in-memory buffer, overriding the process-wide `REMOTE_CHUNK_SIZE`/
/// `DEFAULT_DELIMITER` values for this parse only. See
/// [`Streamer::run_str_with_defaults`].
pub fn parse_str_with_defaults(
    input: &[u8],
    config: Config,
    defaults: Defaults,
) -> Result<ParseSummary, FatalError> {
    Streamer::run_str_with_defaults(input, config, defaults, &mut Callbacks::none())
}

/// Parse a remote resource, overriding the process-wide `REMOTE_CHUNK_SIZE`/
/// `DEFAULT_DELIMITER` values for this parse only. See
/// [`Streamer::run_remote_with_defaults`].
pub fn parse_remote_with_defaults(
    resource: &str,
    transport: &dyn Transport,
    config: Config,
    defaults: Defaults,
    callbacks: &mut Callbacks,
) -> Result<ParseSummary, FatalError> {
    Streamer::run_remote_with_defaults(resource, transport, config, defaults, callbacks)
}
