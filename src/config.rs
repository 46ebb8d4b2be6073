// Parse-time configuration. `Config` is the caller-facing builder; it is
// snapshotted into the internal configs each component actually consumes
// (`ScanConfig` for the Scanner, the rest used directly by the Streamer),
// mirroring the teacher's pattern of decoding loosely-typed caller input
// into small strongly-typed structs up front and never re-validating later.

use crate::newline::{Newline, NewlineConfig};

/// Byte values a configured delimiter may never contain.
pub const BAD_DELIMITER_BYTES: [u8; 3] = [b'\r', b'\n', b'"'];

/// UTF-8 byte-order mark. A configured delimiter equal to this whole
/// sequence is also rejected, alongside the single-byte values above.
pub const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

pub const RECORD_SEP: u8 = 0x1E;
pub const UNIT_SEP: u8 = 0x1F;

/// Default candidate delimiters considered by auto-detection.
pub fn default_delimiter_candidates() -> Vec<Vec<u8>> {
    vec![
        b",".to_vec(),
        b"\t".to_vec(),
        b"|".to_vec(),
        b";".to_vec(),
        vec![RECORD_SEP],
        vec![UNIT_SEP],
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipEmptyLines {
    Disabled,
    Enabled,
    Greedy,
}

impl Default for SkipEmptyLines {
    fn default() -> Self {
        SkipEmptyLines::Disabled
    }
}

/// Process-wide defaults, overridable per-parse. The Streamer snapshots
/// these at construction time and never reads them again afterward -
/// overriding a `Defaults` value has no effect on parses already underway.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub remote_chunk_size: usize,
    pub delimiter: Vec<u8>,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            remote_chunk_size: 5 * 1024 * 1024,
            delimiter: b",".to_vec(),
        }
    }
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default remote fetch chunk size (`REMOTE_CHUNK_SIZE`).
    pub fn remote_chunk_size(mut self, size: usize) -> Self {
        self.remote_chunk_size = size;
        self
    }

    /// Override the delimiter auto-detection falls back to when no
    /// candidate is usable (`DEFAULT_DELIMITER`).
    pub fn delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        self.delimiter = delimiter.into();
        self
    }
}

/// Caller-facing parse configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub delimiter: Option<Vec<u8>>,
    pub delimiters_to_guess: Vec<Vec<u8>>,
    pub newline: Option<Newline>,
    pub quote_char: u8,
    pub escape_char: u8,
    pub header: bool,
    pub comments: Option<Vec<u8>>,
    pub skip_empty_lines: SkipEmptyLines,
    pub preview: usize,
    pub skip_first_n_lines: i64,
    pub download: bool,
    pub chunk_size: Option<usize>,
    pub download_request_headers: Vec<(String, String)>,
    pub download_request_body: Option<Vec<u8>>,
    pub with_credentials: bool,
    pub offset: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            delimiter: None,
            delimiters_to_guess: default_delimiter_candidates(),
            newline: None,
            quote_char: b'"',
            escape_char: b'"',
            header: false,
            comments: None,
            skip_empty_lines: SkipEmptyLines::Disabled,
            preview: 0,
            skip_first_n_lines: 0,
            download: false,
            chunk_size: None,
            download_request_headers: Vec::new(),
            download_request_body: None,
            with_credentials: false,
            offset: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn newline(mut self, newline: Newline) -> Self {
        self.newline = Some(newline);
        self
    }

    pub fn quote_char(mut self, quote: u8) -> Self {
        self.quote_char = quote;
        self
    }

    pub fn escape_char(mut self, escape: u8) -> Self {
        self.escape_char = escape;
        self
    }

    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn comments(mut self, comment: impl Into<Vec<u8>>) -> Self {
        let bytes = comment.into();
        self.comments = if bytes.is_empty() { None } else { Some(bytes) };
        self
    }

    pub fn skip_empty_lines(mut self, mode: SkipEmptyLines) -> Self {
        self.skip_empty_lines = mode;
        self
    }

    pub fn preview(mut self, n: usize) -> Self {
        self.preview = n;
        self
    }

    pub fn skip_first_n_lines(mut self, n: i64) -> Self {
        self.skip_first_n_lines = n;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    pub fn download_request_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.download_request_headers = headers;
        self
    }

    pub fn download_request_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.download_request_body = Some(body.into());
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn delimiters_to_guess(mut self, candidates: Vec<Vec<u8>>) -> Self {
        self.delimiters_to_guess = candidates;
        self
    }

    /// The effective newline configuration: fixed if configured, auto
    /// otherwise.
    pub fn newline_config(&self) -> NewlineConfig {
        match self.newline {
            Some(nl) => NewlineConfig::fixed(nl),
            None => NewlineConfig::auto(),
        }
    }

    /// Is `delimiter` usable as-is, or must it fall back to the default
    /// (e.g. because it contains a newline/quote byte, or is the BOM)?
    pub fn delimiter_is_valid(delimiter: &[u8]) -> bool {
        !delimiter.is_empty() && !delimiter.iter().any(|b| BAD_DELIMITER_BYTES.contains(b)) && delimiter != BOM.as_slice()
    }
}
