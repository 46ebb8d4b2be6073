// Error types: non-fatal ParseError (accumulated, parsing continues) and
// FatalError (short-circuits the parse, delivered to the `error` callback or
// surfaced as a `Result::Err` from a synchronous call).

use thiserror::Error;

/// The broad category of a non-fatal parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorType {
    Quotes,
    Delimiter,
    FieldMismatch,
}

/// The specific condition that produced a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
    MissingQuotes,
    InvalidQuotes,
    UndetectableDelimiter,
    TooFewFields,
    TooManyFields,
}

impl ParseErrorCode {
    pub fn error_type(self) -> ParseErrorType {
        match self {
            ParseErrorCode::MissingQuotes | ParseErrorCode::InvalidQuotes => ParseErrorType::Quotes,
            ParseErrorCode::UndetectableDelimiter => ParseErrorType::Delimiter,
            ParseErrorCode::TooFewFields | ParseErrorCode::TooManyFields => ParseErrorType::FieldMismatch,
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            ParseErrorCode::MissingQuotes => "quoted field unterminated at end of input",
            ParseErrorCode::InvalidQuotes => "invalid closing quote; expected delimiter or newline",
            ParseErrorCode::UndetectableDelimiter => "could not detect delimiter from input sample",
            ParseErrorCode::TooFewFields => "row has fewer fields than the header",
            ParseErrorCode::TooManyFields => "row has more fields than the header",
        }
    }
}

/// A non-fatal parse error: recorded and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub message: String,
    pub row: Option<usize>,
    pub index: Option<usize>,
}

impl ParseError {
    pub fn new(code: ParseErrorCode) -> Self {
        ParseError {
            message: code.default_message().to_string(),
            code,
            row: None,
            index: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn error_type(&self) -> ParseErrorType {
        self.code.error_type()
    }
}

/// A fatal error: transport failure or configuration contradiction. Delivered
/// to the `error` callback; `complete` is not subsequently invoked.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("streaming buffer exceeded {limit} bytes")]
    BufferOverflow { limit: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}
