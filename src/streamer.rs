// The chunk-ingestion driver: owns the Scanner for the lifetime of a parse,
// carries the cross-chunk tail, runs delimiter detection once, applies
// header projection and skip-empty-lines filtering, enforces preview, and
// dispatches step/chunk callbacks.
//
// Grounded on the teacher's `StreamingParser` (strategy/streaming.rs): a
// buffer that accumulates chunks, a scan position resumed across `feed()`
// calls, and compaction of already-consumed bytes - generalized from a
// byte-buffer-owning NIF resource to a caller-driven chunk loop over
// `Transport` or in-memory slices.

use crate::config::{Config, Defaults, SkipEmptyLines, BOM};
use crate::detect::detect_delimiter;
use crate::error::FatalError;
use crate::header::HeaderProjector;
use crate::model::{ParseMeta, ParsedRow, Row};
use crate::scanner::{AbortFlag, ScanConfig, Scanner};
use crate::transport::{RangeRequest, Transport};

/// Optional per-row / per-chunk callbacks. Accumulation into `data` happens
/// only when neither is set, matching §4.4.
#[derive(Default)]
pub struct Callbacks<'a> {
    pub step: Option<Box<dyn FnMut(ParsedRow, Vec<crate::error::ParseError>, &AbortFlag) + 'a>>,
    pub chunk: Option<Box<dyn FnMut(Vec<ParsedRow>, Vec<crate::error::ParseError>, &AbortFlag) + 'a>>,
    pub before_first_chunk: Option<Box<dyn FnMut(Vec<u8>) -> Vec<u8> + 'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn none() -> Self {
        Callbacks {
            step: None,
            chunk: None,
            before_first_chunk: None,
        }
    }

    fn wants_accumulation(&self) -> bool {
        self.step.is_none() && self.chunk.is_none()
    }
}

/// The accumulated result of a parse.
#[derive(Debug, Default)]
pub struct ParseSummary {
    pub data: Vec<ParsedRow>,
    pub errors: Vec<crate::error::ParseError>,
    pub meta: ParseMeta,
}

/// Whether ingesting a chunk should stop the caller from requesting more
/// input (end-of-input, abort, or preview satisfied).
pub struct IngestOutcome {
    pub finished: bool,
}

pub struct Streamer {
    config: Config,
    defaults: Defaults,
    scanner: Option<Scanner>,
    header: Option<HeaderProjector>,
    abort: AbortFlag,
    tail: Vec<u8>,
    absolute_offset: usize,
    first_chunk: bool,
    data_row_count: usize,
    data: Vec<ParsedRow>,
    errors: Vec<crate::error::ParseError>,
    truncated: bool,
    aborted: bool,
    num_bytes: u64,
    delimiter: Option<Vec<u8>>,
    renamed_headers: Option<Vec<(String, String)>>,
}

impl Streamer {
    pub fn new(config: Config) -> Self {
        Self::with_defaults(config, Defaults::default())
    }

    /// Like [`Streamer::new`], but overriding the process-wide
    /// `REMOTE_CHUNK_SIZE`/`DEFAULT_DELIMITER` values for this parse only.
    pub fn with_defaults(config: Config, defaults: Defaults) -> Self {
        Streamer {
            config,
            defaults,
            scanner: None,
            header: None,
            abort: AbortFlag::new(),
            tail: Vec::new(),
            absolute_offset: 0,
            first_chunk: true,
            data_row_count: 0,
            data: Vec::new(),
            errors: Vec::new(),
            truncated: false,
            aborted: false,
            num_bytes: 0,
            delimiter: None,
            renamed_headers: None,
        }
    }

    pub fn abort_handle(&self) -> AbortFlag {
        self.abort.clone()
    }

    /// Ingest one chunk of text. `is_final` signals end-of-input: the
    /// Scanner no longer withholds a trailing partial row.
    pub fn ingest(&mut self, chunk: &[u8], is_final: bool, callbacks: &mut Callbacks) -> Result<IngestOutcome, FatalError> {
        if self.abort.is_set() {
            self.aborted = true;
            return Ok(IngestOutcome { finished: true });
        }

        let mut owned_chunk;
        let mut chunk = chunk;

        if self.first_chunk {
            let stripped = strip_bom(chunk);
            owned_chunk = stripped.to_vec();
            if self.config.skip_first_n_lines > 0 {
                let kept = skip_leading_lines(&owned_chunk, self.config.skip_first_n_lines as usize);
                owned_chunk = kept.to_vec();
            }
            if let Some(hook) = callbacks.before_first_chunk.as_mut() {
                owned_chunk = hook(owned_chunk);
            }
            chunk = &owned_chunk;
        }

        let mut full = std::mem::take(&mut self.tail);
        full.extend_from_slice(chunk);

        if self.scanner.is_none() {
            let delimiter = match &self.config.delimiter {
                Some(d) if Config::delimiter_is_valid(d) => d.clone(),
                _ => {
                    let detection = detect_delimiter(
                        &full,
                        &self.config.delimiters_to_guess,
                        self.config.quote_char,
                        self.config.escape_char,
                        self.config.comments.as_deref(),
                        &self.defaults.delimiter,
                    );
                    if let Some(err) = detection.error {
                        self.errors.push(err);
                    }
                    detection.delimiter
                }
            };
            tracing::debug!(delimiter = ?String::from_utf8_lossy(&delimiter), "locked delimiter for parse");
            self.delimiter = Some(delimiter);
        }

        let quote = self.config.quote_char;
        let escape = self.config.escape_char;
        let comments = self.config.comments.clone();
        let newline_config = self.config.newline_config();
        let delimiter = self.delimiter.clone().unwrap_or_default();
        let scanner = self.scanner.get_or_insert_with(|| {
            let scan_config = ScanConfig::new(delimiter, quote, escape, comments);
            Scanner::new(scan_config, newline_config)
        });
        let outcome = scanner.scan(&full, self.absolute_offset, !is_final, &self.abort);
        tracing::trace!(rows = outcome.rows.len(), errors = outcome.errors.len(), cursor = outcome.cursor, "scanned chunk");

        let consumed_here = outcome.cursor - self.absolute_offset;
        self.absolute_offset = outcome.cursor;
        self.tail = full[consumed_here..].to_vec();

        if outcome.aborted {
            self.aborted = true;
        }

        let mut chunk_rows: Vec<ParsedRow> = Vec::new();
        let mut chunk_errors: Vec<crate::error::ParseError> = Vec::new();
        let want_accumulate = callbacks.wants_accumulation();

        'rows: for (local_idx, row) in outcome.rows.into_iter().enumerate() {
            let row_errors: Vec<_> = outcome
                .errors
                .iter()
                .filter(|e| e.row == Some(local_idx))
                .cloned()
                .collect();

            if self.config.header && self.header.is_none() {
                self.establish_header(&row);
                continue 'rows;
            }

            if self.is_filtered_empty_line(&row) {
                continue 'rows;
            }

            if self.config.preview > 0 && self.data_row_count >= self.config.preview {
                self.truncated = true;
                break 'rows;
            }

            let data_row_index = self.data_row_count;
            self.data_row_count += 1;

            // Scanner-assigned `.row` is local to this scan() call (counts
            // all rows it committed, including header/filtered ones, reset
            // to 0 each chunk); remap to the data-row index space the rest
            // of the pipeline (and the spec's error contract) uses.
            let row_errors: Vec<_> = row_errors.into_iter().map(|e| e.with_row(data_row_index)).collect();

            let (parsed, mismatch) = self.project(&row, data_row_index);
            let mut errors = row_errors;
            if let Some(e) = mismatch {
                errors.push(e);
            }

            for e in &errors {
                self.errors.push(e.clone());
            }

            if let Some(step) = callbacks.step.as_mut() {
                step(parsed.clone(), errors.clone(), &self.abort);
            }
            if callbacks.chunk.is_some() || want_accumulate {
                chunk_rows.push(parsed.clone());
            }
            chunk_errors.extend(errors);

            if want_accumulate {
                self.data.push(parsed);
            }

            if self.abort.is_set() {
                self.aborted = true;
                break 'rows;
            }
        }

        if let Some(chunk_cb) = callbacks.chunk.as_mut() {
            if !chunk_rows.is_empty() || !chunk_errors.is_empty() {
                chunk_cb(chunk_rows, chunk_errors, &self.abort);
            }
        }

        self.first_chunk = false;
        let finished = is_final || self.aborted || self.truncated;
        Ok(IngestOutcome { finished })
    }

    fn establish_header(&mut self, row: &Row) {
        let (names, renamed) = crate::header::dedup_headers(row);
        self.header = Some(HeaderProjector::new(names));
        if !renamed.is_empty() {
            self.renamed_headers = Some(renamed.clone());
        }
        tracing::debug!(?renamed, "established header row");
    }

    fn is_filtered_empty_line(&self, row: &Row) -> bool {
        match self.config.skip_empty_lines {
            SkipEmptyLines::Disabled => false,
            SkipEmptyLines::Enabled => row.len() == 1 && row[0].is_empty(),
            SkipEmptyLines::Greedy => row.iter().all(|f| f.trim().is_empty()),
        }
    }

    fn project(&self, row: &Row, data_row_index: usize) -> (ParsedRow, Option<crate::error::ParseError>) {
        match &self.header {
            Some(projector) => projector.project(row, data_row_index),
            None => (ParsedRow::Array(row.clone()), None),
        }
    }

    /// Run a complete in-memory parse, splitting `input` into
    /// `config.chunk_size`-sized slices (or one slice if unset).
    pub fn run_str(input: &[u8], config: Config, callbacks: &mut Callbacks) -> Result<ParseSummary, FatalError> {
        Self::run_str_with_defaults(input, config, Defaults::default(), callbacks)
    }

    /// Like [`Streamer::run_str`], overriding `REMOTE_CHUNK_SIZE`/
    /// `DEFAULT_DELIMITER` for this parse via `defaults`.
    pub fn run_str_with_defaults(
        input: &[u8],
        config: Config,
        defaults: Defaults,
        callbacks: &mut Callbacks,
    ) -> Result<ParseSummary, FatalError> {
        let mut streamer = Streamer::with_defaults(config, defaults);
        let chunk_size = streamer.config.chunk_size.unwrap_or(input.len().max(1));
        let mut pos = 0;
        loop {
            let end = (pos + chunk_size).min(input.len());
            let is_final = end >= input.len();
            let outcome = streamer.ingest(&input[pos..end], is_final, callbacks)?;
            pos = end;
            if outcome.finished || pos >= input.len() {
                break;
            }
        }
        Ok(streamer.finish())
    }

    /// Run a complete parse over a remote `Transport`, fetching
    /// `config.chunk_size` (default 5 MiB) byte ranges starting at
    /// `config.offset`.
    pub fn run_remote(
        resource: &str,
        transport: &dyn Transport,
        config: Config,
        callbacks: &mut Callbacks,
    ) -> Result<ParseSummary, FatalError> {
        Self::run_remote_with_defaults(resource, transport, config, Defaults::default(), callbacks)
    }

    /// Like [`Streamer::run_remote`], overriding `REMOTE_CHUNK_SIZE`/
    /// `DEFAULT_DELIMITER` for this parse via `defaults`.
    pub fn run_remote_with_defaults(
        resource: &str,
        transport: &dyn Transport,
        config: Config,
        defaults: Defaults,
        callbacks: &mut Callbacks,
    ) -> Result<ParseSummary, FatalError> {
        let offset = config.offset.unwrap_or(0);
        let chunk_size = config.chunk_size.unwrap_or(defaults.remote_chunk_size) as u64;
        let headers = config.download_request_headers.clone();
        let body = config.download_request_body.clone();
        let with_credentials = config.with_credentials;

        let mut streamer = Streamer::with_defaults(config, defaults);
        streamer.num_bytes = 0;
        let mut start = offset;

        loop {
            let mut request = RangeRequest::new(resource, start, start + chunk_size);
            request.headers = headers.clone();
            request.body = body.clone();
            request.with_credentials = with_credentials;

            let response = transport.fetch_range(request)?;
            streamer.num_bytes += response.bytes_read;
            start += response.bytes_read;

            let outcome = streamer.ingest(response.text.as_bytes(), response.eof, callbacks)?;
            if outcome.finished || response.eof {
                break;
            }
        }

        let mut summary = streamer.finish();
        summary.meta.first_byte = Some(offset);
        Ok(summary)
    }

    pub fn finish(self) -> ParseSummary {
        let meta = ParseMeta {
            delimiter: self.delimiter.unwrap_or_default(),
            newline: self.scanner.as_ref().and_then(|s| s.locked_newline()),
            aborted: self.aborted,
            truncated: self.truncated,
            cursor: self.absolute_offset,
            fields: self.header.as_ref().map(|h| h.headers().to_vec()),
            renamed_headers: self.renamed_headers,
            first_byte: None,
            num_bytes: if self.num_bytes > 0 { Some(self.num_bytes) } else { None },
        };
        ParseSummary {
            data: self.data,
            errors: self.errors,
            meta,
        }
    }
}

fn strip_bom(input: &[u8]) -> &[u8] {
    if input.starts_with(&BOM) {
        &input[BOM.len()..]
    } else {
        input
    }
}

/// Drop the first `n` logical lines from `input`, using newline
/// auto-detection independent of the Streamer's scanner (the dropped lines
/// are never inspected by the Scanner or DelimiterDetector).
fn skip_leading_lines(input: &[u8], n: usize) -> &[u8] {
    use crate::newline::{detect_newline_at, match_newline, NewlineConfig};

    let mut newline = NewlineConfig::auto();
    let mut pos = 0;
    let mut lines_skipped = 0;

    while lines_skipped < n && pos < input.len() {
        pos += match memchr::memchr2(b'\r', b'\n', &input[pos..]) {
            Some(offset) => offset,
            None => break,
        };

        let nl_len = if let Some(nl) = newline.locked() {
            match_newline(input, pos, nl)
        } else if input[pos] == b'\r' || input[pos] == b'\n' {
            let nl = detect_newline_at(input, pos);
            newline.lock(nl);
            Some(nl.len())
        } else {
            None
        };

        match nl_len {
            Some(len) => {
                pos += len;
                lines_skipped += 1;
            }
            None => pos += 1,
        }
    }

    &input[pos..]
}
