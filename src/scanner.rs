// The row/field scanner: a character-at-a-time state machine over a text
// buffer. Pure function of its inputs plus the newline auto-detection state
// it carries across calls within one parse (see `NewlineConfig::lock`).
//
// Grounded in the teacher's `StreamingParser::process_buffer` byte-walking
// loop, extended with: configurable quote distinct from escape, comment
// lines, newline auto-detection-then-lock, and precise `InvalidQuotes` /
// `MissingQuotes` error reporting with the `ignoreLastRow` chunk-boundary
// contract.

use crate::error::{ParseError, ParseErrorCode};
use crate::model::Row;
use crate::newline::{detect_newline_at, match_newline, Newline, NewlineConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. The Scanner polls it once per row boundary; the
/// Streamer polls it before requesting the next chunk.
#[derive(Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        AbortFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration snapshot the Scanner operates under for the lifetime of a
/// parse.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub delimiter: Vec<u8>,
    pub quote: u8,
    pub escape: u8,
    pub comment: Option<Vec<u8>>,
}

impl ScanConfig {
    pub fn new(delimiter: Vec<u8>, quote: u8, escape: u8, comment: Option<Vec<u8>>) -> Self {
        ScanConfig {
            delimiter,
            quote,
            escape,
            comment,
        }
    }
}

/// Result of one `Scanner::scan` invocation.
#[derive(Debug)]
pub struct ScanOutcome {
    pub rows: Vec<Row>,
    pub errors: Vec<ParseError>,
    /// Absolute index (within the buffer passed to `scan`) up to which
    /// input has been definitively committed to emitted rows.
    pub cursor: usize,
    pub aborted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unquoted,
    Quoted,
}

pub struct Scanner {
    config: ScanConfig,
    newline: NewlineConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig, newline: NewlineConfig) -> Self {
        Scanner { config, newline }
    }

    /// The newline convention locked so far, if auto-detection has fired.
    pub fn locked_newline(&self) -> Option<Newline> {
        self.newline.locked()
    }

    /// Scan `input`, starting at `base_index` (an offset already consumed
    /// outside this buffer, folded into reported error/cursor positions).
    ///
    /// When `ignore_last_row` is true, the final partial row (or partial
    /// comment line, or unterminated quoted field) is withheld so a later
    /// call on a larger buffer can complete it; the cursor is set to the
    /// start of that withheld content.
    pub fn scan(&mut self, input: &[u8], base_index: usize, ignore_last_row: bool, abort: &AbortFlag) -> ScanOutcome {
        let len = input.len();
        let mut pos = 0usize;
        let mut mode = Mode::Unquoted;
        let mut field_buf: Vec<u8> = Vec::new();
        let mut current_row: Row = Vec::new();
        let mut rows: Vec<Row> = Vec::new();
        let mut errors: Vec<ParseError> = Vec::new();
        let mut row_start = 0usize;
        let mut at_row_start = true;
        let mut committed_cursor = 0usize;
        let mut quote_content_start = 0usize;
        let mut aborted = false;
        let mut awaiting_more_data = false;

        macro_rules! current_row_index {
            () => {
                rows.len()
            };
        }

        'outer: while pos < len {
            if abort.is_set() {
                aborted = true;
                break;
            }

            match mode {
                Mode::Unquoted => {
                    if at_row_start {
                        if let Some(comment) = self.config.comment.clone() {
                            if input[pos..].starts_with(comment.as_slice()) {
                                match self.skip_comment_line(input, pos, ignore_last_row) {
                                    Some(next) => {
                                        pos = next;
                                        row_start = pos;
                                        committed_cursor = pos;
                                        at_row_start = true;
                                        continue 'outer;
                                    }
                                    None => {
                                        // Comment runs to end of buffer with no
                                        // terminating newline observed yet.
                                        if ignore_last_row {
                                            pos = row_start;
                                        } else {
                                            pos = len;
                                            committed_cursor = len;
                                        }
                                        break 'outer;
                                    }
                                }
                            }
                        }
                    }

                    if input[pos..].starts_with(self.config.delimiter.as_slice()) {
                        current_row.push(take_field(&mut field_buf));
                        pos += self.config.delimiter.len();
                        at_row_start = false;
                        continue;
                    }

                    match self.match_or_detect_newline(input, pos, ignore_last_row) {
                        NewlineProbe::Matched(nl_len) => {
                            current_row.push(take_field(&mut field_buf));
                            rows.push(std::mem::take(&mut current_row));
                            pos += nl_len;
                            row_start = pos;
                            committed_cursor = pos;
                            at_row_start = true;
                            continue;
                        }
                        NewlineProbe::NeedsMoreData => {
                            // A lone `\r` sits at the end of the buffer with more
                            // input possibly still to come: can't tell CRLF from
                            // bare CR yet. Withhold the whole in-progress row;
                            // `committed_cursor` still marks its start.
                            awaiting_more_data = true;
                            break 'outer;
                        }
                        NewlineProbe::NotNewline => {}
                    }

                    if field_buf.is_empty() && input[pos] == self.config.quote {
                        mode = Mode::Quoted;
                        pos += 1;
                        quote_content_start = pos;
                        at_row_start = false;
                        continue;
                    }

                    field_buf.push(input[pos]);
                    pos += 1;
                    at_row_start = false;
                }
                Mode::Quoted => {
                    let quote = self.config.quote;
                    let escape = self.config.escape;

                    if escape != quote && input[pos] == escape && input.get(pos + 1) == Some(&quote) {
                        field_buf.push(quote);
                        pos += 2;
                        continue;
                    }
                    if escape == quote && input[pos] == quote && input.get(pos + 1) == Some(&quote) {
                        field_buf.push(quote);
                        pos += 2;
                        continue;
                    }

                    if input[pos] == quote {
                        let close_pos = pos;
                        let mut probe = pos + 1;
                        while probe < len && (input[probe] == b' ' || input[probe] == b'\t') {
                            probe += 1;
                        }

                        if input[probe..].starts_with(self.config.delimiter.as_slice()) {
                            current_row.push(take_field(&mut field_buf));
                            pos = probe + self.config.delimiter.len();
                            mode = Mode::Unquoted;
                            at_row_start = false;
                            continue;
                        }

                        if probe >= len {
                            current_row.push(take_field(&mut field_buf));
                            rows.push(std::mem::take(&mut current_row));
                            pos = probe;
                            committed_cursor = pos;
                            mode = Mode::Unquoted;
                            break 'outer;
                        }

                        match self.match_or_detect_newline(input, probe, ignore_last_row) {
                            NewlineProbe::Matched(nl_len) => {
                                current_row.push(take_field(&mut field_buf));
                                rows.push(std::mem::take(&mut current_row));
                                pos = probe + nl_len;
                                row_start = pos;
                                committed_cursor = pos;
                                mode = Mode::Unquoted;
                                at_row_start = true;
                                continue;
                            }
                            NewlineProbe::NeedsMoreData => {
                                awaiting_more_data = true;
                                break 'outer;
                            }
                            NewlineProbe::NotNewline => {}
                        }

                        errors.push(
                            ParseError::new(ParseErrorCode::InvalidQuotes)
                                .with_row(current_row_index!())
                                .with_index(base_index + close_pos),
                        );
                        field_buf.push(quote);
                        pos += 1;
                        continue;
                    }

                    field_buf.push(input[pos]);
                    pos += 1;
                }
            }
        }

        if !aborted && !awaiting_more_data {
            match mode {
                Mode::Quoted => {
                    if ignore_last_row {
                        pos = row_start;
                    } else {
                        errors.push(
                            ParseError::new(ParseErrorCode::MissingQuotes)
                                .with_row(current_row_index!())
                                .with_index(base_index + quote_content_start),
                        );
                        current_row.push(take_field(&mut field_buf));
                        rows.push(std::mem::take(&mut current_row));
                        committed_cursor = len;
                        pos = len;
                    }
                }
                Mode::Unquoted => {
                    let row_in_progress = !field_buf.is_empty() || !current_row.is_empty();
                    if row_in_progress {
                        if ignore_last_row {
                            pos = row_start;
                        } else {
                            current_row.push(take_field(&mut field_buf));
                            rows.push(std::mem::take(&mut current_row));
                            committed_cursor = len;
                            pos = len;
                        }
                    } else {
                        committed_cursor = len;
                        pos = len;
                    }
                }
            }
        }

        let _ = pos;
        ScanOutcome {
            rows,
            errors,
            cursor: base_index + committed_cursor,
            aborted,
        }
    }

    /// Match a newline at `pos` under the locked convention, or attempt
    /// auto-detection (and lock) if none is locked yet.
    ///
    /// A lone `\r` landing on the very last byte of `input` is ambiguous
    /// when more chunks may still follow (`ignore_last_row`): it could be a
    /// bare CR or the first half of a CRLF pair whose `\n` hasn't arrived
    /// yet. In that case detection is deferred rather than locked, mirroring
    /// the teacher's `feed()` behavior of breaking and letting the next
    /// chunk resolve it.
    fn match_or_detect_newline(&mut self, input: &[u8], pos: usize, ignore_last_row: bool) -> NewlineProbe {
        if let Some(nl) = self.newline.locked() {
            return match match_newline(input, pos, nl) {
                Some(nl_len) => NewlineProbe::Matched(nl_len),
                None => NewlineProbe::NotNewline,
            };
        }
        match input[pos] {
            b'\r' => {
                if input.get(pos + 1).is_some() {
                    let nl = detect_newline_at(input, pos);
                    self.newline.lock(nl);
                    NewlineProbe::Matched(nl.len())
                } else if ignore_last_row {
                    NewlineProbe::NeedsMoreData
                } else {
                    self.newline.lock(Newline::Cr);
                    NewlineProbe::Matched(1)
                }
            }
            b'\n' => {
                self.newline.lock(Newline::Lf);
                NewlineProbe::Matched(1)
            }
            _ => NewlineProbe::NotNewline,
        }
    }

    /// Skip a comment line starting at `pos` (which already matches the
    /// comment marker). Returns the position just after the consumed
    /// newline, or `None` if end-of-input was reached with no newline seen
    /// (including a deferred ambiguous trailing `\r`).
    fn skip_comment_line(&mut self, input: &[u8], pos: usize, ignore_last_row: bool) -> Option<usize> {
        let len = input.len();
        let mut p = pos;
        while p < len {
            p += match memchr::memchr2(b'\r', b'\n', &input[p..]) {
                Some(offset) => offset,
                None => return None,
            };
            match self.match_or_detect_newline(input, p, ignore_last_row) {
                NewlineProbe::Matched(nl_len) => return Some(p + nl_len),
                NewlineProbe::NeedsMoreData => return None,
                NewlineProbe::NotNewline => {}
            }
            p += 1;
        }
        None
    }
}

/// Outcome of probing a byte position for a newline match.
enum NewlineProbe {
    /// Definitely not a newline byte (or the locked convention doesn't start here).
    NotNewline,
    /// A newline of this byte length starts here.
    Matched(usize),
    /// A lone trailing `\r` that can't yet be resolved to CR or CRLF.
    NeedsMoreData,
}

#[inline]
fn take_field(buf: &mut Vec<u8>) -> String {
    let bytes = std::mem::take(buf);
    String::from_utf8_lossy(&bytes).into_owned()
}
