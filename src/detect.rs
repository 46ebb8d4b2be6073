// Delimiter auto-detection: probe a leading sample of input with each
// candidate delimiter and keep the one whose row shapes are most
// consistent.
//
// Grounded on the `estuary-flow` dialect detector (other_examples):
// per-candidate scoring by row count / mean / spread, comparing scores to
// pick a winner, logging candidate scores via `tracing`. Adapted to the
// spec's simpler tie-break rule (lowest deviation, then highest mean, then
// earliest candidate) and to probing with this crate's own Scanner instead
// of the `csv` crate's reader.

use crate::error::{ParseError, ParseErrorCode};
use crate::newline::NewlineConfig;
use crate::scanner::{AbortFlag, ScanConfig, Scanner};

/// Number of non-comment, non-empty logical lines probed per candidate.
const PROBE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy)]
struct CandidateScore {
    /// Average absolute deviation of field count across probed rows.
    deviation: f64,
    /// Average field count across probed rows.
    mean_fields: f64,
    /// Did any probed row have more than one field?
    usable: bool,
}

impl CandidateScore {
    /// Lower deviation wins; ties broken by higher mean field count.
    fn is_better_than(&self, other: &CandidateScore) -> bool {
        if self.deviation != other.deviation {
            return self.deviation < other.deviation;
        }
        self.mean_fields > other.mean_fields
    }
}

fn score_candidate(sample: &[u8], delimiter: &[u8], quote: u8, escape: u8, comment: Option<&[u8]>) -> CandidateScore {
    let config = ScanConfig::new(delimiter.to_vec(), quote, escape, comment.map(|c| c.to_vec()));
    let mut scanner = Scanner::new(config, NewlineConfig::auto());
    let outcome = scanner.scan(sample, 0, true, &AbortFlag::new());

    let field_counts: Vec<usize> = outcome
        .rows
        .iter()
        .filter(|row| !(row.len() == 1 && row[0].is_empty()))
        .take(PROBE_ROWS)
        .map(|row| row.len())
        .collect();

    if field_counts.is_empty() {
        return CandidateScore {
            deviation: f64::INFINITY,
            mean_fields: 0.0,
            usable: false,
        };
    }

    let n = field_counts.len() as f64;
    let mean = field_counts.iter().sum::<usize>() as f64 / n;
    let deviation = field_counts.iter().map(|&c| (c as f64 - mean).abs()).sum::<f64>() / n;
    let usable = field_counts.iter().any(|&c| c > 1);

    CandidateScore {
        deviation,
        mean_fields: mean,
        usable,
    }
}

/// Result of delimiter auto-detection.
pub struct Detection {
    pub delimiter: Vec<u8>,
    pub error: Option<ParseError>,
}

/// Choose a delimiter from `candidates` based on a leading `sample` of the
/// input. Falls back to `default_delimiter` with an `UndetectableDelimiter`
/// error when no candidate ever produces more than one field.
pub fn detect_delimiter(
    sample: &[u8],
    candidates: &[Vec<u8>],
    quote: u8,
    escape: u8,
    comment: Option<&[u8]>,
    default_delimiter: &[u8],
) -> Detection {
    let mut best: Option<(usize, CandidateScore)> = None;

    for (i, candidate) in candidates.iter().enumerate() {
        let score = score_candidate(sample, candidate, quote, escape, comment);
        tracing::debug!(candidate = ?String::from_utf8_lossy(candidate), deviation = score.deviation, mean = score.mean_fields, usable = score.usable, "scored delimiter candidate");

        if !score.usable {
            continue;
        }

        best = match best {
            None => Some((i, score)),
            Some((_, best_score)) if score.is_better_than(&best_score) => Some((i, score)),
            other => other,
        };
    }

    match best {
        Some((i, score)) => {
            tracing::debug!(winner = ?String::from_utf8_lossy(&candidates[i]), ?score, "detected delimiter");
            Detection {
                delimiter: candidates[i].clone(),
                error: None,
            }
        }
        None => {
            tracing::debug!("no candidate delimiter produced more than one field; falling back to default");
            Detection {
                delimiter: default_delimiter.to_vec(),
                error: Some(ParseError::new(ParseErrorCode::UndetectableDelimiter)),
            }
        }
    }
}

impl std::fmt::Debug for CandidateScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateScore")
            .field("deviation", &self.deviation)
            .field("mean_fields", &self.mean_fields)
            .field("usable", &self.usable)
            .finish()
    }
}
