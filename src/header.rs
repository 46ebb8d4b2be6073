// Header interpretation: consumes the first emitted row as field names,
// deduplicates them deterministically, and projects subsequent rows into
// keyed records.
//
// Grounded on the teacher's `decode_header_mode`/term-decoding pattern in
// the old `lib.rs` (loosely-typed caller input decoded once into a small
// strongly-typed struct up front) - generalized here from NIF atoms to a
// plain `bool`, with the dedup/mismatch logic built fresh per SPEC_FULL.md
// §4.2 since the teacher had no header concept at all.

use crate::error::{ParseError, ParseErrorCode};
use crate::model::{ParsedRow, Record, Row, PARSED_EXTRA_KEY};

/// Deduplicate `names`, the raw header row. The first occurrence of a name
/// keeps it; later occurrences get the smallest `_N` suffix not already
/// present in the growing set. Returns the deduplicated names plus the
/// mapping from assigned-unique name to its original (only for names that
/// were actually renamed).
pub fn dedup_headers(names: &[String]) -> (Vec<String>, Vec<(String, String)>) {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::with_capacity(names.len());
    let mut renamed = Vec::new();

    for name in names {
        if seen.insert(name.clone()) {
            result.push(name.clone());
            continue;
        }
        let mut n = 1usize;
        let unique = loop {
            let candidate = format!("{name}_{n}");
            if seen.insert(candidate.clone()) {
                break candidate;
            }
            n += 1;
        };
        renamed.push((unique.clone(), name.clone()));
        result.push(unique);
    }

    (result, renamed)
}

/// Projects array rows to header-keyed records once a header has been
/// established.
pub struct HeaderProjector {
    headers: Vec<String>,
}

impl HeaderProjector {
    pub fn new(headers: Vec<String>) -> Self {
        HeaderProjector { headers }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Project a single data row. `data_row_index` is the zero-based index
    /// of this row among emitted data rows (post header, post empty-line
    /// filtering), used to label `TooFewFields`/`TooManyFields`.
    pub fn project(&self, row: &Row, data_row_index: usize) -> (ParsedRow, Option<ParseError>) {
        let header_count = self.headers.len();
        let row_count = row.len();

        if row_count == header_count {
            return (ParsedRow::Record(self.zip_record(row, None)), None);
        }

        if row_count < header_count {
            let record = self.zip_record(&row[..row_count], None);
            let error = ParseError::new(ParseErrorCode::TooFewFields).with_row(data_row_index);
            return (ParsedRow::Record(record), Some(error));
        }

        let surplus = row[header_count..].to_vec();
        let record = self.zip_record(&row[..header_count], Some(surplus));
        let error = ParseError::new(ParseErrorCode::TooManyFields).with_row(data_row_index);
        (ParsedRow::Record(record), Some(error))
    }

    fn zip_record(&self, values: &[String], surplus: Option<Vec<String>>) -> Record {
        let fields = self
            .headers
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect::<Vec<_>>();
        Record {
            fields,
            parsed_extra: surplus,
        }
    }
}
