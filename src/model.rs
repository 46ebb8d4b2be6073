// Row/record/meta data types shared by the scanner, header projector and
// streamer.

use crate::newline::Newline;

/// The reserved field name used to hold surplus values when a row has more
/// fields than the header.
pub const PARSED_EXTRA_KEY: &str = "__parsed_extra";

/// A row of fields, prior to (or instead of) header projection.
pub type Row = Vec<String>;

/// A header-projected row: an ordered sequence of (header, value) pairs plus
/// any surplus fields that didn't fit under a header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub fields: Vec<(String, String)>,
    pub parsed_extra: Option<Vec<String>>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

/// Either an array row or a header-projected record, depending on
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRow {
    Array(Row),
    Record(Record),
}

/// Observable metadata about a completed (or in-progress) parse.
#[derive(Debug, Clone, Default)]
pub struct ParseMeta {
    pub delimiter: Vec<u8>,
    pub newline: Option<Newline>,
    pub aborted: bool,
    pub truncated: bool,
    /// Character offset within the original input after the last fully
    /// parsed row.
    pub cursor: usize,
    pub fields: Option<Vec<String>>,
    pub renamed_headers: Option<Vec<(String, String)>>,
    /// Byte offset of the first byte fetched for this parse (remote input).
    pub first_byte: Option<u64>,
    /// Total bytes fetched for this parse (remote input).
    pub num_bytes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_get_finds_by_key_in_insertion_order_on_duplicates() {
        let record = Record {
            fields: vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ],
            parsed_extra: None,
        };
        assert_eq!(record.get("b"), Some("2"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
