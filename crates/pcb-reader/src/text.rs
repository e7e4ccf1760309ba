//! Key-value text record decoding (spec.md §4.2, family 1). Bytes are
//! decoded as a single 8-bit codepage — latin-1, since it tolerates any
//! byte — and records are recognized by a sentinel marker before being
//! split into `|KEY=VALUE|` pairs.

use std::collections::HashMap;

/// Decodes raw bytes as latin-1 (every byte maps 1:1 to a `char` below
/// U+0100), stopping at the first NUL since Altium streams pad records.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().take_while(|&&b| b != 0).map(|&b| b as char).collect()
}

/// Splits `text` into records delimited by occurrences of `sentinel`
/// (each occurrence marks the start of the next record's field list),
/// then parses each record's `|KEY=VALUE|` pairs into a map with
/// upper-cased keys.
pub fn split_records_on_sentinel(text: &str, sentinel: &str) -> Vec<HashMap<String, String>> {
    if sentinel.is_empty() {
        return vec![parse_pipe_fields(text)];
    }
    let mut starts: Vec<usize> = text.match_indices(sentinel).map(|(i, _)| i).collect();
    if starts.is_empty() {
        return Vec::new();
    }
    starts.push(text.len());
    let mut records = Vec::with_capacity(starts.len() - 1);
    for window in starts.windows(2) {
        let slice = &text[window[0]..window[1]];
        let fields = parse_pipe_fields(slice);
        if !fields.is_empty() {
            records.push(fields);
        }
    }
    records
}

/// Parses a `|KEY=VALUE|KEY=VALUE|...` run into a map. Tolerates a
/// leading/trailing pipe and empty segments.
pub fn parse_pipe_fields(text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for pair in text.split('|').filter(|s| !s.is_empty()) {
        if let Some((key, value)) = pair.split_once('=') {
            fields.insert(key.to_ascii_uppercase(), value.to_string());
        }
    }
    fields
}

/// Nets6/Data records are separated by NUL bytes rather than a text
/// sentinel; each chunk is still a pipe-field record.
pub fn split_records_on_nul(bytes: &[u8]) -> Vec<HashMap<String, String>> {
    bytes
        .split(|&b| b == 0)
        .filter_map(|chunk| {
            if chunk.is_empty() {
                return None;
            }
            let text = latin1_to_string(chunk);
            let fields = parse_pipe_fields(&text);
            if fields.is_empty() {
                None
            } else {
                Some(fields)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_sentinel_and_parses_fields() {
        let text = "|UNICODE=EXISTS|SOURCEDESIGNATOR=R1|COMMENT=10k|\
                     |UNICODE=EXISTS|SOURCEDESIGNATOR=C1|COMMENT=1uF|";
        let records = split_records_on_sentinel(text, "|UNICODE=EXISTS|");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("SOURCEDESIGNATOR"), Some(&"R1".to_string()));
        assert_eq!(records[1].get("COMMENT"), Some(&"1uF".to_string()));
    }

    #[test]
    fn nul_split_skips_empty_chunks() {
        let mut bytes = b"NAME=VCC|UNIQUEID=AB12".to_vec();
        bytes.push(0);
        bytes.push(0);
        bytes.extend_from_slice(b"NAME=GND|UNIQUEID=CD34");
        let records = split_records_on_nul(&bytes);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("NAME"), Some(&"GND".to_string()));
    }
}
