use crate::har::Header;
use serde_json::Value;

/// Header object as reported by the browser: name to value, in wire order.
///
/// Repeated headers arrive folded into one value joined by `\n`.
pub type RawHeaders = serde_json::Map<String, Value>;

/// Flatten a raw header object into an ordered header list
pub fn parse_headers(raw: &RawHeaders) -> Vec<Header> {
    raw.iter()
        .flat_map(|(name, value)| {
            header_text(value)
                .split('\n')
                .map(|line| Header {
                    name: name.clone(),
                    value: line.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// First value whose name matches case-insensitively
pub fn get_header_value(raw: &RawHeaders, name: &str) -> Option<String> {
    raw.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| header_text(value))
}

fn header_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
