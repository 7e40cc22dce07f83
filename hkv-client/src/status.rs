//! # Status Records
//!
//! Turn the text payload of an `INFO` reply into a flat field → value map.
//!
//! Each `name:value` line becomes one field; the value is trimmed and kept as
//! text (no numeric coercion). Lines without a colon, such as `# Server`
//! section headers, are skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fields reported by one status query.
///
/// Serializes as a plain JSON object of string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusRecord {
    fields: BTreeMap<String, String>,
}

impl StatusRecord {
    /// Returns an empty record (the answer to a nil reply).
    pub fn empty() -> Self {
        StatusRecord::default()
    }

    /// Parses a status payload. Duplicate field names keep the last value.
    pub fn parse(payload: &str) -> Self {
        let fields = payload
            .split('\n')
            .filter_map(|line| match line.split_once(':') {
                Some((name, value)) if !name.is_empty() => {
                    Some((name.to_string(), value.trim().to_string()))
                }
                _ => None,
            })
            .collect();
        StatusRecord { fields }
    }

    /// Parses raw payload bytes, replacing invalid UTF-8 sequences.
    pub fn from_payload(payload: &[u8]) -> Self {
        StatusRecord::parse(&String::from_utf8_lossy(payload))
    }

    /// Returns the value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
