//! Document information dictionary.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object};
use chrono::{DateTime, FixedOffset, Local};
use indexmap::IndexMap;

const TRAPPED_VALUES: [&str; 3] = ["True", "False", "Unknown"];

/// Entries of the `Info` dictionary.
///
/// `Producer` starts out as the crate name. `CreationDate` and `ModDate` are owned
/// by the writer and stamped when the document is finished.
#[derive(Debug, Clone)]
pub struct DocumentInformation {
    entries: IndexMap<String, String>,
    creation_date: Option<DateTime<FixedOffset>>,
    modification_date: Option<DateTime<FixedOffset>>,
}

impl Default for DocumentInformation {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentInformation {
    /// Information with only the producer filled in.
    pub fn new() -> Self {
        let mut entries = IndexMap::new();
        entries.insert("Producer".to_string(), env!("CARGO_PKG_NAME").to_string());
        Self {
            entries,
            creation_date: None,
            modification_date: None,
        }
    }

    /// Set an entry such as `Title`, `Author` or `Trapped`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if is_date_key(key) {
            return Err(Error::InvalidArgument(format!("{} must not be set manually", key)));
        }
        if key == "Trapped" && !TRAPPED_VALUES.contains(&value.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "Trapped must be True, False or Unknown, got {:?}",
                value
            )));
        }

        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    /// Get an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Remove an entry, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Whether an entry is present.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Creation date, once stamped.
    pub fn creation_date(&self) -> Option<DateTime<FixedOffset>> {
        self.creation_date
    }

    /// Modification date, once stamped.
    pub fn modification_date(&self) -> Option<DateTime<FixedOffset>> {
        self.modification_date
    }

    /// Set both dates to `at`, or to the current local time.
    pub(crate) fn stamp(&mut self, at: Option<DateTime<FixedOffset>>) {
        let at = at.unwrap_or_else(|| {
            let now = Local::now();
            now.with_timezone(now.offset())
        });
        self.creation_date = Some(at);
        self.modification_date = Some(at);
    }

    /// Build the dictionary to write.
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        for (key, value) in &self.entries {
            let object = if key == "Trapped" {
                Object::name(value.as_str())
            } else {
                Object::LiteralString(encode_text_string(value))
            };
            dict.insert(key.clone(), object);
        }

        if let Some(date) = self.creation_date {
            dict.insert("CreationDate".to_string(), Object::literal(format_date(&date)));
        }
        if let Some(date) = self.modification_date {
            dict.insert("ModDate".to_string(), Object::literal(format_date(&date)));
        }
        dict
    }
}

fn is_date_key(key: &str) -> bool {
    key == "CreationDate" || key == "ModDate"
}

/// Encode a text string: printable ASCII as is, anything else as UTF-16BE with BOM.
pub fn encode_text_string(value: &str) -> Vec<u8> {
    if value.bytes().all(|byte| (0x20..0x7F).contains(&byte)) {
        return value.as_bytes().to_vec();
    }

    let mut encoded = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        encoded.extend_from_slice(&unit.to_be_bytes());
    }
    encoded
}

/// Format a date as `D:YYYYMMDDHHmmSS` followed by `Z` or `+HH'mm'`.
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    let mut formatted = date.format("D:%Y%m%d%H%M%S").to_string();
    let offset = date.offset().local_minus_utc();
    if offset == 0 {
        formatted.push('Z');
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let minutes = offset.abs() / 60;
        formatted.push_str(&format!("{}{:02}'{:02}'", sign, minutes / 60, minutes % 60));
    }
    formatted
}
