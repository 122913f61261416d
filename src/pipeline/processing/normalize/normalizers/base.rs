use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::types::{Event, RawEventData, SourceContext, SourceKind};

static POSTAL_CITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4,5}\s+([A-Za-zÀ-ÖØ-öø-ÿ' -]+)").expect("valid postal code regex")
});

/// Base trait for source-specific normalizers.
///
/// Implementations are pure: the same record and context always produce the same event.
pub trait SourceNormalizer: Send + Sync {
    /// Map one raw source record into the canonical event shape
    fn normalize(&self, ctx: &SourceContext, raw: &RawEventData) -> Event;

    /// Get the source family this normalizer handles
    fn kind(&self) -> SourceKind;

    /// Get a human-readable name for this normalizer
    fn name(&self) -> &str;
}

/// Shared field lookups for normalizers
pub struct NormalizerUtils;

impl NormalizerUtils {
    /// First value among `keys` that is present, not null and not an empty string.
    pub fn first_present<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
        let obj = data.as_object()?;
        keys.iter().filter_map(|k| obj.get(*k)).find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }

    /// Like `first_present`, rendered as a string. Numbers are stringified
    /// so numeric ids and slugs work the same way.
    pub fn first_str(data: &Value, keys: &[&str]) -> Option<String> {
        match Self::first_present(data, keys)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Trimmed text, absent when empty after trimming
    pub fn trimmed_text(data: &Value, keys: &[&str]) -> Option<String> {
        Self::first_str(data, keys)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Title with the untitled placeholder as fallback
    pub fn title(data: &Value, keys: &[&str]) -> String {
        Self::trimmed_text(data, keys).unwrap_or_else(|| crate::constants::UNTITLED_EVENT.to_string())
    }

    /// Boolean flag tolerant of `1`/`0` and `"true"`/`"1"` encodings
    pub fn flag(data: &Value, key: &str) -> bool {
        Self::first_present(data, &[key]).map(Self::truthy).unwrap_or(false)
    }

    pub fn truthy(value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Value::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ),
            _ => false,
        }
    }

    /// Image URL from the first candidate present; cover objects carry it under `url`.
    pub fn image_url(data: &Value, keys: &[&str]) -> Option<String> {
        match Self::first_present(data, keys)? {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj
                .get("url")
                .and_then(|u| u.as_str())
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            _ => None,
        }
    }

    /// Trimmed string field of a nested object, empty when missing
    pub fn object_text(obj: &Value, key: &str) -> String {
        obj.get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// Guess the city from a free-text address.
    ///
    /// `..., 75008 Paris, France` yields `Paris`. Without a postal code the
    /// second-to-last comma-separated segment is used; otherwise `None`.
    pub fn city_from_address(address: &str) -> Option<String> {
        if address.trim().is_empty() {
            return None;
        }
        if let Some(caps) = POSTAL_CITY_RE.captures(address) {
            let city = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !city.is_empty() {
                return Some(city.to_string());
            }
        }
        let parts: Vec<&str> = address
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() >= 2 {
            return Some(parts[parts.len() - 2].to_string());
        }
        None
    }
}
