//! Header mapping construction
//!
//! A request's header collection is collapsed into an insertion-ordered map
//! keyed by canonical header name. Duplicate names keep their first position
//! and their last value.

use crate::Result;
use bytes::Bytes;
use http::HeaderMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered mapping from canonical header name to header value
///
/// # Examples
///
/// ```
/// use header_echo::HeaderMapping;
///
/// let mapping = HeaderMapping::from_pairs([
///     ("accept", "text/html"),
///     ("x-test", "abc"),
///     ("Accept", "*/*"),
/// ]);
/// assert_eq!(mapping.len(), 2);
/// assert_eq!(mapping.get("accept"), Some("*/*"));
/// assert_eq!(mapping.get("X-Test"), Some("abc"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMapping(IndexMap<String, String>);

impl HeaderMapping {
    /// Creates an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from a parsed header map
    ///
    /// Values that are not valid UTF-8 are converted lossily.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut mapping = Self::new();
        for (name, value) in headers {
            mapping.insert(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        mapping
    }

    /// Builds a mapping from raw (name, value) pairs in wire order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut mapping = Self::new();
        for (name, value) in pairs {
            mapping.insert(name.as_ref(), value.as_ref());
        }
        mapping
    }

    /// Inserts a header, overwriting the value of an existing name in place
    pub fn insert(&mut self, name: &str, value: &str) {
        self.0.insert(canonical_name(name), value.to_string());
    }

    /// Looks up a header value by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&canonical_name(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&canonical_name(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over (name, value) entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Header names in first-seen order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Serializes the mapping as a JSON object
    pub fn to_json(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(&self.0)?))
    }

    /// Decodes a mapping from a JSON object, canonicalizing its keys
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let raw: IndexMap<String, String> = serde_json::from_slice(body)?;
        Ok(Self::from_pairs(raw))
    }
}

impl fmt::Display for HeaderMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name:?}: {value:?}")?;
        }
        f.write_str("}")
    }
}

/// Renders a header name in canonical form
///
/// Every letter that follows a non-letter is upper-cased and every other
/// letter lower-cased, so `x-request-id` becomes `X-Request-Id` and
/// `x-b3traceid` becomes `X-B3Traceid`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut after_letter = false;
    for c in name.chars() {
        if !c.is_alphabetic() {
            after_letter = false;
            out.push(c);
        } else if after_letter {
            out.extend(c.to_lowercase());
        } else {
            after_letter = true;
            out.extend(c.to_uppercase());
        }
    }
    out
}
