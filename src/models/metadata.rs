//! Prefixed key/value metadata carried in `X-*-Meta-*` headers.

use crate::errors::{SwiftError, SwiftResult};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::slice;

pub const CONTAINER_META_PREFIX: &str = "X-Container-Meta-";
pub const OBJECT_META_PREFIX: &str = "X-Object-Meta-";

/// Case-insensitive metadata bag.
///
/// Keys are stored unprefixed, lowercased, with underscores turned into
/// dashes, so `X-Object-Meta-Foo_Bar`, `foo_bar` and `FOO-BAR` all address the
/// same entry. Entries keep their insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    prefix: &'static str,
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Empty bag using `prefix` for header names.
    pub fn with_prefix(prefix: &'static str) -> Self {
        Self {
            prefix,
            entries: Vec::new(),
        }
    }

    pub fn container() -> Self {
        Self::with_prefix(CONTAINER_META_PREFIX)
    }

    pub fn object() -> Self {
        Self::with_prefix(OBJECT_META_PREFIX)
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Replace every entry with `entries`.
    pub fn replace<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.entries.clear();
        self.add(entries);
    }

    /// Add `entries` on top of the current set, overwriting equal keys.
    pub fn add<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.set(key.as_ref(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = self.normalize_key(key);
        self.position(&key).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = self.normalize_key(key);
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set from a multi-valued source (e.g. repeated headers); only the first
    /// value is kept. Nothing is stored when `values` is empty.
    pub fn set_first<I, V>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        if let Some(value) = values.into_iter().next() {
            self.set(key, value);
        }
    }

    pub fn has(&self, key: &str) -> bool {
        let key = self.normalize_key(key);
        self.position(&key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let key = self.normalize_key(key);
        self.position(&key).map(|idx| self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter(self.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` starts with this bag's prefix (ASCII case-insensitive).
    pub fn is_prefixed_key(&self, name: &str) -> bool {
        name.len() >= self.prefix.len()
            && name.as_bytes()[..self.prefix.len()].eq_ignore_ascii_case(self.prefix.as_bytes())
    }

    /// Entries as fully-qualified, title-cased header names, e.g.
    /// `foo-bar` becomes `X-Object-Meta-Foo-Bar`.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (self.header_name(key), value.clone()))
            .collect()
    }

    /// Same as [`Metadata::headers`], converted for an outgoing request.
    pub fn header_map(&self) -> SwiftResult<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in self.headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| SwiftError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| SwiftError::InvalidHeader(format!("{}: {}", name, value)))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == normalized)
    }

    fn unprefixed<'a>(&self, key: &'a str) -> &'a str {
        if self.is_prefixed_key(key) {
            &key[self.prefix.len()..]
        } else {
            key
        }
    }

    fn normalize_key(&self, key: &str) -> String {
        self.unprefixed(key).to_ascii_lowercase().replace('_', "-")
    }

    fn header_name(&self, key: &str) -> String {
        let prefixed = format!("{}{}", self.prefix, self.unprefixed(key));
        title_case(&prefixed.to_ascii_lowercase())
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::object()
    }
}

/// Uppercase the first letter of every dash-separated segment.
pub(crate) fn title_case(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

/// Diagnostic rendering: one `Name: value` line per entry, sorted by key,
/// values aligned on the longest key.
impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(max) = self.entries.iter().map(|(k, _)| k.len()).max() else {
            return Ok(());
        };
        let width = max + 1;

        let mut sorted: Vec<&(String, String)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in sorted {
            let label = format!("{}:", title_case(name));
            write!(f, "{:<width$} {}\r\n", label, value, width = width)?;
        }
        Ok(())
    }
}

pub struct Iter<'a>(slice::Iter<'a, (String, String)>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
