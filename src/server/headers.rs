//! Ordered, case-insensitive header storage shared by requests and responses.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Maximum inline headers before heap allocation.
/// Most exchanges carry ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>` because the same names (`Host`, `Content-Type`, ...)
/// repeat across every exchange and cloning an `Arc` is O(1).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Remove CR and LF so a value can never end a header line early.
pub(crate) fn strip_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        warn!(
            length = text.len(),
            "Line breaks removed from header or cookie text"
        );
        Cow::Owned(text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Ordered sequence of `(name, value)` pairs with case-insensitive lookup.
///
/// Entries keep their insertion order and original spelling, so serialization
/// reproduces exactly what was appended. Lookups never distinguish two names
/// that differ only by ASCII case. CR and LF are stripped from names and
/// values on insertion, so every entry serializes to exactly one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: HeaderVec,
}

impl HeaderTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing entries with the same name.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push(Self::entry(name, value.into()));
    }

    fn entry(name: &str, value: String) -> (Arc<str>, String) {
        let value = if value.contains(['\r', '\n']) {
            strip_line_breaks(&value).into_owned()
        } else {
            value
        };
        (Arc::from(strip_line_breaks(name).as_ref()), value)
    }

    /// Replace every entry matching `name` (case-insensitive) with a single one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let entry = Self::entry(name, value.into());
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(&entry.0));
        self.entries.push(entry);
    }

    /// Whether a header with this name exists (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// First value whose name matches (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values whose name matches, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Remove all entries matching `name`, returning how many were dropped.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders one `Name: Value\r\n` line per entry.
impl fmt::Display for HeaderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for HeaderTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut table = HeaderTable::new();
        for (name, value) in iter {
            table.append(name, value);
        }
        table
    }
}
