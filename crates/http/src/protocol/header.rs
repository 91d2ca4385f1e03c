use crate::ensure;
use crate::protocol::ProtocolError;
use crate::utils::normalize_key;
use std::fmt;

/// A single header entry.
///
/// The key is trimmed and lower-cased once at construction and never changes, the
/// value is trimmed and may be replaced. Entries order by key first, then value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Header {
    key: String,
    value: String,
}

impl Header {
    pub fn new<K: AsRef<str>, V: AsRef<str>>(key: K, value: V) -> Self {
        Self { key: normalize_key(key.as_ref()), value: value.as_ref().trim().to_owned() }
    }

    /// Parses a `key: value` or `key=value` entry.
    ///
    /// The separator is the first `:` or `=` that is not the leading character, so a
    /// value may itself contain either of them.
    pub fn parse(entry: &str) -> Result<Self, ProtocolError> {
        let split = entry.char_indices().skip(1).find(|&(_, c)| c == ':' || c == '=').map(|(index, _)| index);

        let Some(index) = split else {
            return Err(ProtocolError::InvalidHeader(entry.to_owned()));
        };

        let header = Self::new(&entry[..index], &entry[index + 1..]);
        ensure!(!header.key.is_empty(), ProtocolError::InvalidHeader(entry.to_owned()));
        Ok(header)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value and returns the previous one.
    pub fn set_value<V: AsRef<str>>(&mut self, value: V) -> String {
        std::mem::replace(&mut self.value, value.as_ref().trim().to_owned())
    }

    pub fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
