//! Ordered multi-valued header container.
//!
//! [`HeaderSet`] keeps entries in insertion order and allows duplicate keys. Rendering it
//! onto the wire sorts the entries in place first, so after a [`HeaderSet::write_to`]
//! the set stays sorted.

use crate::protocol::{Header, ProtocolError};
use crate::utils::normalize_key;
use bytes::BytesMut;
use std::fmt::Display;

/// Values accepted by [`HeaderSet::from_map`], each element becomes its own entry.
pub trait HeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl HeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl HeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl<T: Display> HeaderValues for Vec<T> {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: Display> HeaderValues for &[T] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: Display, const N: usize> HeaderValues for [T; N] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<Header>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from key/values pairs, fanning multi-valued entries out into one
    /// header per value.
    pub fn from_map<I, K, V>(map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: HeaderValues,
    {
        let mut entries = Vec::new();
        for (key, values) in map {
            for value in values.into_header_values() {
                entries.push(Header::new(key.as_ref(), value));
            }
        }
        Self { entries }
    }

    /// Builds a set from `key: value` / `key=value` lines.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = lines.into_iter().map(|line| Header::parse(line.as_ref())).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn has<K: AsRef<str>>(&self, key: K) -> bool {
        let key = normalize_key(key.as_ref());
        self.entries.iter().any(|h| h.key() == key)
    }

    /// Value of the first entry under `key`.
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        let key = normalize_key(key.as_ref());
        self.entries.iter().find(|h| h.key() == key).map(Header::value)
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all<K: AsRef<str>>(&self, key: K) -> Vec<&str> {
        let key = normalize_key(key.as_ref());
        self.entries.iter().filter(|h| h.key() == key).map(Header::value).collect()
    }

    pub fn add<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        self.entries.push(Header::new(key, value));
    }

    /// Drops every entry under `key` and appends a single new one at the end.
    pub fn set<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) -> Vec<Header> {
        let header = Header::new(key, value);
        let removed = self.remove(header.key());
        self.entries.push(header);
        removed
    }

    pub fn remove<K: AsRef<str>>(&mut self, key: K) -> Vec<Header> {
        let key = normalize_key(key.as_ref());
        let (removed, kept) = std::mem::take(&mut self.entries).into_iter().partition(|h| h.key() == key);
        self.entries = kept;
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn sort(&mut self) {
        self.entries.sort();
    }

    pub fn add_all(&mut self, other: &HeaderSet) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|h| h.key().to_owned()).collect()
    }

    pub fn values(&self) -> Vec<String> {
        self.entries.iter().map(|h| h.value().to_owned()).collect()
    }

    pub fn entries(&self) -> Vec<Header> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.entries.iter()
    }

    /// Sorts the set and renders one `key: value\r\n` line per entry.
    pub fn serialize(&mut self) -> String {
        let mut dst = BytesMut::new();
        self.write_to(&mut dst);
        String::from_utf8_lossy(&dst).into_owned()
    }

    /// Sorts the set and appends its wire form to `dst`.
    pub fn write_to(&mut self, dst: &mut BytesMut) {
        self.sort();
        for header in &self.entries {
            dst.reserve(header.key().len() + header.value().len() + 4);
            dst.extend_from_slice(header.key().as_bytes());
            dst.extend_from_slice(b": ");
            dst.extend_from_slice(header.value().as_bytes());
            dst.extend_from_slice(b"\r\n");
        }
    }
}

impl FromIterator<Header> for HeaderSet {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl Extend<Header> for HeaderSet {
    fn extend<T: IntoIterator<Item = Header>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a HeaderSet {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for HeaderSet {
    type Item = Header;
    type IntoIter = std::vec::IntoIter<Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
