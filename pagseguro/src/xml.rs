//! Ordered XML value model shared by every operation.
//!
//! The provider speaks XML in both directions, with shapes that vary by
//! operation and by how many records a response carries: one `<transaction>`
//! decodes as a nested element, several decode as repeated siblings. This
//! module keeps that looseness contained in one place: [`Value`] is a generic
//! mapping decoded from any well-formed document, [`parse`] turns a response
//! body into it, and [`write_document`] renders a payload back out with the
//! declaration and pretty formatting the provider's examples use.
//!
//! Insertion order is preserved everywhere. Outgoing documents are schema
//! validated by the provider, which cares about element order.

use std::fmt;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

/// Errors produced while decoding provider XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlError {
    /// The body could not be parsed as XML.
    #[error("Malformed XML document: {0}")]
    Malformed(String),
    /// The body parsed but contained no root element.
    #[error("XML document has no root element")]
    NoRoot,
}

/// A decoded XML value.
///
/// Character data becomes [`Value::Text`], an element with children becomes
/// [`Value::Map`], and repeated siblings with the same name collapse into a
/// single [`Value::List`] entry under that name. An element with no content
/// at all decodes as an empty [`Value::Text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Character data of a leaf element.
    Text(String),
    /// Children of an element, in document order.
    Map(Map),
    /// Repeated sibling elements sharing one name.
    List(Vec<Value>),
}

impl Value {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the character data if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Map(_) | Self::List(_) => None,
        }
    }

    /// Returns the children if this is an element with children.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            Self::Text(_) | Self::List(_) => None,
        }
    }

    /// Returns the items if this is a run of repeated siblings.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            Self::Text(_) | Self::Map(_) => None,
        }
    }

    /// True for a text value holding the empty string.
    #[must_use]
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    fn prune(&mut self) {
        match self {
            Self::Text(_) => {}
            Self::Map(map) => map.prune_empty(),
            Self::List(items) => {
                items.retain_mut(|item| {
                    item.prune();
                    !item.is_empty_text()
                });
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Map(map) => write!(f, "{map}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Insertion-ordered mapping from element names to decoded values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when an entry with this name exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    /// Looks up the value for a name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(name, value)| (name == key).then_some(value))
    }

    /// Looks up the value for a name, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find_map(|(name, value)| (name == key).then_some(value))
    }

    /// Looks up the character data under a name.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    /// Walks nested maps along a path of names.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get(first)?;
        for key in rest {
            current = current.as_map()?.get(key)?;
        }
        Some(current)
    }

    /// Sets a value, replacing an existing entry with the same name or
    /// appending a new one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.get_mut(&key) {
            *existing = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Appends a value; a second value under the same name promotes the
    /// entry to a [`Value::List`], the way repeated siblings decode.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.get_mut(&key) {
            match existing {
                Value::List(items) => items.push(value),
                Value::Text(_) | Value::Map(_) => {
                    let first = std::mem::replace(existing, Value::List(Vec::new()));
                    if let Value::List(items) = existing {
                        items.push(first);
                        items.push(value);
                    }
                }
            }
        } else {
            self.entries.push((key, value));
        }
    }

    /// Removes and returns the entry with this name, if any.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Recursively drops entries and list items whose value is an empty
    /// string. Maps and lists that are empty, or become empty, are kept and
    /// still serialize as empty elements.
    pub fn prune_empty(&mut self) {
        self.entries.retain_mut(|(_, value)| {
            value.prune();
            !value.is_empty_text()
        });
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.push(key, value);
        }
        map
    }
}

/// Decodes a document into a mapping keyed by its root element.
///
/// The root stays in the result, so a `<transaction>` response decodes to a
/// map with one `transaction` entry. Attributes are ignored; the provider's
/// payloads do not carry meaningful ones.
///
/// # Errors
///
/// Returns [`XmlError::Malformed`] for bodies that are not well-formed XML
/// and [`XmlError::NoRoot`] for bodies with no element at all.
pub fn parse(input: &str) -> Result<Map, XmlError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut root = Map::new();
    loop {
        match reader
            .read_event()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
        {
            Event::Start(start) => {
                let name = element_name(&start);
                let value = read_children(&mut reader)?;
                root.push(name, value);
            }
            Event::Empty(start) => {
                root.push(element_name(&start), Value::Text(String::new()));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if root.is_empty() {
        return Err(XmlError::NoRoot);
    }
    Ok(root)
}

/// Renders a document with an XML declaration and two-space indentation,
/// one element per line.
///
/// [`Value::List`] renders as repeated siblings named after the entry that
/// holds the list; an empty string or empty map renders as a self-closing
/// element.
#[must_use]
pub fn write_document(root: &str, value: &Value) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, value, 0);
    out
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn read_children(reader: &mut Reader<&[u8]>) -> Result<Value, XmlError> {
    let mut text = String::new();
    let mut children = Map::new();
    loop {
        match reader
            .read_event()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
        {
            Event::Start(start) => {
                let name = element_name(&start);
                let value = read_children(reader)?;
                children.push(name, value);
            }
            Event::Empty(start) => {
                children.push(element_name(&start), Value::Text(String::new()));
            }
            Event::Text(chunk) => {
                let chunk = chunk
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?;
                text.push_str(&chunk);
            }
            Event::CData(chunk) => {
                text.push_str(&String::from_utf8_lossy(&chunk));
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::Malformed(
                    "unexpected end of document".to_string(),
                ));
            }
            _ => {}
        }
    }
    // Mixed content does not occur in provider payloads; children win.
    if children.is_empty() {
        Ok(Value::Text(text))
    } else {
        Ok(Value::Map(children))
    }
}

fn write_element(out: &mut String, name: &str, value: &Value, depth: usize) {
    match value {
        Value::Text(text) => {
            push_indent(out, depth);
            if text.is_empty() {
                out.push('<');
                out.push_str(name);
                out.push_str("/>\n");
            } else {
                out.push('<');
                out.push_str(name);
                out.push('>');
                out.push_str(&escape(text.as_str()));
                out.push_str("</");
                out.push_str(name);
                out.push_str(">\n");
            }
        }
        Value::Map(map) => {
            push_indent(out, depth);
            if map.is_empty() {
                out.push('<');
                out.push_str(name);
                out.push_str("/>\n");
            } else {
                out.push('<');
                out.push_str(name);
                out.push_str(">\n");
                for (child, value) in map.iter() {
                    write_element(out, child, value, depth + 1);
                }
                push_indent(out, depth);
                out.push_str("</");
                out.push_str(name);
                out.push_str(">\n");
            }
        }
        Value::List(items) => {
            for item in items {
                write_element(out, name, item, depth);
            }
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
