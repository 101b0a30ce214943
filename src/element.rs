use crate::error::ArbError;
use crate::types::{ArbDate, ArbVersion};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttribLookup<T> {
    Found(T),
    NotFound,
    Invalid(String),
}

impl<T> AttribLookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Stores a found value in `slot`, leaving it untouched otherwise.
    ///
    /// `Ok(true)` found, `Ok(false)` absent, `Err(raw)` unparsable.
    pub fn assign(self, slot: &mut T) -> Result<bool, String> {
        match self {
            Self::Found(v) => {
                *slot = v;
                Ok(true)
            }
            Self::NotFound => Ok(false),
            Self::Invalid(raw) => Err(raw),
        }
    }
}

/// One node of the persisted document.
///
/// Attributes are unique per node and written in name order; children keep
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementNode {
    name: String,
    attribs: BTreeMap<String, String>,
    value: String,
    children: Vec<ElementNode>,
}

impl ElementNode {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl AsRef<str>) {
        self.name = name.as_ref().to_string();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.attribs.clear();
        self.value.clear();
        self.children.clear();
    }

    // Attributes

    pub fn attrib_count(&self) -> usize {
        self.attribs.len()
    }

    pub fn attrib_names(&self) -> impl Iterator<Item = &str> {
        self.attribs.keys().map(String::as_str)
    }

    pub fn attrib(&self, name: &str) -> Option<&str> {
        self.attribs.get(name).map(String::as_str)
    }

    pub fn remove_attrib(&mut self, name: &str) -> bool {
        self.attribs.remove(name).is_some()
    }

    pub fn add_attrib(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.attribs.insert(name.as_ref().to_string(), value.into());
    }

    pub fn add_attrib_bool(&mut self, name: impl AsRef<str>, value: bool) {
        self.add_attrib(name, if value { "y" } else { "n" });
    }

    pub fn add_attrib_int(&mut self, name: impl AsRef<str>, value: i64) {
        self.add_attrib(name, value.to_string());
    }

    pub fn add_attrib_double(&mut self, name: impl AsRef<str>, value: f64, precision: usize) {
        self.add_attrib(name, format_double(value, precision));
    }

    pub fn add_attrib_date(&mut self, name: impl AsRef<str>, value: &ArbDate) -> bool {
        if !value.is_valid() {
            return false;
        }
        self.add_attrib(name, value.to_iso_string());
        true
    }

    pub fn add_attrib_version(&mut self, name: impl AsRef<str>, value: ArbVersion) {
        self.add_attrib(name, value.to_string());
    }

    pub fn get_attrib_string(&self, name: &str) -> AttribLookup<String> {
        match self.attrib(name) {
            Some(v) => AttribLookup::Found(v.to_string()),
            None => AttribLookup::NotFound,
        }
    }

    pub fn read_attrib(&self, name: &str, slot: &mut String) -> bool {
        match self.attrib(name) {
            Some(v) => {
                *slot = v.to_string();
                true
            }
            None => false,
        }
    }

    pub fn get_attrib_bool(&self, name: &str) -> AttribLookup<bool> {
        match self.attrib(name) {
            Some("y") => AttribLookup::Found(true),
            Some("n") => AttribLookup::Found(false),
            Some(other) => AttribLookup::Invalid(other.to_string()),
            None => AttribLookup::NotFound,
        }
    }

    pub fn get_attrib_parsed<T: FromStr>(&self, name: &str) -> AttribLookup<T> {
        match self.attrib(name) {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => AttribLookup::Found(v),
                Err(_) => AttribLookup::Invalid(raw.to_string()),
            },
            None => AttribLookup::NotFound,
        }
    }

    pub fn get_attrib_date(&self, name: &str) -> AttribLookup<ArbDate> {
        match self.attrib(name) {
            Some(raw) => match ArbDate::parse(raw) {
                Some(d) => AttribLookup::Found(d),
                None => AttribLookup::Invalid(raw.to_string()),
            },
            None => AttribLookup::NotFound,
        }
    }

    pub fn get_attrib_version(&self, name: &str) -> AttribLookup<ArbVersion> {
        match self.attrib(name) {
            Some(raw) => match ArbVersion::parse(raw) {
                Some(v) => AttribLookup::Found(v),
                None => AttribLookup::Invalid(raw.to_string()),
            },
            None => AttribLookup::NotFound,
        }
    }

    // Children

    pub fn element_count(&self) -> usize {
        self.children.len()
    }

    pub fn element(&self, index: usize) -> Option<&ElementNode> {
        self.children.get(index)
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut ElementNode> {
        self.children.get_mut(index)
    }

    pub fn elements(&self) -> &[ElementNode] {
        &self.children
    }

    pub fn add_element_node(&mut self, name: impl AsRef<str>, at: Option<usize>) -> &mut ElementNode {
        let node = ElementNode::new(name);
        let index = match at {
            Some(i) if i < self.children.len() => {
                self.children.insert(i, node);
                i
            }
            _ => {
                self.children.push(node);
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    pub fn push_element(&mut self, node: ElementNode) {
        self.children.push(node);
    }

    pub fn remove_element(&mut self, index: usize) -> bool {
        if index < self.children.len() {
            self.children.remove(index);
            true
        } else {
            false
        }
    }

    pub fn find_element(&self, name: &str, from: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, c)| c.name == name)
            .map(|(i, _)| i)
    }

    // Persistence

    pub fn load_xml_str(input: &str) -> Result<ElementNode, ArbError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<(ElementNode, String)> = Vec::new();
        let mut root: Option<ElementNode> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                ArbError::Xml(format!("at position {}: {e}", reader.buffer_position()))
            })?;
            match event {
                Event::Start(start) => {
                    stack.push((node_from_start(&start)?, String::new()));
                }
                Event::Empty(start) => {
                    let node = node_from_start(&start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let Some((mut node, text)) = stack.pop() else {
                        return Err(ArbError::Xml("unbalanced end tag".to_string()));
                    };
                    node.value = if node.children.is_empty() {
                        text
                    } else {
                        strip_child_separator(text)
                    };
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    if let Some((_, buf)) = stack.last_mut().filter(|(node, _)| node.children.is_empty()) {
                        let unescaped = text.unescape().map_err(|e| ArbError::Xml(e.to_string()))?;
                        buf.push_str(&unescaped);
                    }
                }
                Event::CData(data) => {
                    if let Some((_, buf)) = stack.last_mut().filter(|(node, _)| node.children.is_empty()) {
                        buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ArbError::Xml("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| ArbError::Xml("document has no root element".to_string()))
    }

    pub fn load_xml_file(path: impl AsRef<Path>) -> Result<ElementNode, ArbError> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref).map_err(|source| ArbError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        debug!(path = %path_ref.display(), bytes = raw.len(), "read document");
        Self::load_xml_str(&raw)
    }

    pub fn save_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        self.write_node(&mut out, 0);
        out
    }

    pub fn save_xml_file(&self, path: impl AsRef<Path>) -> Result<(), ArbError> {
        let path_ref = path.as_ref();
        fs::write(path_ref, self.save_xml()).map_err(|source| ArbError::Io {
            path: path_ref.to_path_buf(),
            source,
        })
    }

    fn write_node(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attribs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v.as_str()));
            out.push('"');
        }
        if self.children.is_empty() && self.value.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        out.push_str(&escape(self.value.as_str()));
        if !self.children.is_empty() {
            out.push('\n');
            for child in &self.children {
                child.write_node(out, depth + 1);
            }
            for _ in 0..depth {
                out.push_str("  ");
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}

fn node_from_start(start: &BytesStart<'_>) -> Result<ElementNode, ArbError> {
    let mut node = ElementNode::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ArbError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ArbError::Xml(e.to_string()))?
            .into_owned();
        node.attribs.insert(key, value);
    }
    Ok(node)
}

// A value followed by children is written as the value, a newline and the
// first child's indent. Only that one separator is dropped.
fn strip_child_separator(mut text: String) -> String {
    if let Some(i) = text.rfind('\n') {
        if text[i + 1..].chars().all(|c| c == ' ' || c == '\t') {
            text.truncate(i);
        }
    }
    text
}

fn attach(
    stack: &mut [(ElementNode, String)],
    root: &mut Option<ElementNode>,
    node: ElementNode,
) -> Result<(), ArbError> {
    if let Some((parent, _)) = stack.last_mut() {
        parent.children.push(node);
        Ok(())
    } else if root.is_none() {
        *root = Some(node);
        Ok(())
    } else {
        Err(ArbError::Xml("multiple root elements".to_string()))
    }
}

pub(crate) fn format_double(value: f64, precision: usize) -> String {
    let mut s = format!("{value:.precision$}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn setting_same_attribute_twice_keeps_last_value() {
        let mut node = ElementNode::new("Test");
        node.add_attrib("name", "first");
        node.add_attrib("name", "second");
        assert_eq!(node.attrib_count(), 1);
        assert_eq!(node.attrib("name"), Some("second"));
    }

    #[test]
    fn typed_lookup_distinguishes_missing_from_invalid() {
        let mut node = ElementNode::new("Test");
        node.add_attrib("date", "not a date");
        node.add_attrib("flag", "y");
        node.add_attrib("bad", "yes");
        node.add_attrib("count", "12");
        assert!(node.get_attrib_date("date").is_invalid());
        assert_eq!(node.get_attrib_date("other"), AttribLookup::NotFound);
        assert_eq!(node.get_attrib_bool("flag"), AttribLookup::Found(true));
        assert_eq!(node.get_attrib_bool("bad"), AttribLookup::Invalid("yes".to_string()));
        assert_eq!(node.get_attrib_parsed::<i16>("count"), AttribLookup::Found(12));
    }

    #[test]
    fn assign_leaves_slot_untouched_when_absent() {
        let node = ElementNode::new("Test");
        let mut slot = "keep".to_string();
        assert_eq!(node.get_attrib_string("x").assign(&mut slot), Ok(false));
        assert_eq!(slot, "keep");
    }

    #[test]
    fn invalid_dates_are_not_written() {
        let mut node = ElementNode::new("Test");
        assert!(!node.add_attrib_date("d", &ArbDate::invalid()));
        assert!(node.add_attrib_date("e", &ArbDate::new(2005, 1, 2)));
        assert_eq!(node.attrib("d"), None);
        assert_eq!(node.attrib("e"), Some("2005-01-02"));
    }

    #[test]
    fn double_formatting_trims_zeros() {
        assert_eq!(format_double(1.50, 2), "1.5");
        assert_eq!(format_double(2.0, 2), "2");
        assert_eq!(format_double(0.125, 3), "0.125");
        assert_eq!(format_double(-0.0001, 2), "0");
    }

    #[test]
    fn child_management() {
        let mut root = ElementNode::new("Root");
        root.add_element_node("A", None);
        root.add_element_node("C", None);
        root.add_element_node("B", Some(1));
        let names: Vec<&str> = root.elements().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(root.find_element("C", 0), Some(2));
        assert_eq!(root.find_element("A", 1), None);
        assert_eq!(root.find_element("Z", 0), None);
        assert!(root.remove_element(0));
        assert!(!root.remove_element(5));
        assert_eq!(root.element_count(), 2);
    }

    #[test]
    fn save_load_save_is_byte_identical() {
        let mut root = ElementNode::new("AgilityBook");
        root.add_attrib("Book", "15.0");
        {
            let cal = root.add_element_node("Calendar", None);
            cal.add_attrib("Club", "Tails & Tales <West>");
            cal.add_attrib("DateStart", "2006-09-03");
            cal.set_value("line one\nline \"two\"");
        }
        {
            let dog = root.add_element_node("Dog", None);
            dog.add_attrib("CallName", "Pepper");
            dog.add_element_node("Breed", None).set_value("Sheltie");
            dog.add_element_node("Empty", None);
        }
        let first = root.save_xml();
        let reloaded = ElementNode::load_xml_str(&first).unwrap();
        assert_eq!(reloaded, root);
        assert_eq!(reloaded.save_xml(), first);
    }

    #[test]
    fn mixed_content_value_keeps_its_whitespace() {
        let mut root = ElementNode::new("Trial");
        root.set_value("  indented note ");
        root.add_element_node("Club", None).set_value("Dog Club");
        let first = root.save_xml();
        let reloaded = ElementNode::load_xml_str(&first).unwrap();
        assert_eq!(reloaded.value(), "  indented note ");
        assert_eq!(reloaded, root);
        assert_eq!(reloaded.save_xml(), first);

        let pretty = "<Venue Name=\"AKC\">\n  <Desc/>\n</Venue>";
        let node = ElementNode::load_xml_str(pretty).unwrap();
        assert_eq!(node.value(), "");
        assert_eq!(node.element_count(), 1);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(ElementNode::load_xml_str("").is_err());
        assert!(ElementNode::load_xml_str("<A><B></A>").is_err());
        assert!(ElementNode::load_xml_str("<A/><B/>").is_err());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.xml");
        let mut root = ElementNode::new("Root");
        root.add_attrib_bool("flag", true);
        root.save_xml_file(&path).unwrap();
        let loaded = ElementNode::load_xml_file(&path).unwrap();
        assert_eq!(loaded.get_attrib_bool("flag"), AttribLookup::Found(true));
        assert!(ElementNode::load_xml_file(dir.path().join("missing.xml")).is_err());
    }
}
