//! Minimal XML element tree built on quick-xml
//!
//! Element and attribute names are stored by local name, so `srw:record` and
//! `record` compare equal.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// A parsed XML element
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Raw text runs, each tagged with the number of children preceding it
    text_runs: Vec<(usize, String)>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant (depth-first) with the given local name
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given local name, in document order
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.find_all(name, out);
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text of this element and its descendants in document order, trimmed
    /// once. `None` when empty.
    pub fn text(&self) -> Option<String> {
        let mut text = String::new();
        self.collect_text(&mut text);

        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    fn collect_text(&self, out: &mut String) {
        let mut runs = self.text_runs.iter().peekable();
        for (index, child) in self.children.iter().enumerate() {
            while let Some((_, run)) = runs.next_if(|(position, _)| *position <= index) {
                out.push_str(run);
            }
            child.collect_text(out);
        }
        for (_, run) in runs {
            out.push_str(run);
        }
    }

    fn push_text(&mut self, text: &str) {
        let position = self.children.len();
        if let Some((last, run)) = self.text_runs.last_mut() {
            if *last == position {
                run.push_str(text);
                return;
            }
        }
        self.text_runs.push((position, text.to_string()));
    }
}

/// Parse a document and return its root element.
///
/// Mismatched, unterminated or truncated markup is an error.
pub fn parse(xml: &str) -> Result<XmlElement, String> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(XmlElement::from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = XmlElement::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| format!("unexpected closing tag at {}", reader.buffer_position()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                if let Some(current) = stack.last_mut() {
                    current.push_text(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }

    root.ok_or_else(|| "document has no root element".to_string())
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
