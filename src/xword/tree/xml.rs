//! A generic XML parse tree built over quick-xml events.
//!
//! A thin DOM with ordered attributes and mixed element/text children.
//! The inner-markup helper serializes an element's children back to a
//! raw string so clue text with embedded markup survives a round-trip.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::xword::error::TreeError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    /// Already-escaped markup, written through verbatim. Never produced
    /// by the parser; writers use it for content captured with
    /// [`XmlElement::inner_markup`].
    Raw(String),
}

/// One XML element: name, ordered attributes, ordered children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> XmlElement {
        XmlElement {
            name: name.into(),
            ..XmlElement::default()
        }
    }

    /// Parses a complete document, returning its root element.
    pub fn parse(bytes: &[u8]) -> Result<XmlElement, TreeError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(start)) => {
                    stack.push(element_from_start(&start)?);
                }
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => return Ok(element),
                    }
                }
                Ok(Event::Text(text)) => {
                    let text = text
                        .unescape()
                        .map_err(|e| TreeError::Parse(e.to_string()))?;
                    if let Some(parent) = stack.last_mut() {
                        if !text.is_empty() {
                            parent.children.push(XmlNode::Text(text.into_owned()));
                        }
                    }
                }
                Ok(Event::CData(data)) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| TreeError::Parse("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => return Ok(element),
                    }
                }
                Ok(Event::Eof) => {
                    return Err(TreeError::Parse("no root element".to_string()));
                }
                Ok(_) => {}
                Err(e) => return Err(TreeError::Parse(e.to_string())),
            }
            buf.clear();
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> XmlElement {
        self.set_attr(name, value);
        self
    }

    pub fn add_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn with_child(mut self, child: XmlElement) -> XmlElement {
        self.add_child(child);
        self
    }

    pub fn add_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    pub fn with_text(mut self, text: impl Into<String>) -> XmlElement {
        self.add_text(text);
        self
    }

    /// Appends raw markup, e.g. clue text with embedded formatting.
    pub fn add_markup(&mut self, markup: impl Into<String>) {
        self.children.push(XmlNode::Raw(markup.into()));
    }

    /// Child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Child elements with a given name.
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        let name = name.to_string();
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children_named(name).next()
    }

    /// A child element that must exist.
    pub fn require_child(&self, name: &str) -> Result<&XmlElement, TreeError> {
        self.child(name)
            .ok_or_else(|| TreeError::MissingElement(name.to_string()))
    }

    /// All descendant text, concatenated.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// The element's inner content as a raw markup string, preserving
    /// embedded elements (e.g. `<i>` inside clue text).
    pub fn inner_markup(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        for child in &self.children {
            // Writing to a Vec cannot fail.
            let _ = write_node(&mut writer, child);
        }
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    /// Serializes this element as a standalone UTF-8 document.
    pub fn to_document_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new());
        let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
        let _ = write_element(&mut writer, self);
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        bytes
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, TreeError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| TreeError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| TreeError::Parse(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Text(text) | XmlNode::Raw(text) => out.push_str(text),
            XmlNode::Element(e) => collect_text(e, out),
        }
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> std::io::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> std::io::Result<()> {
    match node {
        XmlNode::Element(e) => write_element(writer, e),
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        XmlNode::Raw(markup) => {
            writer.write_event(Event::Text(BytesText::from_escaped(markup.as_str())))
        }
    }
}
