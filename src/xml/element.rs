use std::fmt::Write as _;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::{constants::INDENT_SIZE, lemon_errors::LemonError};

/// Character encoding declared by, and used to write, a document
///
/// Reading always decodes UTF-8, of which `us-ascii` is a subset. A file declaring another
/// encoding, such as `iso-8859-1`, is only read correctly while its content is pure ASCII;
/// any other byte makes it a [`LemonError::MalformedDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlEncoding {
    #[default]
    Utf8,
    /// 7-bit output: every non-ASCII character is written as a numeric character reference
    Ascii,
}

impl XmlEncoding {
    /// Label written in the `encoding` pseudo-attribute of the XML declaration
    pub fn label(&self) -> &'static str {
        match self {
            XmlEncoding::Utf8 => "utf-8",
            XmlEncoding::Ascii => "us-ascii",
        }
    }

    fn encode(&self, text: &str) -> String {
        match self {
            XmlEncoding::Utf8 => text.to_string(),
            XmlEncoding::Ascii => text.chars().fold(String::with_capacity(text.len()), |mut out, c| {
                if c.is_ascii() {
                    out.push(c);
                } else {
                    let _ = write!(out, "&#{};", c as u32);
                }
                out
            }),
        }
    }
}

/// Whether `c` matches the `Char` production of XML 1.0
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// The four characters XML treats as white space
pub(crate) fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn check_chars(text: &str) -> Result<(), LemonError> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(LemonError::MalformedDocument(format!(
            "character U+{:04X} is not allowed in XML",
            c as u32
        ))),
        None => Ok(()),
    }
}

/// An owned XML element: name, attributes in document order, text content and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, empty if the element has none
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// First child named `name`
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), LemonError> {
        check_chars(&self.name)?;
        check_chars(self.text())?;
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            check_chars(key)?;
            check_chars(value)?;
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(LemonError::malformed);
        }

        writer
            .write_event(Event::Start(start))
            .map_err(LemonError::malformed)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(LemonError::malformed)?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(LemonError::malformed)
    }

    /// Serialize the tree as a standalone document, pretty-printed with an XML declaration
    pub fn to_document(&self, encoding: XmlEncoding) -> Result<String, LemonError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);
        self.write(&mut writer)?;
        let body = String::from_utf8(writer.into_inner()).map_err(LemonError::malformed)?;

        Ok(format!(
            "<?xml version='1.0' encoding='{}' standalone='yes'?>\n{}\n",
            encoding.label(),
            encoding.encode(&body)
        ))
    }

    fn from_start(start: &BytesStart) -> Result<Self, LemonError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(LemonError::malformed)?
            .to_string();
        let attributes = start
            .attributes()
            .map(|attr| {
                let attr = attr.map_err(LemonError::malformed)?;
                let key = std::str::from_utf8(attr.key.as_ref())
                    .map_err(LemonError::malformed)?
                    .to_string();
                let value = attr
                    .unescape_value()
                    .map_err(LemonError::malformed)?
                    .into_owned();
                check_chars(&value)?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>, LemonError>>()?;

        Ok(Element {
            name,
            attributes,
            ..Default::default()
        })
    }
}

/// A parsed document: its DOCTYPE declaration, if any, and the root element
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Raw content of the DOCTYPE declaration, internal subset included
    pub doctype: Option<String>,
    pub root: Element,
}

impl Document {
    /// Parse a well-formed XML document into an element tree
    ///
    /// Comments, processing instructions and the XML declaration are skipped. Whitespace-only
    /// text between child elements is dropped. Characters XML forbids are rejected, whether
    /// raw or written as character references.
    pub fn parse(text: &str) -> Result<Self, LemonError> {
        check_chars(text)?;
        let mut reader = Reader::from_str(text);
        let mut doctype = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(LemonError::malformed)? {
                Event::DocType(e) => {
                    let raw = std::str::from_utf8(&e).map_err(LemonError::malformed)?;
                    doctype = Some(raw.trim().to_string());
                }
                Event::Start(e) => stack.push(Element::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Element::from_start(&e)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        LemonError::MalformedDocument("unexpected end tag".into())
                    })?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::Text(e) => {
                    let content = e.unescape().map_err(LemonError::malformed)?;
                    check_chars(&content)?;
                    append_text(&content, &mut stack)?;
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    let content = std::str::from_utf8(&raw).map_err(LemonError::malformed)?;
                    append_text(content, &mut stack)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(LemonError::MalformedDocument(format!(
                "unclosed element '{}'",
                open.name
            )));
        }
        let root =
            root.ok_or_else(|| LemonError::MalformedDocument("no root element".into()))?;
        Ok(Document { doctype, root })
    }
}

fn append_text(content: &str, stack: &mut [Element]) -> Result<(), LemonError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.text.get_or_insert_with(String::new).push_str(content);
            Ok(())
        }
        None if content.trim_matches(is_xml_space).is_empty() => Ok(()),
        None => Err(LemonError::MalformedDocument(
            "text outside of the root element".into(),
        )),
    }
}

fn close_element(
    mut element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), LemonError> {
    let blank = element
        .text
        .as_deref()
        .is_some_and(|t| t.trim_matches(is_xml_space).is_empty());
    if blank && !element.children.is_empty() {
        element.text = None;
    }

    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_some() => Err(LemonError::MalformedDocument(format!(
            "second root element '{}'",
            element.name
        ))),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}
