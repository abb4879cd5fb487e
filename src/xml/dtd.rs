//! # Document Type Definitions
//!
//! Parsing of the internal subset of a `DOCTYPE` declaration and validation of an
//! [`Element`] tree against it.
//!
//! Only the declarations the catalog needs are understood: `<!ELEMENT>` with `EMPTY`,
//! `(#PCDATA)` or a flat sequence of element names, each optionally marked `?`, `*` or `+`,
//! and `<!ATTLIST>` with `CDATA #REQUIRED` attributes. Anything else is reported as a
//! malformed DTD.
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use itertools::Itertools;

use super::element::{is_xml_space, Element};
use crate::lemon_errors::LemonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentModel {
    Empty,
    /// `(#PCDATA)`: character data only
    Text,
    Sequence(Vec<(String, Occurrence)>),
}

/// A parsed internal DTD subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dtd {
    pub root: String,
    elements: HashMap<String, ContentModel>,
    /// Required CDATA attributes of each element, in declaration order
    attributes: HashMap<String, Vec<String>>,
}

fn dtd_error(msg: impl fmt::Display) -> LemonError {
    LemonError::MalformedDocument(format!("invalid DTD: {msg}"))
}

fn violation(path: &str, msg: impl fmt::Display) -> LemonError {
    LemonError::SchemaViolation(format!("{path}: {msg}"))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

/// Body of a declaration starting with `keyword` and a white space
fn keyword<'a>(declaration: &'a str, keyword: &str) -> Option<&'a str> {
    declaration
        .strip_prefix(keyword)
        .filter(|body| body.starts_with(is_xml_space))
}

impl Dtd {
    /// Parse a `DOCTYPE` declaration with an internal subset
    ///
    /// Accepts the declaration with or without its `<!DOCTYPE` prefix and closing `>`, which is
    /// how the reader reports it.
    pub fn parse(doctype: &str) -> Result<Self, LemonError> {
        let mut decl = doctype.trim_matches(is_xml_space);
        decl = decl.strip_prefix("<!").unwrap_or(decl);
        decl = decl
            .strip_prefix("DOCTYPE")
            .unwrap_or(decl)
            .trim_start_matches(is_xml_space);
        decl = decl
            .strip_suffix('>')
            .unwrap_or(decl)
            .trim_end_matches(is_xml_space);

        let name_end = decl.find(|c: char| !is_name_char(c)).unwrap_or(decl.len());
        let root = &decl[..name_end];
        if root.is_empty() {
            return Err(dtd_error("missing root element name"));
        }
        let subset = decl[name_end..]
            .trim_matches(is_xml_space)
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| dtd_error("missing internal subset"))?;

        let mut dtd = Dtd {
            root: root.to_string(),
            elements: HashMap::new(),
            attributes: HashMap::new(),
        };

        for declaration in split_declarations(subset)? {
            if let Some(body) = keyword(declaration, "ELEMENT") {
                let (name, model) = parse_element_decl(body)?;
                if dtd.elements.insert(name.clone(), model).is_some() {
                    return Err(dtd_error(format!("element '{name}' declared twice")));
                }
            } else if let Some(body) = keyword(declaration, "ATTLIST") {
                let (element, names) = parse_attlist_decl(body)?;
                let known = dtd.attributes.entry(element).or_default();
                for name in names {
                    // the first declaration of an attribute is binding
                    if !known.contains(&name) {
                        known.push(name);
                    }
                }
            } else {
                return Err(dtd_error(format!("unsupported declaration '<!{declaration}>'")));
            }
        }

        Ok(dtd)
    }

    pub fn content_model(&self, element: &str) -> Option<&ContentModel> {
        self.elements.get(element)
    }

    /// Names of the attributes `element` must carry
    pub fn attributes(&self, element: &str) -> &[String] {
        self.attributes
            .get(element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check that `root` and its whole subtree conform to this DTD
    pub fn validate(&self, root: &Element) -> Result<(), LemonError> {
        if root.name != self.root {
            return Err(violation(
                &root.name,
                format!("root element must be '{}'", self.root),
            ));
        }
        self.validate_element(root, &root.name)
    }

    fn validate_element(&self, element: &Element, path: &str) -> Result<(), LemonError> {
        let model = self.content_model(&element.name).ok_or_else(|| {
            violation(path, format!("element '{}' is not declared", element.name))
        })?;
        self.validate_attributes(element, path)?;

        match model {
            ContentModel::Empty => {
                if !element.children.is_empty() || !element.text().is_empty() {
                    return Err(violation(path, "EMPTY element has content"));
                }
            }
            ContentModel::Text => {
                if let Some(child) = element.children.first() {
                    return Err(violation(
                        path,
                        format!("element '{}' not allowed in {model}", child.name),
                    ));
                }
            }
            ContentModel::Sequence(items) => {
                if !element.text().trim_matches(is_xml_space).is_empty() {
                    return Err(violation(path, "character data not allowed"));
                }
                let names: Vec<&str> =
                    element.children.iter().map(|c| c.name.as_str()).collect();
                if !matches_sequence(items, &names) {
                    return Err(violation(
                        path,
                        format!("content ({}) does not match {model}", names.join(",")),
                    ));
                }
            }
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for child in &element.children {
            let index = seen.entry(child.name.as_str()).or_insert(0);
            *index += 1;
            self.validate_element(child, &format!("{path}/{}[{index}]", child.name))?;
        }
        Ok(())
    }

    fn validate_attributes(&self, element: &Element, path: &str) -> Result<(), LemonError> {
        let required = self.attributes(&element.name);

        if let Some((key, _)) = element.attributes.iter().find(|(k, _)| !required.contains(k)) {
            return Err(violation(path, format!("undeclared attribute '{key}'")));
        }
        match required.iter().find(|name| element.attribute(name).is_none()) {
            Some(missing) => Err(violation(
                path,
                format!("missing required attribute '{missing}'"),
            )),
            None => Ok(()),
        }
    }
}

/// Whether the child names are a sentence of the sequence
///
/// Tracks the set of reachable positions in `names`, so long runs of repeated children
/// never backtrack.
fn matches_sequence(items: &[(String, Occurrence)], names: &[&str]) -> bool {
    let reached = items
        .iter()
        .fold(BTreeSet::from([0]), |starts, (name, occurrence)| {
            starts
                .into_iter()
                .flat_map(|pos| {
                    let run = names[pos..].iter().take_while(|&&n| n == name.as_str()).count();
                    let (min, max) = match occurrence {
                        Occurrence::One => (1, 1),
                        Occurrence::Optional => (0, 1),
                        Occurrence::ZeroOrMore => (0, run),
                        Occurrence::OneOrMore => (1, run),
                    };
                    (min..=max.min(run)).map(move |count| pos + count)
                })
                .collect()
        });
    reached.contains(&names.len())
}

/// Split an internal subset into the bodies of its `<!...>` declarations
fn split_declarations(subset: &str) -> Result<Vec<&str>, LemonError> {
    let mut declarations = Vec::new();
    let mut rest = subset.trim_start_matches(is_xml_space);

    while !rest.is_empty() {
        let body = rest.strip_prefix("<!").ok_or_else(|| {
            dtd_error(format!(
                "unexpected content {:?}",
                rest.lines().next().unwrap_or(rest)
            ))
        })?;
        let end = body
            .find('>')
            .ok_or_else(|| dtd_error("unterminated declaration"))?;

        declarations.push(body[..end].trim_matches(is_xml_space));
        rest = body[end + 1..].trim_start_matches(is_xml_space);
    }

    Ok(declarations)
}

fn parse_element_decl(body: &str) -> Result<(String, ContentModel), LemonError> {
    let body = body.trim_matches(is_xml_space);
    let name_end = body.find(|c: char| !is_name_char(c)).unwrap_or(body.len());
    let name = &body[..name_end];
    if name.is_empty() {
        return Err(dtd_error("element declaration without a name"));
    }
    let model = parse_content_model(body[name_end..].trim_matches(is_xml_space))?;
    Ok((name.to_string(), model))
}

fn parse_content_model(content: &str) -> Result<ContentModel, LemonError> {
    if content == "EMPTY" {
        return Ok(ContentModel::Empty);
    }
    let unsupported = || dtd_error(format!("unsupported content model '{content}'"));

    let inner = content
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(unsupported)?
        .trim_matches(is_xml_space);
    if inner == "#PCDATA" {
        return Ok(ContentModel::Text);
    }

    let items = inner
        .split(',')
        .map(|item| {
            let item = item.trim_matches(is_xml_space);
            let (name, occurrence) = match item.char_indices().last() {
                Some((i, '?')) => (&item[..i], Occurrence::Optional),
                Some((i, '*')) => (&item[..i], Occurrence::ZeroOrMore),
                Some((i, '+')) => (&item[..i], Occurrence::OneOrMore),
                _ => (item, Occurrence::One),
            };
            if name.is_empty() || !name.chars().all(is_name_char) {
                return Err(unsupported());
            }
            Ok((name.to_string(), occurrence))
        })
        .collect::<Result<Vec<_>, LemonError>>()?;
    Ok(ContentModel::Sequence(items))
}

/// Element name and attribute names of an `<!ATTLIST element (name CDATA #REQUIRED)+>`
fn parse_attlist_decl(body: &str) -> Result<(String, Vec<String>), LemonError> {
    let mut tokens = body.split(is_xml_space).filter(|t| !t.is_empty());
    let element = tokens
        .next()
        .ok_or_else(|| dtd_error("attribute list without element name"))?;

    let definitions: Vec<&str> = tokens.collect();
    if definitions.is_empty() || definitions.len() % 3 != 0 {
        return Err(dtd_error(format!("incomplete attribute list '{body}'")));
    }
    let names = definitions
        .chunks(3)
        .map(|definition| match definition {
            [name, "CDATA", "#REQUIRED"] if name.chars().all(is_name_char) => {
                Ok(name.to_string())
            }
            _ => Err(dtd_error(format!(
                "unsupported attribute definition '{}'",
                definition.join(" ")
            ))),
        })
        .collect::<Result<Vec<_>, LemonError>>()?;
    Ok((element.to_string(), names))
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentModel::Empty => write!(f, "EMPTY"),
            ContentModel::Text => write!(f, "(#PCDATA)"),
            ContentModel::Sequence(items) => {
                let items = items.iter().map(|(name, occurrence)| {
                    let suffix = match occurrence {
                        Occurrence::One => "",
                        Occurrence::Optional => "?",
                        Occurrence::ZeroOrMore => "*",
                        Occurrence::OneOrMore => "+",
                    };
                    format!("{name}{suffix}")
                });
                write!(f, "({})", items.format(","))
            }
        }
    }
}
