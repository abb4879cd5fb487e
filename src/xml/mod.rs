//! # XML engine
//!
//! The minimal XML machinery the two document codecs need:
//!
//! - [`element`]: an owned element tree, pretty-printed with `quick_xml::Writer` and rebuilt
//!   from `quick_xml::Reader` events,
//! - [`dtd`]: a parser for internal DTD subsets and a validator of element trees against them,
//! - [`schemas`]: the two fixed DTDs of the LEMON documents,
//! - [`header`]: the generation comment and DOCTYPE block written after the XML declaration,
//! - [`validation`]: the validation gate every file goes through after writing and before reading.
pub mod dtd;
pub mod element;
pub mod header;
pub mod schemas;
pub mod validation;

pub use element::{Document, Element, XmlEncoding};
pub use schemas::DocumentKind;
