//! # Offsets documents
//!
//! The translation offsets between a reference image and each of the images aligned to it,
//! stored as a self-validating XML document:
//!
//! ```text
//! <offsets size="1">
//!   <reference>
//!     <image>...</image>
//!   </reference>
//!   <offset>
//!     <image>...</image>
//!     <x_offset overlap="12">1.5</x_offset>
//!     <y_offset overlap="10">-0.75</y_offset>
//!   </offset>
//! </offsets>
//! ```
//!
//! Every offset of a file shares its reference image; appending an offset computed against
//! another reference is refused. Dates are kept in memory as Unix time and written to disk as
//! `Sun Jun 20 23:21:05 1993 UTC`.
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    constants::{Pixel, UnixTime},
    image::{parse_float, ImageDescriptor},
    lemon_errors::LemonError,
    xml::{
        header::setup_header,
        validation::{read_validated, write_validated},
        DocumentKind, Element, XmlEncoding,
    },
};

/// The translation offset between a reference image and a shifted image
///
/// # Fields
///
/// * `reference` - The path of the reference image
/// * `shifted` - The image whose offset is measured
/// * `x`, `y` - The offset of `shifted` relative to `reference`, in pixels
/// * `x_overlap`, `y_overlap` - The number of stars that overlapped on each axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlOffset {
    pub reference: String,
    pub shifted: ImageDescriptor,
    pub x: Pixel,
    pub y: Pixel,
    pub x_overlap: u32,
    pub y_overlap: u32,
}

impl XmlOffset {
    pub fn new(
        reference: impl Into<String>,
        shifted: ImageDescriptor,
        x: Pixel,
        y: Pixel,
        x_overlap: u32,
        y_overlap: u32,
    ) -> Self {
        XmlOffset {
            reference: reference.into(),
            shifted,
            x,
            y,
            x_overlap,
            y_overlap,
        }
    }

    fn to_element(&self) -> Result<Element, LemonError> {
        Ok(Element::new("offset")
            .with_child(self.shifted.to_element()?)
            .with_child(
                Element::new("x_offset")
                    .with_attribute("overlap", self.x_overlap.to_string())
                    .with_text(self.x.to_string()),
            )
            .with_child(
                Element::new("y_offset")
                    .with_attribute("overlap", self.y_overlap.to_string())
                    .with_text(self.y.to_string()),
            ))
    }

    fn from_element(reference: &str, offset: &Element) -> Result<Self, LemonError> {
        let image = offset
            .child("image")
            .ok_or_else(|| LemonError::SchemaViolation("offset: missing 'image' element".into()))?;
        let (x, x_overlap) = parse_axis(offset, "x_offset")?;
        let (y, y_overlap) = parse_axis(offset, "y_offset")?;

        Ok(XmlOffset {
            reference: reference.to_string(),
            shifted: ImageDescriptor::from_element(image)?,
            x,
            y,
            x_overlap,
            y_overlap,
        })
    }
}

/// Value and overlap of an `x_offset` or `y_offset` element
fn parse_axis(offset: &Element, tag: &str) -> Result<(Pixel, u32), LemonError> {
    let axis = offset
        .child(tag)
        .ok_or_else(|| LemonError::SchemaViolation(format!("offset: missing '{tag}' element")))?;
    let value = parse_float(tag, axis.text())?;
    let overlap = axis.attribute("overlap").unwrap_or_default();
    let overlap = overlap
        .trim()
        .parse()
        .map_err(|_| LemonError::invalid_value(format!("{tag}/@overlap"), overlap))?;
    Ok((value, overlap))
}

/// Sort key of offsets: the date of observation of the shifted image
pub fn by_date(offset: &XmlOffset) -> UnixTime {
    offset.shifted.date()
}

/// An ordered collection of offsets sharing the same reference image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlOffsetFile {
    reference: ImageDescriptor,
    offsets: Vec<XmlOffset>,
}

impl XmlOffsetFile {
    pub fn new(reference: ImageDescriptor) -> Self {
        XmlOffsetFile {
            reference,
            offsets: Vec::new(),
        }
    }

    pub fn reference(&self) -> &ImageDescriptor {
        &self.reference
    }

    /// Append an offset, refusing it if it was computed against another reference image
    ///
    /// The collection is left untouched on error.
    pub fn add(&mut self, offset: XmlOffset) -> Result<(), LemonError> {
        if offset.reference != self.reference.path() {
            return Err(LemonError::ReferentialIntegrity {
                expected: self.reference.path().to_string(),
                found: offset.reference,
            });
        }
        self.offsets.push(offset);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&XmlOffset> {
        self.offsets.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, XmlOffset> {
        self.offsets.iter()
    }

    /// Sort the offsets in place by the date of observation of the shifted images
    pub fn sort_by_date(&mut self) {
        self.offsets.sort_by_key(by_date);
    }

    fn to_element(&self) -> Result<Element, LemonError> {
        let root = Element::new("offsets")
            .with_attribute("size", self.len().to_string())
            .with_child(Element::new("reference").with_child(self.reference.to_element()?));

        self.offsets
            .iter()
            .try_fold(root, |root, offset| {
                Ok::<_, LemonError>(root.with_child(offset.to_element()?))
            })
    }

    /// The complete document: XML declaration, generation comment, DTD and offsets
    pub fn to_xml(&self, encoding: XmlEncoding) -> Result<String, LemonError> {
        let body = self.to_element()?.to_document(encoding)?;
        Ok(setup_header(&body, DocumentKind::Offsets.dtd_lines()))
    }

    /// Write the collection to `path`, overwriting any existing file, then validate it
    #[tracing::instrument(skip(self), fields(size = self.len()))]
    pub fn dump(&self, path: &Utf8Path, encoding: XmlEncoding) -> Result<(), LemonError> {
        write_validated(path, &self.to_xml(encoding)?, DocumentKind::Offsets)?;
        debug!("offsets written");
        Ok(())
    }

    /// Read and validate an offsets document
    ///
    /// Offsets are returned in document order. The `size` attribute must agree with the
    /// number of `offset` elements.
    #[tracing::instrument]
    pub fn load(path: &Utf8Path) -> Result<Self, LemonError> {
        let document = read_validated(path, DocumentKind::Offsets)?;
        let root = &document.root;

        let reference = root
            .child("reference")
            .and_then(|r| r.child("image"))
            .ok_or_else(|| LemonError::SchemaViolation("offsets: missing reference image".into()))?;
        let mut file = XmlOffsetFile::new(ImageDescriptor::from_element(reference)?);

        for offset in root.children_named("offset") {
            let offset = XmlOffset::from_element(file.reference.path(), offset)?;
            file.offsets.push(offset);
        }

        let size = root.attribute("size").unwrap_or_default();
        let declared: usize = size
            .trim()
            .parse()
            .map_err(|_| LemonError::invalid_value("size", size))?;
        if declared != file.len() {
            return Err(LemonError::InconsistentSize {
                declared,
                found: file.len(),
            });
        }

        debug!(size = file.len(), "offsets loaded");
        Ok(file)
    }
}

impl<'a> IntoIterator for &'a XmlOffsetFile {
    type Item = &'a XmlOffset;
    type IntoIter = std::slice::Iter<'a, XmlOffset>;

    fn into_iter(self) -> Self::IntoIter {
        self.offsets.iter()
    }
}
