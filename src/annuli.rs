//! # Annuli documents
//!
//! The photometric parameters (aperture radius, sky annulus and its width) evaluated for each
//! photometric filter, together with the standard deviation of the light curves of the most
//! constant stars obtained with them. Each `band` element carries the best parameters as
//! attributes and lists every evaluated candidate:
//!
//! ```text
//! <annuli>
//!   <band name="Johnson V" aperture="2.00000" annulus="4.00000" dannulus="1.00000" stdev="0.00800000">
//!     <candidate aperture="1.00000" annulus="3.00000" dannulus="1.00000" stdev="0.01200000"/>
//!     <candidate aperture="2.00000" annulus="4.00000" dannulus="1.00000" stdev="0.00800000"/>
//!   </band>
//! </annuli>
//! ```
use std::{cmp::Ordering, collections::btree_map::Entry, fmt};

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    constants::{AnnuliMap, Pixel, ANNULI_PRECISION, STDEV_PRECISION},
    image::parse_float,
    lemon_errors::LemonError,
    passband::Passband,
    xml::{
        header::setup_header,
        validation::{read_validated, write_validated},
        DocumentKind, Element, XmlEncoding,
    },
};

/// A set of photometric parameters and the dispersion of the light curves they produced
///
/// # Fields
///
/// * `aperture` - The aperture radius, in pixels
/// * `annulus` - The inner radius of the sky annulus, in pixels
/// * `dannulus` - The width of the sky annulus, in pixels
/// * `stdev` - The median, or a similar statistic, of the standard deviation of the light
///   curves of the most constant stars; lower is better
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnnuli {
    pub aperture: Pixel,
    pub annulus: Pixel,
    pub dannulus: Pixel,
    pub stdev: f64,
}

impl CandidateAnnuli {
    pub fn new(aperture: Pixel, annulus: Pixel, dannulus: Pixel, stdev: f64) -> Self {
        CandidateAnnuli {
            aperture,
            annulus,
            dannulus,
            stdev,
        }
    }

    /// The candidate with the lowest `stdev`, the first one in case of ties
    ///
    /// Values compare as numbers, so `-0.0` and `0.0` tie. A NaN `stdev` never beats a
    /// number; it is only returned when no candidate has one.
    pub fn best(candidates: &[CandidateAnnuli]) -> Option<&CandidateAnnuli> {
        candidates.iter().reduce(|best, candidate| {
            let lower = candidate.stdev < best.stdev;
            if lower || (best.stdev.is_nan() && !candidate.stdev.is_nan()) {
                candidate
            } else {
                best
            }
        })
    }

    /// Order in which candidates are listed: by annulus, then by aperture
    ///
    /// A total order in which `-0.0` and `0.0` are equal.
    pub fn by_annulus_then_aperture(a: &CandidateAnnuli, b: &CandidateAnnuli) -> Ordering {
        // adding zero turns -0.0 into 0.0
        let key = |x: Pixel| x + 0.0;
        key(a.annulus)
            .total_cmp(&key(b.annulus))
            .then(key(a.aperture).total_cmp(&key(b.aperture)))
    }

    fn to_element(&self, tag: &str) -> Element {
        Element::new(tag)
            .with_attribute("aperture", format!("{:.*}", ANNULI_PRECISION, self.aperture))
            .with_attribute("annulus", format!("{:.*}", ANNULI_PRECISION, self.annulus))
            .with_attribute("dannulus", format!("{:.*}", ANNULI_PRECISION, self.dannulus))
            .with_attribute("stdev", format!("{:.*}", STDEV_PRECISION, self.stdev))
    }

    fn from_element(element: &Element) -> Result<Self, LemonError> {
        let value = |key: &str| {
            let text = element.attribute(key).ok_or_else(|| {
                LemonError::SchemaViolation(format!(
                    "{}: missing required attribute '{key}'",
                    element.name
                ))
            })?;
            parse_float(key, text)
        };

        Ok(CandidateAnnuli {
            aperture: value("aperture")?,
            annulus: value("annulus")?,
            dannulus: value("dannulus")?,
            stdev: value("stdev")?,
        })
    }

    fn annuli_element(annuli: &AnnuliMap) -> Element {
        let mut root = Element::new("annuli");

        for (filter, candidates) in annuli {
            let Some(best) = Self::best(candidates) else {
                debug!(%filter, "no candidate annuli, band skipped");
                continue;
            };

            let mut band = best.to_element("band");
            band.attributes.insert(0, ("name".to_string(), filter.to_string()));

            let mut sorted = candidates.clone();
            sorted.sort_by(Self::by_annulus_then_aperture);
            for candidate in &sorted {
                band.push(candidate.to_element("candidate"));
            }
            root.push(band);
        }

        root
    }

    /// The complete annuli document for `annuli`
    pub fn to_xml(annuli: &AnnuliMap, encoding: XmlEncoding) -> Result<String, LemonError> {
        let body = Self::annuli_element(annuli).to_document(encoding)?;
        Ok(setup_header(&body, DocumentKind::Annuli.dtd_lines()))
    }

    /// Write the candidate annuli of every photometric filter to `path`, then validate it
    ///
    /// Bands are written in the natural order of the filters and candidates sorted by annulus
    /// then aperture; the caller's lists are left as they are. Filters without candidates are
    /// omitted. Any existing file is overwritten.
    #[tracing::instrument(skip(annuli), fields(bands = annuli.len()))]
    pub fn xml_dump(
        path: &Utf8Path,
        annuli: &AnnuliMap,
        encoding: XmlEncoding,
    ) -> Result<(), LemonError> {
        write_validated(path, &Self::to_xml(annuli, encoding)?, DocumentKind::Annuli)?;
        debug!("annuli written");
        Ok(())
    }

    /// Read the candidate annuli of an annuli document
    ///
    /// With `best_only`, each filter maps to a single candidate built from the attributes of
    /// its `band` element and the listed candidates are ignored. Otherwise each filter maps to
    /// its candidates in document order.
    #[tracing::instrument]
    pub fn xml_load(path: &Utf8Path, best_only: bool) -> Result<AnnuliMap, LemonError> {
        let document = read_validated(path, DocumentKind::Annuli)?;
        let mut annuli = AnnuliMap::new();

        for band in document.root.children_named("band") {
            let name = band.attribute("name").unwrap_or_default();
            let filter: Passband = name.parse()?;

            let candidates = if best_only {
                vec![CandidateAnnuli::from_element(band)?]
            } else {
                band.children_named("candidate")
                    .map(CandidateAnnuli::from_element)
                    .collect::<Result<Vec<_>, _>>()?
            };

            match annuli.entry(filter) {
                Entry::Occupied(entry) => {
                    return Err(LemonError::DuplicateBand(entry.key().to_string()))
                }
                Entry::Vacant(entry) => {
                    entry.insert(candidates);
                }
            }
        }

        debug!(bands = annuli.len(), "annuli loaded");
        Ok(annuli)
    }
}

impl fmt::Display for CandidateAnnuli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CandidateAnnuli({:.6}, {:.6}, {:.6}, {:.6})",
            self.aperture, self.annulus, self.dannulus, self.stdev
        )
    }
}
