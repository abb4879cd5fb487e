//! # Constants and type definitions for lemonxml
//!
//! Fixed formatting rules shared by the two document codecs and the type aliases used
//! throughout the crate.

use std::collections::BTreeMap;

use crate::annuli::CandidateAnnuli;
use crate::passband::Passband;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Seconds since the Unix epoch, UTC
pub type UnixTime = i64;

/// A length on the detector, in pixels
pub type Pixel = f64;

/// Evaluated photometric parameters, grouped by photometric filter.
///
/// The `BTreeMap` iterates filters in their natural ordering, which is the canonical order
/// in which bands are written to disk.
pub type AnnuliMap = BTreeMap<Passband, Vec<CandidateAnnuli>>;

// -------------------------------------------------------------------------------------------------
// Formatting
// -------------------------------------------------------------------------------------------------

/// `strftime` pattern of the dates stored in offsets documents, e.g. `Mon Feb 13 23:11:20 2012 UTC`
pub const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y UTC";

/// Program name written in the generation-timestamp comment
pub const GENERATOR: &str = "LEMON";

/// Decimal places of the aperture, annulus and dannulus attributes
pub const ANNULI_PRECISION: usize = 5;

/// Decimal places of the stdev attribute
pub const STDEV_PRECISION: usize = 8;

/// Indentation, in spaces, of the pretty-printed documents
pub const INDENT_SIZE: usize = 2;
