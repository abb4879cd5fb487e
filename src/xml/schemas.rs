use std::{fmt, sync::LazyLock};

use super::dtd::Dtd;

/// DTD of offsets documents, one line per entry, surrounded by blank lines
pub const OFFSETS_DTD: &[&str] = &[
    "",
    "<!DOCTYPE offsets [",
    "<!ELEMENT offsets (reference, offset*)>",
    "<!ATTLIST offsets size CDATA  #REQUIRED>",
    "",
    "<!ELEMENT reference (image)>",
    "<!ELEMENT offset (image, x_offset, y_offset)>",
    "<!ELEMENT image (path, date, filter, object, fwhm, airmass)>",
    "<!ELEMENT path (#PCDATA)>",
    "<!ELEMENT date (#PCDATA)>",
    "<!ELEMENT filter (#PCDATA)>",
    "<!ELEMENT object (#PCDATA)>",
    "<!ELEMENT fwhm (#PCDATA)>",
    "<!ELEMENT airmass (#PCDATA)>",
    "<!ELEMENT x_offset  (#PCDATA)>",
    "<!ATTLIST x_offset overlap CDATA #REQUIRED>",
    "<!ELEMENT y_offset  (#PCDATA)>",
    "<!ATTLIST y_offset overlap CDATA #REQUIRED>",
    "]>",
    "",
];

/// DTD of annuli documents, one line per entry, surrounded by blank lines
pub const ANNULI_DTD: &[&str] = &[
    "",
    "<!DOCTYPE annuli [",
    "<!ELEMENT annuli (band*)>",
    "",
    "<!ELEMENT band (candidate*)>",
    "<!ATTLIST band name     CDATA #REQUIRED>",
    "<!ATTLIST band aperture CDATA #REQUIRED>",
    "<!ATTLIST band annulus  CDATA #REQUIRED>",
    "<!ATTLIST band dannulus CDATA #REQUIRED>",
    "<!ATTLIST band stdev    CDATA #REQUIRED>",
    "",
    "<!ELEMENT candidate EMPTY>",
    "<!ATTLIST candidate aperture CDATA #REQUIRED>",
    "<!ATTLIST candidate annulus  CDATA #REQUIRED>",
    "<!ATTLIST candidate dannulus CDATA #REQUIRED>",
    "<!ATTLIST candidate stdev    CDATA #REQUIRED>",
    "]>",
    "",
];

static OFFSETS: LazyLock<Dtd> = LazyLock::new(|| parse_lines(OFFSETS_DTD));
static ANNULI: LazyLock<Dtd> = LazyLock::new(|| parse_lines(ANNULI_DTD));

fn parse_lines(lines: &[&str]) -> Dtd {
    Dtd::parse(lines.join("\n").trim()).expect("embedded DTD is well-formed")
}

/// The two document types of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Offsets,
    Annuli,
}

impl DocumentKind {
    /// Name of the root element
    pub fn root(&self) -> &'static str {
        match self {
            DocumentKind::Offsets => "offsets",
            DocumentKind::Annuli => "annuli",
        }
    }

    /// Lines of the DOCTYPE block written into every document of this kind
    pub fn dtd_lines(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::Offsets => OFFSETS_DTD,
            DocumentKind::Annuli => ANNULI_DTD,
        }
    }

    pub fn dtd(&self) -> &'static Dtd {
        match self {
            DocumentKind::Offsets => &OFFSETS,
            DocumentKind::Annuli => &ANNULI,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root())
    }
}
