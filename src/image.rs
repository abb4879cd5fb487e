use serde::{Deserialize, Serialize};

use crate::{
    constants::{Pixel, UnixTime},
    lemon_errors::LemonError,
    passband::Passband,
    time::{parse_utc_time, utc_time},
    xml::Element,
};

/// Metadata of a FITS image, as stored in the `image` element of an offsets document
///
/// # Fields
///
/// * `path` - The path to the FITS file
/// * `date` - The date of observation, in Unix time (UTC)
/// * `filter` - The photometric filter
/// * `object` - The name of the observed object
/// * `fwhm` - The full width at half maximum of the stars, in pixels
/// * `airmass` - The airmass at the time of observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    path: String,
    date: UnixTime,
    filter: Passband,
    object: String,
    fwhm: Pixel,
    airmass: f64,
}

/// Child elements of `image`, in document order
const IMAGE_FIELDS: [&str; 6] = ["path", "date", "filter", "object", "fwhm", "airmass"];

impl ImageDescriptor {
    pub fn new(
        path: impl Into<String>,
        date: UnixTime,
        filter: Passband,
        object: impl Into<String>,
        fwhm: Pixel,
        airmass: f64,
    ) -> Self {
        ImageDescriptor {
            path: path.into(),
            date,
            filter,
            object: object.into(),
            fwhm,
            airmass,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn date(&self) -> UnixTime {
        self.date
    }

    pub fn filter(&self) -> &Passband {
        &self.filter
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn fwhm(&self) -> Pixel {
        self.fwhm
    }

    pub fn airmass(&self) -> f64 {
        self.airmass
    }

    /// Build the `image` element, for example:
    ///
    /// ```text
    /// <image>
    ///   <path>./data/ferM_016_obfs.fits</path>
    ///   <date>Mon Feb 13 23:11:20 2012 UTC</date>
    ///   <filter>Johnson I</filter>
    ///   <object>ngc2264_1minI</object>
    ///   <fwhm>5.722</fwhm>
    ///   <airmass>1.134</airmass>
    /// </image>
    /// ```
    pub(crate) fn to_element(&self) -> Result<Element, LemonError> {
        let values = [
            self.path.clone(),
            utc_time(self.date)?,
            self.filter.to_string(),
            self.object.clone(),
            self.fwhm.to_string(),
            self.airmass.to_string(),
        ];

        Ok(IMAGE_FIELDS
            .iter()
            .zip(values)
            .fold(Element::new("image"), |image, (tag, value)| {
                image.with_child(Element::new(*tag).with_text(value))
            }))
    }

    /// Extract the values of a validated `image` element
    pub(crate) fn from_element(image: &Element) -> Result<Self, LemonError> {
        Ok(ImageDescriptor {
            path: child_text(image, "path")?.to_string(),
            date: parse_utc_time(child_text(image, "date")?)?,
            filter: child_text(image, "filter")?.parse()?,
            object: child_text(image, "object")?.to_string(),
            fwhm: parse_float("fwhm", child_text(image, "fwhm")?)?,
            airmass: parse_float("airmass", child_text(image, "airmass")?)?,
        })
    }
}

/// Text of the first child named `tag`
fn child_text<'a>(element: &'a Element, tag: &str) -> Result<&'a str, LemonError> {
    element.child(tag).map(Element::text).ok_or_else(|| {
        LemonError::SchemaViolation(format!("{}: missing '{tag}' element", element.name))
    })
}

pub(crate) fn parse_float(field: &str, text: &str) -> Result<f64, LemonError> {
    text.trim()
        .parse()
        .map_err(|_| LemonError::invalid_value(field, text))
}
