use std::iter;

use itertools::Itertools;

use crate::{constants::GENERATOR, time::utc_now};

/// Insert the generation comment and the DOCTYPE block right after the XML declaration
///
/// Arguments
/// -----------------
/// * `xml`: a serialized document whose first line is the XML declaration
/// * `dtd`: the lines of the DOCTYPE block
///
/// Return
/// ----------
/// * the document with the header lines inserted, timestamped with the current UTC time
pub fn setup_header(xml: &str, dtd: &[&str]) -> String {
    setup_header_at(xml, dtd, &utc_now())
}

pub(crate) fn setup_header_at(xml: &str, dtd: &[&str], timestamp: &str) -> String {
    let mut lines = xml.split('\n');
    let declaration = lines.next().unwrap_or_default();
    let comment = format!("<!-- File generated by {GENERATOR} on {timestamp} -->");

    iter::once(declaration)
        .chain(iter::once(comment.as_str()))
        .chain(dtd.iter().copied())
        .chain(lines)
        .join("\n")
}
