use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{
    constants::{UnixTime, DATE_FORMAT},
    lemon_errors::LemonError,
};

/// Render Unix time as a fixed-pattern UTC string
///
/// Argument
/// --------
/// * `seconds`: seconds since the Unix epoch
///
/// Return
/// ------
/// * the date in the form `Mon Feb 13 23:11:20 2012 UTC`, or
///   [`LemonError::InvalidValue`] if the instant is outside the representable range
pub fn utc_time(seconds: UnixTime) -> Result<String, LemonError> {
    let date = DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| LemonError::invalid_value("date", seconds.to_string()))?;
    Ok(date.format(DATE_FORMAT).to_string())
}

/// Current time, rendered with the same pattern as [`utc_time`]
pub fn utc_now() -> String {
    Utc::now().format(DATE_FORMAT).to_string()
}

/// Parse a fixed-pattern UTC string back into Unix time
///
/// The calendar fields are interpreted as UTC, never as local time. The weekday must agree
/// with the date, and a space-padded day of the month is accepted.
///
/// Argument
/// --------
/// * `date_str`: a date such as `Mon Feb 13 23:11:20 2012 UTC`
///
/// Return
/// ------
/// * the number of seconds since the Unix epoch
pub fn parse_utc_time(date_str: &str) -> Result<UnixTime, LemonError> {
    NaiveDateTime::parse_from_str(date_str.trim(), DATE_FORMAT)
        .map(|naive| naive.and_utc().timestamp())
        .map_err(|_| LemonError::invalid_value("date", date_str))
}
