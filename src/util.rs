use chrono::{DateTime, Local, NaiveDate};


pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SHIPMENT_PREFIX: &str = "REM";

/// Keeps only the ASCII digits of a raw identifier, in order.
///
/// The result is empty when the input has no digits at all; callers that
/// need a usable ICCID must check for that themselves.
pub fn normalize_iccid(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn format_timestamp(t: &DateTime<Local>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

/// `REM-YYYYMMDD`, the part of a shipment number shared by one calendar day.
pub fn shipment_day_prefix(date: &NaiveDate) -> String {
    format!("{}-{}", SHIPMENT_PREFIX, date.format("%Y%m%d"))
}

pub fn format_shipment_number(date: &NaiveDate, sequence: u32) -> String {
    format!("{}-{:04}", shipment_day_prefix(date), sequence)
}

/// Reads the sequence back out of a shipment number.
pub fn shipment_sequence(number: &str) -> Option<u32> {
    let (_, suffix) = number.rsplit_once('-')?;
    suffix.parse().ok()
}
