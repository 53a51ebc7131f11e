//! Common utilities for report generation.
//!
//! Shared helpers for field formatting (coordinates, dates, yes/no labels) and
//! output file naming.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

use super::tables::CellValue;

pub const LABEL_YES: &str = "Sim";
pub const LABEL_NO: &str = "Não";

lazy_static! {
    static ref ILLEGAL_FILENAME_CHARS: Regex = Regex::new(r#"[\\/:*?"<>|]+"#).unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Render a genuine boolean as `Sim`/`Não`; anything else keeps its text.
pub fn bool_label(value: Option<&CellValue>) -> String {
    match value {
        Some(CellValue::Bool(true)) => LABEL_YES.to_string(),
        Some(CellValue::Bool(false)) => LABEL_NO.to_string(),
        Some(other) => other.as_text(),
        None => String::new(),
    }
}

/// Convert decimal degrees into `DD°MM'SS.S"H`.
pub fn decimal_to_dms(value: f64, is_lat: bool) -> String {
    let hemi = match (is_lat, value >= 0.0) {
        (true, true) => 'N',
        (true, false) => 'S',
        (false, true) => 'E',
        (false, false) => 'W',
    };

    let abs_val = value.abs();
    let mut degrees = abs_val.trunc() as u32;
    let minutes_float = (abs_val - f64::from(degrees)) * 60.0;
    let mut minutes = minutes_float.trunc() as u32;
    let mut seconds = ((minutes_float - f64::from(minutes)) * 600.0).round() / 10.0;

    // 59.96" prints as 60.0" unless carried.
    if seconds >= 60.0 {
        seconds -= 60.0;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes -= 60;
        degrees += 1;
    }

    format!("{degrees:02}°{minutes:02}'{seconds:04.1}\"{hemi}")
}

fn parse_degrees(part: &str) -> Option<f64> {
    part.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Turn `"lat, lon"` (comma or semicolon separated) into two DMS strings.
///
/// Anything that does not parse as two numbers is returned unchanged.
pub fn format_coordinate(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let normalized = raw.replace(';', ",");
    let parts: Vec<&str> = normalized.split(',').collect();
    if parts.len() < 2 {
        return raw.to_string();
    }

    match (parse_degrees(parts[0]), parse_degrees(parts[1])) {
        (Some(lat), Some(lon)) => format!(
            "{} {}",
            decimal_to_dms(lat, true),
            decimal_to_dms(lon, false)
        ),
        _ => raw.to_string(),
    }
}

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

/// Reformat a date as `DD/MM/YYYY`; unparseable text passes through.
pub fn format_br_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match parse_date(raw) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

/// Sanitize a client name for use in the report file name.
///
/// Characters illegal on Windows or Linux and runs of whitespace become `_`;
/// leading and trailing `.`, `_` and `-` are dropped.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let replaced = ILLEGAL_FILENAME_CHARS.replace_all(name, "_");
    let collapsed = WHITESPACE_RUN.replace_all(replaced.trim(), "_");
    let result = collapsed.trim_matches(|c| c == '.' || c == '_' || c == '-');

    if result.is_empty() {
        fallback.to_string()
    } else {
        result.to_string()
    }
}

/// `Laudo_<name>.docx` for a client name, falling back to the inspection id.
pub fn report_filename(client_name: &str, id_vistoria: &str) -> String {
    let base = if client_name.trim().is_empty() {
        id_vistoria
    } else {
        client_name
    };
    format!("Laudo_{}.docx", sanitize_filename(base, id_vistoria))
}
