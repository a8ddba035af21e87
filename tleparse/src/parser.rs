//! A parser for NORAD two-line element sets.
//!
//! Framing (optional name line, line 1, line 2) is done with nom, the fixed-width
//! columns of the data lines are then validated and decoded field by field.

use crate::{checksum, LINE_LENGTH, UNNAMED_SATELLITE};
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use isstypes::prelude::*;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{line_ending, multispace0, not_line_ending},
    combinator::{eof, opt, recognize, verify},
    multi::many0,
    sequence::{pair, terminated},
    IResult,
};
use std::{ops::Range, str::FromStr};
use tracing::debug;

/// Zero-based columns of line 1 that separate fields and must hold a space
const LINE1_SEPARATORS: [usize; 8] = [1, 8, 17, 32, 43, 52, 61, 63];
/// Zero-based columns of line 2 that separate fields and must hold a space
const LINE2_SEPARATORS: [usize; 7] = [1, 7, 16, 25, 33, 42, 51];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("No element sets found")]
    Empty,
    #[error("Incomplete element set starting at '{0}'")]
    LineCount(String),
    #[error("Line {line} contains non-ASCII characters")]
    NonAscii { line: u8 },
    #[error("Line {line} has length {len}, expected 69")]
    LineLength { line: u8, len: usize },
    #[error("Line {line} does not start with its line number")]
    LineNumber { line: u8 },
    #[error("Line {line} column {column} should be blank")]
    Separator { line: u8, column: usize },
    #[error("Line {line} checksum mismatch, computed {computed} but found '{found}'")]
    Checksum { line: u8, computed: u32, found: char },
    #[error("Catalog numbers differ between lines ('{line1}' != '{line2}')")]
    CatalogMismatch { line1: String, line2: String },
    #[error("Invalid {field} field '{value}'")]
    Field { field: &'static str, value: String },
    #[error("No element set named '{0}'")]
    NotFound(String),
    #[error("Found {0} element sets but no satellite name to choose one")]
    Ambiguous(usize),
}

/// Splits a TLE text into its element sets without validating the data lines.
///
/// Sets may be in the three-line format (name line first) or the bare two-line
/// format, blank lines between sets are ignored.
pub fn parse_unstructured_tle_set(text: &str) -> Result<Vec<UnstructuredTle>, ParseError> {
    let (rest, tles) = many0(tle)(text).map_err(|_| ParseError::Empty)?;
    let rest = rest.trim();
    if !rest.is_empty() {
        let first_line = rest.lines().next().unwrap_or(rest);
        return Err(ParseError::LineCount(first_line.to_string()));
    }
    if tles.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(tles)
}

/// Parses and validates every element set in a TLE text
pub fn parse_tle_set(text: &str) -> Result<Vec<TleRecord>, ParseError> {
    parse_unstructured_tle_set(text)?
        .into_iter()
        .map(parse_tle)
        .collect()
}

/// Picks one element set out of a TLE text and validates it.
///
/// Names compare case-insensitively with surrounding whitespace ignored. Without a
/// name the text must hold exactly one set.
pub fn parse_named_tle(text: &str, name: Option<&str>) -> Result<TleRecord, ParseError> {
    let mut tles = parse_unstructured_tle_set(text)?;
    let idx = match name {
        Some(name) => {
            let wanted = name.trim();
            tles.iter()
                .position(|t| t.satellite_name.trim().eq_ignore_ascii_case(wanted))
                .ok_or_else(|| ParseError::NotFound(wanted.to_string()))?
        }
        None if tles.len() == 1 => 0,
        None => return Err(ParseError::Ambiguous(tles.len())),
    };
    parse_tle(tles.swap_remove(idx))
}

fn tle(s: &str) -> IResult<&str, UnstructuredTle> {
    let (s, _) = multispace0(s)?;
    let (s, name) = opt(terminated(name_line, line_ending))(s)?;
    let (s, line1) = terminated(data_line("1 "), alt((line_ending, eof)))(s)?;
    let (s, line2) = terminated(data_line("2 "), alt((line_ending, eof)))(s)?;
    Ok((
        s,
        UnstructuredTle {
            satellite_name: name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| UNNAMED_SATELLITE.to_string()),
            line1: line1.trim_end().to_string(),
            line2: line2.trim_end().to_string(),
        },
    ))
}

fn name_line(s: &str) -> IResult<&str, &str> {
    verify(not_line_ending, |l: &str| {
        !l.trim().is_empty() && !l.starts_with("1 ") && !l.starts_with("2 ")
    })(s)
}

fn data_line(number: &'static str) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |s| recognize(pair(tag(number), not_line_ending))(s)
}

/// Validates the data lines of an element set and decodes their fields
pub fn parse_tle(raw: UnstructuredTle) -> Result<TleRecord, ParseError> {
    let line1 = raw.line1.as_str();
    let line2 = raw.line2.as_str();
    validate_line(line1, 1)?;
    validate_line(line2, 2)?;

    let catalog1 = field_str(line1, 2..7);
    let catalog2 = field_str(line2, 2..7);
    if catalog1 != catalog2 {
        return Err(ParseError::CatalogMismatch {
            line1: catalog1.to_string(),
            line2: catalog2.to_string(),
        });
    }

    let norad_id = norad_id(catalog1)?;
    let classification = match &line1[7..8] {
        "U" => Classification::Unclassified,
        "C" => Classification::Classified,
        "S" => Classification::Secret,
        c => return Err(field_err("classification", c)),
    };
    let epoch = epoch(field_str(line1, 18..20), field_str(line1, 20..32))?;

    let drag = DragTerms {
        mean_motion_dot: field(line1, 33..43, "mean motion derivative")?,
        mean_motion_ddot: implied_decimal(&line1[44..52], "mean motion second derivative")?,
        bstar: implied_decimal(&line1[53..61], "bstar")?,
    };
    let element_set_number = field_or_zero(line1, 64..68, "element set number")?;

    let elements = MeanElements {
        inclination_deg: field(line2, 8..16, "inclination")?,
        raan_deg: field(line2, 17..25, "right ascension")?,
        eccentricity: eccentricity(field_str(line2, 26..33))?,
        argument_of_perigee_deg: field(line2, 34..42, "argument of perigee")?,
        mean_anomaly_deg: field(line2, 43..51, "mean anomaly")?,
        mean_motion: field(line2, 52..63, "mean motion")?,
    };
    let revolution_number = field_or_zero(line2, 63..68, "revolution number")?;
    let international_designator = field_str(line1, 9..17).to_string();

    if !(0.0..=180.0).contains(&elements.inclination_deg) {
        return Err(field_err("inclination", field_str(line2, 8..16)));
    }
    if elements.mean_motion <= 0.0 {
        return Err(field_err("mean motion", field_str(line2, 52..63)));
    }

    debug!(name = %raw.satellite_name, norad_id, %epoch, "Parsed element set");

    Ok(TleRecord {
        name: raw.satellite_name.clone(),
        norad_id,
        classification,
        international_designator,
        epoch,
        drag,
        elements,
        element_set_number,
        revolution_number,
        raw,
    })
}

fn validate_line(line: &str, number: u8) -> Result<(), ParseError> {
    if !line.is_ascii() {
        return Err(ParseError::NonAscii { line: number });
    }
    if line.len() != LINE_LENGTH {
        return Err(ParseError::LineLength {
            line: number,
            len: line.len(),
        });
    }
    let expected = [b'0' + number, b' '];
    if line.as_bytes()[..2] != expected {
        return Err(ParseError::LineNumber { line: number });
    }
    let separators: &[usize] = if number == 1 {
        &LINE1_SEPARATORS
    } else {
        &LINE2_SEPARATORS
    };
    if let Some(&col) = separators.iter().find(|&&c| line.as_bytes()[c] != b' ') {
        return Err(ParseError::Separator {
            line: number,
            column: col + 1,
        });
    }
    let computed = checksum(line);
    let found = line.as_bytes()[LINE_LENGTH - 1] as char;
    if found.to_digit(10) != Some(computed) {
        return Err(ParseError::Checksum {
            line: number,
            computed,
            found,
        });
    }
    Ok(())
}

fn field_err(field: &'static str, value: &str) -> ParseError {
    ParseError::Field {
        field,
        value: value.to_string(),
    }
}

fn field_str(line: &str, cols: Range<usize>) -> &str {
    line[cols].trim()
}

fn field<T: FromStr>(line: &str, cols: Range<usize>, name: &'static str) -> Result<T, ParseError> {
    let s = field_str(line, cols);
    s.parse().map_err(|_| field_err(name, s))
}

fn field_or_zero(line: &str, cols: Range<usize>, name: &'static str) -> Result<u32, ParseError> {
    let s = field_str(line, cols);
    if s.is_empty() {
        Ok(0)
    } else {
        s.parse().map_err(|_| field_err(name, s))
    }
}

/// Catalog numbers are five digits, or Alpha-5 (a leading letter standing for 10..=33)
fn norad_id(s: &str) -> Result<NoradId, ParseError> {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() && c != 'I' && c != 'O' => {
            let mut value = c as u32 - 'A' as u32 + 10;
            if c > 'I' {
                value -= 1;
            }
            if c > 'O' {
                value -= 1;
            }
            let rest: u32 = chars
                .as_str()
                .parse()
                .map_err(|_| field_err("catalog number", s))?;
            Ok(value * 10_000 + rest)
        }
        _ => s.parse().map_err(|_| field_err("catalog number", s)),
    }
}

/// Two digit year (57..=99 are 19xx) and a fractional day of year starting at 1.0
fn epoch(year: &str, day: &str) -> Result<UtcTimestamp, ParseError> {
    let yy: i32 = year.parse().map_err(|_| field_err("epoch year", year))?;
    let year_full = if yy < 57 { 2000 + yy } else { 1900 + yy };
    let day_of_year: f64 = day.parse().map_err(|_| field_err("epoch day", day))?;
    let days_in_year = NaiveDate::from_ymd_opt(year_full, 12, 31)
        .map(|d| d.ordinal() as f64)
        .ok_or_else(|| field_err("epoch year", year))?;
    if !(1.0..days_in_year + 1.0).contains(&day_of_year) {
        return Err(field_err("epoch day", day));
    }

    let jan1 = NaiveDate::from_ymd_opt(year_full, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| field_err("epoch year", year))?;
    let offset_ns = ((day_of_year - 1.0) * 86_400.0 * 1e9).round() as i64;
    Ok(Utc.from_utc_datetime(&jan1) + Duration::nanoseconds(offset_ns))
}

/// Eccentricity is written with an implied leading decimal point
fn eccentricity(s: &str) -> Result<f64, ParseError> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(field_err("eccentricity", s));
    }
    format!("0.{s}")
        .parse()
        .map_err(|_| field_err("eccentricity", s))
}

/// Values like ` 12345-4` meaning `0.12345e-4`
fn implied_decimal(s: &str, name: &'static str) -> Result<f64, ParseError> {
    let s = s.trim_end();
    if s.len() < 3 {
        return Err(field_err(name, s));
    }
    let (mantissa, exponent) = s.split_at(s.len() - 2);
    let mantissa = mantissa.trim();
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(d) => (-1.0, d),
        None => (1.0, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(field_err(name, s));
    }
    let exponent: i32 = exponent.parse().map_err(|_| field_err(name, s))?;
    let mantissa: f64 = format!("0.{digits}")
        .parse()
        .map_err(|_| field_err(name, s))?;
    Ok(sign * mantissa * 10f64.powi(exponent))
}
