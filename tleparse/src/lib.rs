pub use crate::checksum::checksum;
pub use crate::parser::{
    parse_named_tle, parse_tle, parse_tle_set, parse_unstructured_tle_set, ParseError,
};

pub mod checksum;
pub mod parser;

/// Every data line of a TLE is exactly this many characters, checksum included
pub const LINE_LENGTH: usize = 69;

/// Name used for element sets supplied in the bare two-line format
pub const UNNAMED_SATELLITE: &str = "UNKNOWN";
