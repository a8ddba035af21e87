//! Modulo-10 line checksum

use crate::LINE_LENGTH;

/// Computes the checksum of a TLE data line.
///
/// Digits count their value, each minus sign counts one, everything else is ignored.
/// Only the characters before the checksum column take part.
pub fn checksum(line: &str) -> u32 {
    line.chars()
        .take(LINE_LENGTH - 1)
        .map(|c| match c {
            '-' => 1,
            c => c.to_digit(10).unwrap_or(0),
        })
        .sum::<u32>()
        % 10
}
