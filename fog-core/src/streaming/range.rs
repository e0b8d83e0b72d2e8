//! HTTP Range header parsing for media streaming
//!
//! Parsing is lenient: anything that is not a single `bytes=` range is
//! treated as if no Range header had been sent, and the caller falls back to
//! a full-content response. Satisfiability is strict: a window reaching past
//! the resource is rejected rather than clamped.

/// Single byte range as requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `bytes=<start>-<end?>`; a missing end means "to end of resource"
    From {
        /// First requested byte
        start: u64,
        /// Last requested byte, inclusive
        end: Option<u64>,
    },
    /// `bytes=-<length>`, the final `length` bytes
    Suffix {
        /// Number of trailing bytes requested
        length: u64,
    },
}

/// Satisfiable inclusive byte window of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the window, never zero.
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this window of a `total_size` byte resource.
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_size)
    }
}

/// Errors that can occur during range handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("Range not satisfiable for {total_size} byte resource")]
    NotSatisfiable { total_size: u64 },
}

impl RangeSpec {
    /// Resolves the request against a resource of `total_size` bytes.
    ///
    /// # Errors
    ///
    /// - `RangeError::NotSatisfiable` - `start >= total_size`, `end >= total_size`,
    ///   `start > end`, or an empty suffix
    pub fn resolve(&self, total_size: u64) -> Result<ByteRange, RangeError> {
        let unsatisfiable = RangeError::NotSatisfiable { total_size };
        if total_size == 0 {
            return Err(unsatisfiable);
        }

        match *self {
            RangeSpec::From { start, end } => {
                let end = end.unwrap_or(total_size - 1);
                if start >= total_size || end >= total_size || start > end {
                    return Err(unsatisfiable);
                }
                Ok(ByteRange { start, end })
            }
            RangeSpec::Suffix { length } => {
                if length == 0 {
                    return Err(unsatisfiable);
                }
                Ok(ByteRange {
                    start: total_size.saturating_sub(length),
                    end: total_size - 1,
                })
            }
        }
    }
}

/// Parses a Range header value.
///
/// Returns None for anything other than a single `bytes=` range with
/// decimal offsets.
///
/// # Examples
/// ```
/// use fog_core::streaming::range::{RangeSpec, parse_range_header};
///
/// assert_eq!(
///     parse_range_header("bytes=100-199"),
///     Some(RangeSpec::From { start: 100, end: Some(199) })
/// );
/// assert_eq!(parse_range_header("bytes=abc"), None);
/// ```
pub fn parse_range_header(value: &str) -> Option<RangeSpec> {
    let value = value.trim();
    let unit = value.get(..6)?;
    if !unit.eq_ignore_ascii_case("bytes=") {
        return None;
    }

    let range_spec = value[6..].trim();
    if range_spec.contains(',') {
        return None;
    }

    let (start_str, end_str) = range_spec.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return Some(RangeSpec::Suffix {
            length: parse_offset(end_str)?,
        });
    }

    let start = parse_offset(start_str)?;
    let end = if end_str.is_empty() {
        None
    } else {
        Some(parse_offset(end_str)?)
    };
    Some(RangeSpec::From { start, end })
}

fn parse_offset(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
