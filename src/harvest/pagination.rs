//! Page-count detection from site pagination indicators
//!
//! Sites render their pagination in many shapes ("Page 3 of 12", "1 2 … 12",
//! a last-page link such as `?page=12`). The total is taken to be the last
//! integer in the indicator text. Anything unreadable degrades to one page.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Reasons an indicator could not be read; never fatal for a job
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaginationParseError {
    #[error("No pagination indicator on the page")]
    Missing,

    #[error("No page number in indicator '{0}'")]
    NoNumber(String),

    #[error("Page number out of range in indicator '{0}'")]
    OutOfRange(String),
}

fn digit_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

/// Reads the total page count from an indicator string
///
/// # Returns
///
/// * `Ok(n)` - The last integer of the indicator, always >= 1
/// * `Err(PaginationParseError)` - The indicator is absent, empty, or has no usable number
pub fn parse_page_count(indicator: Option<&str>) -> Result<u32, PaginationParseError> {
    let text = indicator
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(PaginationParseError::Missing)?;

    let last = digit_pattern()
        .and_then(|pattern| pattern.find_iter(text).last())
        .ok_or_else(|| PaginationParseError::NoNumber(text.to_string()))?;

    match last.as_str().parse::<u32>() {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(PaginationParseError::OutOfRange(text.to_string())),
    }
}

/// Detects the page count, defaulting to a single page
///
/// # Example
///
/// ```
/// use catalog_harvest::harvest::detect_page_count;
///
/// assert_eq!(detect_page_count(Some("Page 3 of 12")), 12);
/// assert_eq!(detect_page_count(None), 1);
/// ```
pub fn detect_page_count(indicator: Option<&str>) -> u32 {
    match parse_page_count(indicator) {
        Ok(count) => count,
        Err(PaginationParseError::Missing) => 1,
        Err(e) => {
            tracing::debug!("{}, assuming a single page", e);
            1
        }
    }
}
