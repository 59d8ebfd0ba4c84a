//! `start,end` range parsing used for namespace and service ranges

use std::ops::RangeInclusive;

use crate::error::{ConfigError, ConfigResult};

/// Parse an inclusive `start,end` range such as `1,10`
pub fn parse_range(input: &str) -> ConfigResult<RangeInclusive<u32>> {
    let invalid = |reason: &str| ConfigError::InvalidRange {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let (start, end) = input
        .split_once(',')
        .ok_or_else(|| invalid("expected <start>,<end>"))?;

    let start: u32 = start
        .trim()
        .parse()
        .map_err(|_| invalid("start is not a non-negative integer"))?;
    let end: u32 = end
        .trim()
        .parse()
        .map_err(|_| invalid("end is not a non-negative integer"))?;

    if start > end {
        return Err(invalid("start is greater than end"));
    }

    Ok(start..=end)
}
