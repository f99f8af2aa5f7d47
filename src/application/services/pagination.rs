use crate::application::error::{ServiceError, ServiceResult};

const COMPONENT: &str = "pagination";

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// A validated list request. Instances only come out of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Strict bounds and type checking for list requests. Takes the raw
/// query-string values so that "not an integer" and "out of range" stay
/// distinguishable; integer-ness of both values is checked before any
/// range rule. Values are never corrected, only accepted or rejected.
pub fn validate(page: Option<&str>, limit: Option<&str>) -> ServiceResult<PageRequest> {
    let page = match page {
        None => i64::from(DEFAULT_PAGE),
        Some(raw) => parse_integer(raw, "page")?,
    };
    let limit = match limit {
        None => i64::from(DEFAULT_LIMIT),
        Some(raw) => parse_integer(raw, "limit")?,
    };

    let page = in_range(page, 1, u32::MAX, "page must be greater than or equal to 1")?;
    let limit = in_range(
        limit,
        1,
        MAX_LIMIT,
        "limit must be between 1 and 100",
    )?;

    Ok(PageRequest { page, limit })
}

fn parse_integer(raw: &str, field: &str) -> ServiceResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::validation(COMPONENT, format!("{field} must be an integer")))
}

fn in_range(value: i64, min: u32, max: u32, message: &str) -> ServiceResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| (min..=max).contains(v))
        .ok_or_else(|| ServiceError::validation(COMPONENT, message))
}
