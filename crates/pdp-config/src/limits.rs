// crates/pdp-config/src/limits.rs
// ============================================================================
// Module: Numeric Limit Resolver
// Description: Arbitrary-precision depth limits and their bounded resolution.
// Purpose: Convert optional unbounded limits into exact i32 values.
// Dependencies: bigdecimal, serde
// ============================================================================

//! ## Overview
//! Depth limits are written in the configuration as non-negative integers of
//! arbitrary size. TOML integers stop at `i64`, so larger values may be given
//! as plain digit strings of at most [`MAX_LIMIT_DIGITS`] significant
//! digits; exponent notation is refused. Resolution converts them into a
//! [`DepthLimit`]: absent means unlimited, present values must fit in `i32`
//! exactly.
//! Values are never clamped or truncated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Unbounded Input
// ============================================================================

/// Maximum significant digits accepted in a decimal limit string.
pub const MAX_LIMIT_DIGITS: usize = 64;

/// Raw limit value as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawLimit {
    /// Native TOML integer.
    Integer(i64),
    /// Decimal string for values beyond the TOML integer range.
    Text(String),
}

/// Non-negative integer of arbitrary size.
///
/// # Invariants
/// - The wrapped value is an integer and is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLimit")]
pub struct UnboundedLimit(BigDecimal);

impl UnboundedLimit {
    /// Returns the underlying value.
    #[must_use]
    pub const fn value(&self) -> &BigDecimal {
        &self.0
    }
}

impl From<u32> for UnboundedLimit {
    fn from(value: u32) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl FromStr for UnboundedLimit {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(format!("depth limit must be a non-negative integer: {trimmed}"));
        }
        let significant = trimmed.trim_start_matches('0');
        if significant.len() > MAX_LIMIT_DIGITS {
            return Err(format!(
                "depth limit exceeds {MAX_LIMIT_DIGITS} digits: {} digits given",
                significant.len()
            ));
        }
        let value = BigDecimal::from_str(trimmed)
            .map_err(|_| format!("depth limit is not a number: {trimmed}"))?;
        Ok(Self(value))
    }
}

impl TryFrom<RawLimit> for UnboundedLimit {
    type Error = String;

    fn try_from(raw: RawLimit) -> Result<Self, Self::Error> {
        match raw {
            RawLimit::Integer(value) if value < 0 => {
                Err(format!("depth limit must be non-negative: {value}"))
            }
            RawLimit::Integer(value) => Ok(Self(BigDecimal::from(value))),
            RawLimit::Text(text) => text.parse(),
        }
    }
}

impl fmt::Display for UnboundedLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SECTION: Resolved Limit
// ============================================================================

/// Bounded depth limit with an "unlimited" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DepthLimit(i32);

impl DepthLimit {
    /// Sentinel meaning "no limit".
    pub const UNLIMITED: Self = Self(-1);

    /// Returns the raw value, `-1` when unlimited.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Returns true for the unlimited sentinel.
    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        self.0 < 0
    }

    /// Returns the maximum depth, or `None` when unlimited.
    #[must_use]
    pub fn max_depth(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

impl Default for DepthLimit {
    fn default() -> Self {
        Self::UNLIMITED
    }
}

impl fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() { f.write_str("unlimited") } else { write!(f, "{}", self.0) }
    }
}

/// Resolves an optional unbounded limit for `field`.
///
/// # Errors
///
/// Returns [`ConfigError::LimitOutOfRange`] when the value exceeds `i32::MAX`.
pub fn resolve_limit(
    field: &'static str,
    value: Option<&UnboundedLimit>,
) -> Result<DepthLimit, ConfigError> {
    let Some(value) = value else {
        return Ok(DepthLimit::UNLIMITED);
    };
    value.0.to_i32().map(DepthLimit).ok_or_else(|| ConfigError::LimitOutOfRange {
        field,
        value: value.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
