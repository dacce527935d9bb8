//! Built-in validations.

use alloc::{format, string::String};
use core::fmt;

use crate::{Error, Result, Value};

/// A single check applied to a raw value before it is converted.
pub trait Validation: fmt::Debug + Send + Sync {
    /// Returns whether `value` passes. A missing value is `None`.
    fn check(&self, value: Option<&Value>) -> bool;

    /// Describes the requirement, e.g. `must be not-null`.
    fn message(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotNull;

impl Validation for NotNull {
    fn check(&self, value: Option<&Value>) -> bool {
        value.is_some_and(|v| !v.is_null())
    }

    fn message(&self) -> String {
        "must be not-null".into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotEmpty;

impl Validation for NotEmpty {
    fn check(&self, value: Option<&Value>) -> bool {
        match value {
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Dictionary(dict)) => !dict.is_empty(),
            _ => true,
        }
    }

    fn message(&self) -> String {
        "must be not-empty".into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotBlank;

impl Validation for NotBlank {
    fn check(&self, value: Option<&Value>) -> bool {
        match value {
            Some(Value::String(s)) => !s.trim().is_empty(),
            _ => true,
        }
    }

    fn message(&self) -> String {
        "must be not-blank".into()
    }
}

/// Splits `min|max`, where either side may be empty. A single value sets
/// both bounds.
fn bounds(arg: &str) -> Result<(Option<&str>, Option<&str>)> {
    let parts: alloc::vec::Vec<&str> = arg.split('|').map(str::trim).collect();
    match parts.as_slice() {
        [single] => Ok((Some(single), Some(single))),
        [min, max] => Ok((
            Some(*min).filter(|s| !s.is_empty()),
            Some(*max).filter(|s| !s.is_empty()),
        )),
        _ => Err(invalid_argument(arg)),
    }
}

fn invalid_argument(arg: &str) -> Error {
    Error::ValidationParse(format!("invalid validation argument: {arg}"))
}

/// Requires a number to lie within inclusive bounds. Non-numbers pass.
#[derive(Debug, Clone, Copy)]
pub struct Range {
    min: Option<f64>,
    max: Option<f64>,
}

impl Range {
    pub fn parse(arg: &str) -> Result<Self> {
        let parse = |s: &str| -> Result<f64> {
            let value: f64 = s.parse().map_err(|_| invalid_argument(s))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(invalid_argument(s))
            }
        };
        let (min, max) = bounds(arg)?;
        let min = min.map(parse).transpose()?;
        let max = max.map(parse).transpose()?;
        if let (Some(min), Some(max)) = (min, max) {
            if min - max > 1e-8 {
                return Err(invalid_argument(arg));
            }
        }
        Ok(Self { min, max })
    }
}

/// Formats with at most one decimal place.
fn format_decimal(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

impl Validation for Range {
    fn check(&self, value: Option<&Value>) -> bool {
        let Some(Value::Number(n)) = value else {
            return true;
        };
        let n = n.into_f64();
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }

    fn message(&self) -> String {
        match (self.min, self.max) {
            (Some(min), None) => format!("must be at least {}", format_decimal(min)),
            (None, Some(max)) => format!("must be at most {}", format_decimal(max)),
            (Some(min), Some(max)) => format!(
                "must be between {} and {}",
                format_decimal(min),
                format_decimal(max)
            ),
            (None, None) => String::new(),
        }
    }
}

/// Requires the length of a string, array or dictionary to lie within
/// inclusive bounds. Other values pass.
#[derive(Debug, Clone, Copy)]
pub struct Size {
    min: Option<usize>,
    max: Option<usize>,
}

impl Size {
    pub fn parse(arg: &str) -> Result<Self> {
        let parse = |s: &str| -> Result<usize> { s.parse().map_err(|_| invalid_argument(s)) };
        let (min, max) = bounds(arg)?;
        let min = min.map(parse).transpose()?;
        let max = max.map(parse).transpose()?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(invalid_argument(arg));
            }
        }
        Ok(Self { min, max })
    }
}

impl Validation for Size {
    fn check(&self, value: Option<&Value>) -> bool {
        let len = match value {
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(items)) => items.len(),
            Some(Value::Dictionary(dict)) => dict.len(),
            _ => return true,
        };
        self.min.is_none_or(|min| len >= min) && self.max.is_none_or(|max| len <= max)
    }

    fn message(&self) -> String {
        match (self.min, self.max) {
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (None, None) => String::new(),
        }
    }
}
