use crate::log::{Error, INVALID_SYNTAX};
use serde::Serialize;
use std::{fmt::Display, str::FromStr};

/// A magnitude with an optional unit, such as `100px`, `1.5em` or `50%`.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ValueUnit {
    pub magnitude: f64,
    /// Unit text, empty for a dimensionless number.
    pub unit: String,
}

impl ValueUnit {
    /// Create a new [`ValueUnit`].
    pub fn new<T>(magnitude: f64, unit: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            magnitude,
            unit: unit.into(),
        }
    }

    /// Create a new dimensionless [`ValueUnit`].
    pub fn unitless(magnitude: f64) -> Self {
        Self::new(magnitude, "")
    }

    /// Return true if the [`ValueUnit`] has no unit.
    pub fn is_unitless(&self) -> bool {
        self.unit.is_empty()
    }
}

impl Display for ValueUnit {
    /// Integral magnitudes are written without a fraction, and negative
    /// zero is written as `0`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let magnitude = if self.magnitude == 0.0 {
            0.0
        } else {
            self.magnitude
        };

        write!(f, "{magnitude}{}", self.unit)
    }
}

impl FromStr for ValueUnit {
    type Err = Error;

    /// Parse text such as `-1.5em`, `50%` or `10`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let split = text
            .find(|c: char| !matches!(c, '-' | '+' | '.' | '0'..='9'))
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(split);
        let is_unit = unit == "%" || unit.chars().all(|c| c.is_ascii_alphabetic());

        match number.parse::<f64>() {
            Ok(magnitude) if is_unit && magnitude.is_finite() => Ok(Self::new(magnitude, unit)),
            _ => Err(Error::build(INVALID_SYNTAX).with_help(format!(
                "`{text}` is not a number with an optional unit, like `100px`"
            ))),
        }
    }
}
