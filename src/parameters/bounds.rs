//! Parameter bounds
//!
//! Closed intervals `[min, max]` restricting the values a fit parameter may
//! take. Infinite ends are stored as `null` in JSON so that stored models stay
//! valid JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Bounds must not be NaN")]
    NotANumber,
}

/// Closed interval of admissible parameter values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredBounds", into = "StoredBounds")]
pub struct Bounds {
    /// Lower end, `-inf` when unbounded below
    pub min: f64,

    /// Upper end, `+inf` when unbounded above
    pub max: f64,
}

/// JSON shape of [`Bounds`]; `None` stands for an infinite end
#[derive(Serialize, Deserialize)]
struct StoredBounds {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl From<StoredBounds> for Bounds {
    fn from(stored: StoredBounds) -> Self {
        Self {
            min: stored.min.unwrap_or(f64::NEG_INFINITY),
            max: stored.max.unwrap_or(f64::INFINITY),
        }
    }
}

impl From<Bounds> for StoredBounds {
    fn from(bounds: Bounds) -> Self {
        Self {
            min: bounds.has_lower_bound().then_some(bounds.min),
            max: bounds.has_upper_bound().then_some(bounds.max),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Bounds {
    /// Create bounds, rejecting `min > max` and NaN ends
    ///
    /// # Examples
    ///
    /// ```
    /// use specfit_rs::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert!(bounds.contains(5.0));
    /// assert!(Bounds::new(10.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() {
            return Err(BoundsError::NotANumber);
        }
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// `(-inf, +inf)`
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// `[min, +inf)`
    pub fn min_only(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    /// `(-inf, max]`
    pub fn max_only(max: f64) -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Fail with [`BoundsError::ValueOutsideBounds`] unless `value` lies inside
    pub fn check(&self, value: f64) -> Result<(), BoundsError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// True when neither end is finite
    pub fn is_unbounded(&self) -> bool {
        !self.has_lower_bound() && !self.has_upper_bound()
    }

    /// Nearest admissible value
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}
