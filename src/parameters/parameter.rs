//! Parameter definition and implementation
//!
//! A [`Parameter`] is a named scalar of a fit component. Besides its value and
//! bounds it carries the `free` flag (whether a fit may vary it) and a cached
//! `linear` flag describing how the component's model depends on it. The
//! linear flag is owned by the component: it is set when the component is
//! built and is never stored in JSON.

use crate::parameters::bounds::{Bounds, BoundsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Parameter '{name}' already exists")]
    DuplicateParameter { name: String },

    #[error("Invalid parameter name '{name}'")]
    InvalidName { name: String },
}

/// A named model parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,

    /// Current value
    value: f64,

    /// Value at creation, restored by [`Parameter::reset`]
    init_value: f64,

    /// Whether a fit may vary this parameter
    free: bool,

    #[serde(default)]
    bounds: Bounds,

    /// Standard deviation estimated by the last fit
    #[serde(default)]
    std: Option<f64>,

    /// Whether the component's model is linear in this parameter
    #[serde(skip, default = "default_linear")]
    linear: bool,
}

fn default_linear() -> bool {
    true
}

impl Parameter {
    /// Create a free, unbounded parameter.
    ///
    /// New parameters are linear until their component classifies them.
    ///
    /// # Examples
    ///
    /// ```
    /// use specfit_rs::parameters::Parameter;
    ///
    /// let param = Parameter::new("A", 10.0);
    /// assert_eq!(param.name(), "A");
    /// assert_eq!(param.value(), 10.0);
    /// assert!(param.free());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            free: true,
            bounds: Bounds::default(),
            std: None,
            linear: true,
        }
    }

    /// Create a free parameter restricted to `[min, max]`
    ///
    /// # Examples
    ///
    /// ```
    /// use specfit_rs::parameters::Parameter;
    ///
    /// let mut sigma = Parameter::with_bounds("sigma", 1.0, 0.0, f64::INFINITY).unwrap();
    /// assert_eq!(sigma.min(), 0.0);
    /// assert!(sigma.set_value(-1.0).is_err());
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        bounds.check(value)?;
        let mut param = Self::new(name, value);
        param.bounds = bounds;
        Ok(param)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value, rejecting values outside the bounds
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        self.bounds.check(value)?;
        self.value = value;
        Ok(())
    }

    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Restore the initial value, clamped to the current bounds
    pub fn reset(&mut self) {
        self.value = self.bounds.clamp(self.init_value);
        self.std = None;
    }

    /// Whether a fit may vary this parameter
    pub fn free(&self) -> bool {
        self.free
    }

    pub fn set_free(&mut self, free: bool) {
        self.free = free;
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    /// Replace the bounds. The value is clamped into the new interval.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        self.bounds = Bounds::new(min, max)?;
        self.value = self.bounds.clamp(self.value);
        Ok(())
    }

    pub fn std(&self) -> Option<f64> {
        self.std
    }

    pub fn set_std(&mut self, std: Option<f64>) {
        self.std = std;
    }

    /// Whether the owning component's model is linear in this parameter
    pub fn linear(&self) -> bool {
        self.linear
    }

    pub(crate) fn set_linear(&mut self, linear: bool) {
        self.linear = linear;
    }
}
