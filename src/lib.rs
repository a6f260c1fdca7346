//! # specfit-rs
//!
//! `specfit-rs` provides model components for fitting spectra and other
//! one-dimensional signals, together with an exact symbolic test deciding
//! whether a model is linear in each of its parameters.
//!
//! Knowing which parameters enter a model linearly lets fitting code solve a
//! model by linear least squares when every free parameter is linear, and
//! fall back to an iterative nonlinear optimizer otherwise.
//!
//! The library provides:
//! - An expression language for model formulas, with exact differentiation
//! - A linearity classifier working on a canonical normal form, not on samples
//! - Closed-form components (Gaussian, Lorentzian, offset, polynomial,
//!   exponential, power law) and formula-defined components
//! - Models that aggregate components, report whether they are linear in their
//!   free parameters, evaluate in parallel, and store to JSON
//!
//! ## Basic Usage
//!
//! ```
//! use specfit_rs::check_parameter_linearity;
//!
//! let expr = "height * exp(-(x - centre)**2 * 4 * log(2) / fwhm**2)";
//! assert!(check_parameter_linearity(expr, "height").unwrap());
//! assert!(!check_parameter_linearity(expr, "centre").unwrap());
//! assert!(!check_parameter_linearity(expr, "fwhm").unwrap());
//! ```

pub mod error;

// Expression language and parameter bookkeeping
pub mod parameters;

// Computer algebra
pub mod symbolic;

pub mod linearity;

// Components and models
pub mod component;
pub mod components;
pub mod model;

// Re-exports for convenience
pub use component::{Component, ComponentKind, SharedComponent};
pub use error::{Result, SpecFitError};
pub use linearity::{
    check_parameter_linearity, is_linear, AbsentParameterPolicy, LinearityClassifier,
    LinearityConfig,
};
pub use model::{FitStrategy, Model, ParameterId};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
