//! # Parameter System
//!
//! Named model parameters and the expression language used to write component
//! models.
//!
//! ## Core Components
//!
//! - [`Expression`]: parse and evaluate model formulas such as `a*x**2 + b*x + c`
//! - [`Parameter`]: a named value with bounds, a `free` flag and a cached `linear` flag
//! - [`Parameters`]: the ordered parameters of one component
//! - [`Bounds`]: admissible value ranges
//! - [`Rational`]: exact numeric literals
//!
//! ## Example Usage
//!
//! ```rust
//! use specfit_rs::parameters::{Expression, Parameters};
//!
//! let mut params = Parameters::new();
//! params.add_param("A", 3.0).unwrap();
//! params.add_param_with_bounds("tau", 0.5, 0.0, f64::INFINITY).unwrap();
//!
//! // Hold tau at its current value during a fit
//! params.get_mut("tau").unwrap().set_free(false);
//! assert_eq!(params.free().len(), 1);
//!
//! let expr = Expression::parse("A * exp(-x / tau)").unwrap();
//! assert_eq!(expr.variables(), vec!["A", "tau", "x"]);
//! ```

pub mod bounds;
pub mod expression;
pub mod parameter;
pub mod parameters;
pub mod rational;


pub use bounds::{Bounds, BoundsError};
pub use expression::{EvaluationContext, Expression, ExpressionError, SimpleContext};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;
pub use rational::Rational;
