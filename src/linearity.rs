//! # Parameter Linearity
//!
//! Decides whether a model expression is linear in one of its parameters. A
//! parameter `p` is linear when the second partial derivative of the
//! expression with respect to `p` is identically zero, with every other
//! symbol (the independent variable and the remaining parameters) held
//! opaque. Fitting code uses the result to pick a linear least-squares solver
//! instead of an iterative nonlinear optimizer.
//!
//! The test is exact: derivatives are computed symbolically and the zero test
//! works on a canonical normal form, never on sampled values.
//!
//! ```rust
//! use specfit_rs::linearity::check_parameter_linearity;
//!
//! assert!(check_parameter_linearity("a*sin(b*x)", "a").unwrap());
//! assert!(!check_parameter_linearity("a*sin(b*x)", "b").unwrap());
//! ```

use crate::error::{Result, SpecFitError};
use crate::parameters::expression::{Expression, ExpressionError};
use crate::symbolic::{NormalFormEngine, SymbolicEngine};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// What to report for a parameter that does not occur in the expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsentParameterPolicy {
    /// An absent parameter cannot introduce nonlinearity, so report it as linear
    #[default]
    Linear,

    /// Fail with [`SpecFitError::UnknownSymbol`]
    Error,
}

/// Configuration for the linearity classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearityConfig {
    /// Name of the independent variable. Default: "x"
    pub independent_variable: String,

    /// Handling of parameters missing from the expression. Default: Linear
    pub absent_policy: AbsentParameterPolicy,
}

impl Default for LinearityConfig {
    fn default() -> Self {
        Self {
            independent_variable: "x".to_string(),
            absent_policy: AbsentParameterPolicy::default(),
        }
    }
}

impl LinearityConfig {
    /// Use a different independent variable name
    pub fn with_independent_variable(mut self, name: &str) -> Self {
        self.independent_variable = name.to_string();
        self
    }

    /// Set the policy for parameters missing from the expression
    pub fn with_absent_policy(mut self, policy: AbsentParameterPolicy) -> Self {
        self.absent_policy = policy;
        self
    }
}

/// Classifies parameters of an expression as linear or non-linear.
///
/// The classifier is stateless apart from its configuration, so one instance
/// can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct LinearityClassifier<E: SymbolicEngine = NormalFormEngine> {
    engine: E,
    config: LinearityConfig,
}

impl LinearityClassifier<NormalFormEngine> {
    /// Create a classifier backed by the default engine
    pub fn new(config: LinearityConfig) -> Self {
        Self {
            engine: NormalFormEngine,
            config,
        }
    }
}

impl<E: SymbolicEngine> LinearityClassifier<E> {
    /// Create a classifier backed by a custom symbolic engine
    pub fn with_engine(engine: E, config: LinearityConfig) -> Self {
        Self { engine, config }
    }

    /// The classifier configuration
    pub fn config(&self) -> &LinearityConfig {
        &self.config
    }

    /// The symbolic engine doing the algebra
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Decide whether `expression` is linear in `parameter`.
    ///
    /// `other_symbols` names the remaining symbols of the expression (other
    /// parameters and the independent variable); all of them are held opaque.
    /// Symbols that appear in the expression but are not listed are held
    /// opaque as well. The result does not depend on the order of
    /// `other_symbols`.
    ///
    /// # Errors
    ///
    /// * [`SpecFitError::InvalidInput`] if `other_symbols` contains `parameter`
    /// * [`SpecFitError::UnknownSymbol`] if `parameter` is absent and the
    ///   policy is [`AbsentParameterPolicy::Error`]
    /// * [`SpecFitError::Expression`] if the expression uses an unknown function
    pub fn is_linear<I, S>(
        &self,
        expression: &Expression,
        parameter: &str,
        other_symbols: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let others: BTreeSet<String> = other_symbols
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if others.contains(parameter) {
            return Err(SpecFitError::InvalidInput(format!(
                "Parameter '{}' cannot also be listed as an opaque symbol",
                parameter
            )));
        }

        let undeclared: Vec<String> = expression
            .variables()
            .into_iter()
            .filter(|name| name != parameter && !others.contains(name))
            .collect();
        if !undeclared.is_empty() {
            debug!(
                "holding undeclared symbols opaque while classifying '{}': {}",
                parameter,
                undeclared.join(", ")
            );
        }

        self.classify_present(expression, parameter)
    }

    /// Decide linearity with every other symbol of the expression held opaque
    pub fn classify(&self, expression: &Expression, parameter: &str) -> Result<bool> {
        if parameter == self.config.independent_variable {
            return Err(SpecFitError::InvalidInput(format!(
                "'{}' is the independent variable, not a parameter",
                parameter
            )));
        }
        self.classify_present(expression, parameter)
    }

    /// Classify every parameter of the expression, i.e. every symbol except
    /// the independent variable
    pub fn classify_all(&self, expression: &Expression) -> Result<BTreeMap<String, bool>> {
        expression
            .variables()
            .into_iter()
            .filter(|name| *name != self.config.independent_variable)
            .map(|name| {
                let linear = self.classify_present(expression, &name)?;
                Ok((name, linear))
            })
            .collect()
    }

    fn classify_present(&self, expression: &Expression, parameter: &str) -> Result<bool> {
        if !expression.contains_variable(parameter) {
            return match self.config.absent_policy {
                AbsentParameterPolicy::Linear => {
                    debug!(
                        "'{}' does not occur in '{}', treating it as linear",
                        parameter, expression
                    );
                    Ok(true)
                }
                AbsentParameterPolicy::Error => Err(SpecFitError::UnknownSymbol {
                    symbol: parameter.to_string(),
                    expression: expression.to_string(),
                }),
            };
        }

        let first = match self.engine.differentiate(expression, parameter) {
            Ok(derivative) => self.engine.simplify(&derivative),
            Err(err) => return non_differentiable(err, parameter),
        };
        let second = match self.engine.differentiate(&first, parameter) {
            Ok(derivative) => derivative,
            Err(err) => return non_differentiable(err, parameter),
        };

        let linear = self.engine.is_zero(&second);
        debug!(
            "'{}' is {} in '{}'",
            parameter,
            if linear { "linear" } else { "non-linear" },
            expression
        );
        Ok(linear)
    }
}

/// A parameter inside a non-differentiable function is non-linear; other
/// errors are propagated
fn non_differentiable(err: ExpressionError, parameter: &str) -> Result<bool> {
    match err {
        ExpressionError::NonDifferentiable { name, .. } => {
            debug!("'{}' appears inside {}(), treating it as non-linear", parameter, name);
            Ok(false)
        }
        other => Err(other.into()),
    }
}

/// Decide whether `expression` is linear in `parameter`, holding
/// `other_symbols` opaque.
///
/// Uses the default configuration: absent parameters are linear.
pub fn is_linear<I, S>(expression: &Expression, parameter: &str, other_symbols: I) -> Result<bool>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    LinearityClassifier::new(LinearityConfig::default()).is_linear(
        expression,
        parameter,
        other_symbols,
    )
}

/// Parse `expression` and decide whether it is linear in `parameter`.
///
/// # Errors
///
/// Returns a parse error if the expression is not valid algebra.
pub fn check_parameter_linearity(expression: &str, parameter: &str) -> Result<bool> {
    let expr = Expression::parse(expression)?;
    LinearityClassifier::new(LinearityConfig::default()).classify(&expr, parameter)
}
