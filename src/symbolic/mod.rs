//! # Symbolic Engine
//!
//! Minimal computer-algebra support for model expressions: exact
//! differentiation, simplification to a canonical normal form, and an exact
//! zero test. The linearity classifier only talks to the [`SymbolicEngine`]
//! trait, so another engine can be plugged in without touching it.
//!
//! ```rust
//! use specfit_rs::parameters::Expression;
//! use specfit_rs::symbolic::{NormalFormEngine, SymbolicEngine};
//!
//! let engine = NormalFormEngine;
//! let expr = Expression::parse("a * x**2 + b * x + c").unwrap();
//!
//! let da = engine.differentiate(&expr, "a").unwrap();
//! assert_eq!(engine.simplify(&da).to_string(), "x**2");
//!
//! let dda = engine.differentiate(&da, "a").unwrap();
//! assert!(engine.is_zero(&dda));
//! ```

pub mod derivative;
pub mod normal_form;

pub use derivative::differentiate;
pub use normal_form::Polynomial;

use crate::parameters::expression::{Expression, ExpressionError};

/// Operations the linearity classifier needs from a computer-algebra backend
pub trait SymbolicEngine {
    /// Rewrite an expression into a simpler, equivalent expression
    fn simplify(&self, expr: &Expression) -> Expression;

    /// Partial derivative with respect to `symbol`, all other symbols held constant
    fn differentiate(&self, expr: &Expression, symbol: &str) -> Result<Expression, ExpressionError>;

    /// Exact test for an identically zero expression
    fn is_zero(&self, expr: &Expression) -> bool;
}

/// Default engine built on structural differentiation and [`Polynomial`] normal forms
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalFormEngine;

impl SymbolicEngine for NormalFormEngine {
    fn simplify(&self, expr: &Expression) -> Expression {
        Polynomial::from_expression(expr).to_expression()
    }

    fn differentiate(&self, expr: &Expression, symbol: &str) -> Result<Expression, ExpressionError> {
        derivative::differentiate(expr, symbol)
    }

    fn is_zero(&self, expr: &Expression) -> bool {
        Polynomial::from_expression(expr).is_zero()
    }
}

/// Simplify an expression with the default engine
pub fn simplify(expr: &Expression) -> Expression {
    NormalFormEngine.simplify(expr)
}
