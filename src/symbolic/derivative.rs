//! Exact structural differentiation of expressions.
//!
//! Every symbol other than the one being differentiated against is treated as
//! an opaque constant, so any sub-expression that does not mention the symbol
//! differentiates to zero without being inspected further.

use crate::parameters::expression::{BinaryOp, Expression, ExpressionError, UnaryOp};
use crate::parameters::Rational;
use num_rational::BigRational;
use num_traits::One;

/// Partial derivative of `expr` with respect to `symbol`.
///
/// The result is not simplified. Functions that are not differentiable
/// everywhere (`abs`, `sign`, `min`, `max`) yield
/// [`ExpressionError::NonDifferentiable`] when their arguments depend on
/// `symbol`.
pub fn differentiate(expr: &Expression, symbol: &str) -> Result<Expression, ExpressionError> {
    if !expr.contains_variable(symbol) {
        return Ok(Expression::integer(0));
    }

    match expr {
        Expression::Number(_) | Expression::Rational(_) => Ok(Expression::integer(0)),

        // Only reachable when the name matches
        Expression::Variable(_) => Ok(Expression::integer(1)),

        Expression::Unary(UnaryOp::Neg, inner) => Ok(-differentiate(inner, symbol)?),

        Expression::Binary(op, left, right) => {
            let u = left.as_ref().clone();
            let v = right.as_ref().clone();
            let du = differentiate(left, symbol)?;
            let dv = differentiate(right, symbol)?;

            match op {
                BinaryOp::Add => Ok(du + dv),
                BinaryOp::Sub => Ok(du - dv),
                BinaryOp::Mul => Ok(du * v.clone() + u * dv),
                BinaryOp::Div => Ok((du * v.clone() - u * dv) / v.pow(Expression::integer(2))),
                BinaryOp::Pow => Ok(differentiate_power(u, v, du, dv, symbol)),
            }
        }

        Expression::Function(name, args) => differentiate_function(name, args, symbol),
    }
}

fn differentiate_power(
    base: Expression,
    exponent: Expression,
    dbase: Expression,
    dexponent: Expression,
    symbol: &str,
) -> Expression {
    let base_depends = base.contains_variable(symbol);
    let exponent_depends = exponent.contains_variable(symbol);

    if !exponent_depends {
        // d(u^n) = n * u^(n - 1) * du
        let reduced = match exponent.as_rational() {
            Some(n) => Expression::Rational(Rational::new(n.exact() - BigRational::one())),
            None => exponent.clone() - Expression::integer(1),
        };
        exponent * base.pow(reduced) * dbase
    } else if !base_depends {
        // d(c^v) = c^v * ln(c) * dv
        base.clone().pow(exponent) * Expression::call("log", base) * dexponent
    } else {
        // d(u^v) = u^v * (dv * ln(u) + v * du / u)
        let power = base.clone().pow(exponent.clone());
        power
            * (dexponent * Expression::call("log", base.clone()) + exponent * dbase / base)
    }
}

fn differentiate_function(
    name: &str,
    args: &[Expression],
    symbol: &str,
) -> Result<Expression, ExpressionError> {
    match name {
        "abs" | "sign" | "min" | "max" => {
            return Err(ExpressionError::NonDifferentiable {
                name: name.to_string(),
                symbol: symbol.to_string(),
            })
        }
        "sin" | "cos" | "tan" | "sinh" | "cosh" | "tanh" | "arctan" | "atan" | "exp" | "log"
        | "ln" | "log10" | "sqrt" => {}
        _ => {
            return Err(ExpressionError::UndefinedFunction {
                name: name.to_string(),
            })
        }
    }

    if args.len() != 1 {
        return Err(ExpressionError::InvalidOperation {
            message: format!("{}() requires 1 argument, got {}", name, args.len()),
        });
    }

    let u = args[0].clone();
    let du = differentiate(&u, symbol)?;
    let one = || Expression::integer(1);
    let two = || Expression::integer(2);

    // Outer derivative evaluated at u, multiplied by the inner derivative
    let outer = match name {
        "sin" => Expression::call("cos", u),
        "cos" => -Expression::call("sin", u),
        "tan" => one() / Expression::call("cos", u).pow(two()),
        "sinh" => Expression::call("cosh", u),
        "cosh" => Expression::call("sinh", u),
        "tanh" => one() / Expression::call("cosh", u).pow(two()),
        "arctan" | "atan" => one() / (one() + u.pow(two())),
        "exp" => Expression::call("exp", u),
        "log" | "ln" => one() / u,
        "log10" => one() / (u * Expression::call("log", Expression::integer(10))),
        // sqrt
        _ => one() / (two() * Expression::call("sqrt", u)),
    };

    Ok(outer * du)
}
