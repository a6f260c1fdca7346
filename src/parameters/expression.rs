//! Expression parsing and evaluation for component models
//!
//! This module parses model formulas written in conventional algebraic syntax
//! (`a*x**2 + b*x + c`, `height * exp(-(x - centre)**2 / fwhm**2)`) into an
//! immutable AST that can be evaluated numerically or handed to the symbolic
//! engine for differentiation.
//!
//! Operator precedence follows the usual algebraic conventions:
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1 | `+` `-` | left |
//! | 2 | `*` `/` | left |
//! | 3 | unary `-` `+` | prefix |
//! | 4 | `**` `^` | right |
//!
//! so `-a**2` is `-(a**2)` and `2**-x` is `2**(-x)`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{not, opt, recognize, value},
    error::{Error as NomError, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, terminated},
    IResult, Parser,
};
use super::rational::Rational;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops;
use thiserror::Error;

/// Error that can occur during expression parsing, evaluation or differentiation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("Function '{name}' is not differentiable with respect to '{symbol}'")]
    NonDifferentiable { name: String, symbol: String },
}

/// Result type for expression evaluation
type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Floating-point constant such as `pi`
    Number(f64),

    /// Exact numeric literal
    Rational(Rational),

    /// Variable reference
    Variable(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,

    /// Power (** or ^)
    Pow,
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<f64>;

    /// Check if a variable exists
    fn has_variable(&self, name: &str) -> bool;
}

/// Simple implementation of EvaluationContext using a HashMap
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    /// Map of variable names to values
    variables: HashMap<String, f64>,
}

impl SimpleContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
        }
    }

    /// Set a variable value
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }
}

impl EvaluationContext for SimpleContext {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }
}

impl EvaluationContext for HashMap<String, f64> {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input) {
            Ok((remainder, expr)) => {
                // Make sure the entire input was consumed
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Create an exact integer constant
    pub fn integer(n: i64) -> Self {
        Self::Rational(Rational::integer(n))
    }

    /// Create a variable reference
    pub fn var(name: &str) -> Self {
        Self::Variable(name.to_string())
    }

    /// Create a single-argument function call
    pub fn call(name: &str, arg: Expression) -> Self {
        Self::Function(name.to_string(), vec![arg])
    }

    /// Raise this expression to the given power
    pub fn pow(self, exponent: Expression) -> Self {
        Self::Binary(BinaryOp::Pow, Box::new(self), Box::new(exponent))
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Rational(r) => Ok(r.value()),

            Self::Variable(name) => context.get_variable(name),

            Self::Unary(op, expr) => {
                let value = expr.evaluate(context)?;
                match op {
                    UnaryOp::Neg => Ok(-value),
                }
            }

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }

            Self::Function(name, args) => {
                let mut evaluated_args = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated_args.push(arg.evaluate(context)?);
                }
                apply_function(name, &evaluated_args)
            }
        }
    }

    /// Find all variable names used in the expression, sorted and deduplicated
    pub fn variables(&self) -> Vec<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars.into_iter().collect()
    }

    /// Check whether the named variable occurs anywhere in the expression
    pub fn contains_variable(&self, name: &str) -> bool {
        match self {
            Self::Number(_) | Self::Rational(_) => false,
            Self::Variable(var) => var == name,
            Self::Unary(_, expr) => expr.contains_variable(name),
            Self::Binary(_, left, right) => {
                left.contains_variable(name) || right.contains_variable(name)
            }
            Self::Function(_, args) => args.iter().any(|arg| arg.contains_variable(name)),
        }
    }

    /// Returns the constant value if the expression is a plain number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Rational(r) => Some(r.value()),
            _ => None,
        }
    }

    /// Returns the exact value if the expression is a numeric literal
    pub fn as_rational(&self) -> Option<&Rational> {
        match self {
            Self::Rational(r) => Some(r),
            _ => None,
        }
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Self::Number(_) | Self::Rational(_) => {}

            Self::Variable(name) => {
                vars.insert(name.clone());
            }

            Self::Unary(_, expr) => {
                expr.collect_variables(vars);
            }

            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }

            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }

    /// Binding strength used when printing
    fn precedence(&self) -> u8 {
        match self {
            Self::Binary(BinaryOp::Add | BinaryOp::Sub, _, _) => 1,
            Self::Binary(BinaryOp::Mul | BinaryOp::Div, _, _) => 2,
            Self::Unary(UnaryOp::Neg, _) => 3,
            Self::Rational(r) if r.is_fraction() => 2,
            Self::Number(n) if n.is_sign_negative() => 3,
            Self::Rational(r) if r.is_negative() => 3,
            Self::Binary(BinaryOp::Pow, _, _) => 4,
            Self::Number(_) | Self::Rational(_) | Self::Variable(_) | Self::Function(_, _) => 5,
        }
    }
}

/// Evaluate a named function on already evaluated arguments
pub(crate) fn apply_function(name: &str, args: &[f64]) -> ExprResult<f64> {
    let single = |f: fn(f64) -> f64| -> ExprResult<f64> {
        if args.len() != 1 {
            return Err(ExpressionError::InvalidOperation {
                message: format!("{}() requires 1 argument, got {}", name, args.len()),
            });
        }
        Ok(f(args[0]))
    };

    match name {
        "sin" => single(f64::sin),
        "cos" => single(f64::cos),
        "tan" => single(f64::tan),
        "sinh" => single(f64::sinh),
        "cosh" => single(f64::cosh),
        "tanh" => single(f64::tanh),
        "arctan" | "atan" => single(f64::atan),
        "exp" => single(f64::exp),
        "log" | "ln" => single(f64::ln),
        "log10" => single(f64::log10),
        "sqrt" => single(f64::sqrt),
        "abs" => single(f64::abs),
        "sign" => single(|v| if v == 0.0 { 0.0 } else { v.signum() }),
        "max" | "min" => {
            if args.len() < 2 {
                return Err(ExpressionError::InvalidOperation {
                    message: format!(
                        "{}() requires at least 2 arguments, got {}",
                        name,
                        args.len()
                    ),
                });
            }
            if name == "max" {
                Ok(args.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
            } else {
                Ok(args.iter().fold(f64::INFINITY, |a, &b| a.min(b)))
            }
        }
        _ => Err(ExpressionError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Rational(r) => write!(f, "{}", r),
            Self::Variable(name) => write!(f, "{}", name),
            Self::Unary(UnaryOp::Neg, expr) => {
                if expr.precedence() < 3 {
                    write!(f, "-({})", expr)
                } else {
                    write!(f, "-{}", expr)
                }
            }
            Self::Binary(op, left, right) => {
                let (symbol, prec) = match op {
                    BinaryOp::Add => (" + ", 1),
                    BinaryOp::Sub => (" - ", 1),
                    BinaryOp::Mul => ("*", 2),
                    BinaryOp::Div => ("/", 2),
                    BinaryOp::Pow => ("**", 4),
                };
                // Power is right-associative, the others are left-associative
                let left_parens = if *op == BinaryOp::Pow {
                    left.precedence() <= prec
                } else {
                    left.precedence() < prec
                };
                let right_parens = match op {
                    BinaryOp::Pow => right.precedence() < prec,
                    BinaryOp::Sub | BinaryOp::Div => right.precedence() <= prec,
                    _ => right.precedence() < prec,
                };
                if left_parens {
                    write!(f, "({})", left)?;
                } else {
                    write!(f, "{}", left)?;
                }
                f.write_str(symbol)?;
                if right_parens {
                    write!(f, "({})", right)
                } else {
                    write!(f, "{}", right)
                }
            }
            Self::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl ops::Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Self) -> Self::Output {
        Expression::Binary(BinaryOp::Add, Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Self) -> Self::Output {
        Expression::Binary(BinaryOp::Sub, Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Self) -> Self::Output {
        Expression::Binary(BinaryOp::Mul, Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Self) -> Self::Output {
        Expression::Binary(BinaryOp::Div, Box::new(self), Box::new(rhs))
    }
}

impl ops::Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output {
        Expression::Unary(UnaryOp::Neg, Box::new(self))
    }
}

// Parser functions using nom

type PResult<'a, T> = IResult<&'a str, T>;

/// Surround a parser with optional whitespace
fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = NomError<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = NomError<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier (variable or function name)
fn identifier(input: &str) -> PResult<'_, String> {
    let (input, matched) = ws(recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    )))
    .parse(input)?;
    Ok((input, matched.to_string()))
}

/// Parse an unsigned decimal number with optional fraction and exponent
fn number(input: &str) -> PResult<'_, Expression> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    let (rest, text) = ws(recognize(pair(mantissa, exponent))).parse(input)?;

    let text = text.trim();
    if let Some(exact) = Rational::from_decimal(text) {
        return Ok((rest, Expression::Rational(exact)));
    }
    // Exponents too large to expand exactly
    match text.parse::<f64>() {
        Ok(n) => Ok((rest, Expression::Number(n))),
        Err(_) => Err(nom::Err::Error(NomError::new(input, ErrorKind::Float))),
    }
}

/// Parse a function call
fn function_call(input: &str) -> PResult<'_, Expression> {
    let (input, name) = identifier(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expr_parser),
        ws(char(')')),
    )
    .parse(input)?;

    Ok((input, Expression::Function(name, args)))
}

/// Parse a variable reference; `pi` is read as the constant
fn variable(input: &str) -> PResult<'_, Expression> {
    let (input, var_name) = identifier(input)?;
    if var_name == "pi" {
        return Ok((input, Expression::Number(std::f64::consts::PI)));
    }
    Ok((input, Expression::Variable(var_name)))
}

/// Parse a parenthesized expression
fn parens(input: &str) -> PResult<'_, Expression> {
    delimited(ws(char('(')), expr_parser, ws(char(')'))).parse(input)
}

/// Parse a primary expression (number, function call, variable, or parenthesized expression)
fn primary(input: &str) -> PResult<'_, Expression> {
    alt((number, function_call, variable, parens)).parse(input)
}

/// Parse a power expression; the exponent may itself carry a sign
fn power(input: &str) -> PResult<'_, Expression> {
    let (input, base) = primary(input)?;

    match ws(alt((tag("**"), tag("^")))).parse(input) {
        Ok((after_op, _)) => {
            let (remaining, exponent) = unary(after_op)?;
            Ok((remaining, base.pow(exponent)))
        }
        Err(nom::Err::Error(_)) => Ok((input, base)),
        Err(e) => Err(e),
    }
}

/// Parse a unary expression (-expr, +expr)
fn unary(input: &str) -> PResult<'_, Expression> {
    match ws(one_of("+-")).parse(input) {
        Ok((remaining, '-')) => {
            let (remaining, expr) = unary(remaining)?;
            Ok((remaining, -expr))
        }
        Ok((remaining, _)) => unary(remaining),
        Err(nom::Err::Error(_)) => power(input),
        Err(e) => Err(e),
    }
}

/// Parse a multiplicative operator, leaving `**` to the power level
fn mul_op(input: &str) -> PResult<'_, BinaryOp> {
    ws(alt((
        value(BinaryOp::Mul, terminated(char('*'), not(char('*')))),
        value(BinaryOp::Div, char('/')),
    )))
    .parse(input)
}

/// Parse an additive operator
fn add_op(input: &str) -> PResult<'_, BinaryOp> {
    ws(alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    )))
    .parse(input)
}

/// Parse a left-associative chain `operand (op operand)*`
fn left_assoc<'a>(
    input: &'a str,
    operand: fn(&'a str) -> PResult<'a, Expression>,
    operator: fn(&'a str) -> PResult<'a, BinaryOp>,
) -> PResult<'a, Expression> {
    let (mut input, mut acc) = operand(input)?;
    loop {
        match operator(input) {
            Ok((after_op, op)) => {
                let (remaining, rhs) = operand(after_op)?;
                acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
                input = remaining;
            }
            Err(nom::Err::Error(_)) => return Ok((input, acc)),
            Err(e) => return Err(e),
        }
    }
}

/// Parse a multiplicative expression (expr * expr, expr / expr)
fn term(input: &str) -> PResult<'_, Expression> {
    left_assoc(input, unary, mul_op)
}

/// Parse an additive expression (expr + expr, expr - expr)
fn expr_parser(input: &str) -> PResult<'_, Expression> {
    left_assoc(input, term, add_op)
}
