//! Tests for the Expression parsing and evaluation

use specfit_rs::parameters::expression::{
    BinaryOp, EvaluationContext, Expression, ExpressionError, SimpleContext,
};
use std::collections::HashMap;

#[test]
fn test_expression_parsing() {
    let expr = Expression::parse("42").unwrap();
    assert!(expr.variables().is_empty());

    let expr = Expression::parse("x + y").unwrap();
    assert_eq!(expr.variables(), vec!["x", "y"]);

    let expr = Expression::parse("max(a, b, c)").unwrap();
    assert_eq!(expr.variables().len(), 3);

    let expr = Expression::parse("  (  x  +  y  )  *  z  ").unwrap();
    assert_eq!(expr.variables().len(), 3);

    // Scientific notation
    let expr = Expression::parse("1.5e-3 * x").unwrap();
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);
    assert_eq!(expr.evaluate(&context).unwrap(), 3e-3);

    for invalid in ["", "x +", "x + (y", "@#$%", "2 ** ", "sin(x"] {
        assert!(
            matches!(
                Expression::parse(invalid),
                Err(ExpressionError::ParseError { .. })
            ),
            "'{}' should not parse",
            invalid
        );
    }
}

#[test]
fn test_pi_is_a_constant() {
    let expr = Expression::parse("A / pi").unwrap();
    assert_eq!(expr.variables(), vec!["A"]);

    let mut context = SimpleContext::new();
    context.set_variable("A", std::f64::consts::PI);
    assert_eq!(expr.evaluate(&context).unwrap(), 1.0);
}

#[test]
fn test_operator_precedence_and_associativity() {
    let mut context = SimpleContext::new();
    context.set_variable("a", 2.0);
    context.set_variable("b", 3.0);
    context.set_variable("c", 4.0);

    let cases = [
        ("a - b - c", -5.0),
        ("c / a / a", 1.0),
        ("a ** b ** a", 512.0),
        ("a ^ b ^ a", 512.0),
        ("-a ** 2", -4.0),
        ("a ** -1", 0.5),
        ("a + b * c", 14.0),
        ("(a + b) * c", 20.0),
        ("a * b ** 2", 18.0),
    ];
    for (input, expected) in cases {
        let expr = Expression::parse(input).unwrap();
        assert_eq!(expr.evaluate(&context).unwrap(), expected, "{}", input);
    }

    // Power binds to the right and above unary minus
    match Expression::parse("a ** b ** c").unwrap() {
        Expression::Binary(BinaryOp::Pow, _, right) => {
            assert!(matches!(*right, Expression::Binary(BinaryOp::Pow, _, _)))
        }
        other => panic!("Expected a power, got {:?}", other),
    }
}

#[test]
fn test_expression_evaluation_functions() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);
    context.set_variable("y", 3.0);
    context.set_variable("z", 4.0);

    let cases: [(&str, f64); 12] = [
        ("sin(x)", 2.0_f64.sin()),
        ("cos(y)", 3.0_f64.cos()),
        ("exp(x)", 2.0_f64.exp()),
        ("log(y)", 3.0_f64.ln()),
        ("ln(y)", 3.0_f64.ln()),
        ("log10(z)", 4.0_f64.log10()),
        ("sqrt(z)", 2.0),
        ("abs(-x)", 2.0),
        ("sign(-x)", -1.0),
        ("atan(x) - arctan(x)", 0.0),
        ("max(x, y, z)", 4.0),
        ("min(x, y, z)", 2.0),
    ];
    for (input, expected) in cases {
        let value = Expression::parse(input).unwrap().evaluate(&context).unwrap();
        assert!((value - expected).abs() < 1e-10, "{} = {}", input, value);
    }

    let expr = Expression::parse("sinh(x)**2 - cosh(x)**2 + tanh(0)").unwrap();
    assert!((expr.evaluate(&context).unwrap() + 1.0).abs() < 1e-10);
}

#[test]
fn test_expression_evaluation_errors() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);

    match Expression::parse("y").unwrap().evaluate(&context) {
        Err(ExpressionError::UndefinedVariable { name }) => assert_eq!(name, "y"),
        other => panic!("Expected UndefinedVariable error, got {:?}", other),
    }

    assert_eq!(
        Expression::parse("x / 0").unwrap().evaluate(&context),
        Err(ExpressionError::DivisionByZero)
    );

    match Expression::parse("unknown_func(x)").unwrap().evaluate(&context) {
        Err(ExpressionError::UndefinedFunction { name }) => assert_eq!(name, "unknown_func"),
        other => panic!("Expected UndefinedFunction error, got {:?}", other),
    }

    for input in ["sin(x, x)", "max(x)"] {
        assert!(matches!(
            Expression::parse(input).unwrap().evaluate(&context),
            Err(ExpressionError::InvalidOperation { .. })
        ));
    }
}

#[test]
fn test_display_reparses_to_same_value() {
    let mut context = SimpleContext::new();
    context.set_variable("a", 1.5);
    context.set_variable("b", -0.5);
    context.set_variable("x", 2.0);

    for input in [
        "a - (b - x)",
        "a / (b * x)",
        "-(a + b) ** 2",
        "(-a) ** 2",
        "a ** (b ** x)",
        "exp(-(x - a)**2 / (2 * b**2))",
    ] {
        let expr = Expression::parse(input).unwrap();
        let reparsed = Expression::parse(&expr.to_string()).unwrap();
        assert_eq!(
            expr.evaluate(&context).unwrap(),
            reparsed.evaluate(&context).unwrap(),
            "{} displayed as {}",
            input,
            expr
        );
    }
}

#[test]
fn test_expression_context_implementations() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);
    assert!(context.has_variable("x"));
    assert!(!context.has_variable("z"));
    assert_eq!(context.get_variable("x").unwrap(), 2.0);
    assert!(context.get_variable("z").is_err());

    let mut hash_map = HashMap::new();
    hash_map.insert("a".to_string(), 4.0);
    assert!(hash_map.has_variable("a"));
    assert!(!hash_map.has_variable("c"));
    assert_eq!(hash_map.get_variable("a").unwrap(), 4.0);

    let expr = Expression::parse("a * 2").unwrap();
    assert_eq!(expr.evaluate(&hash_map).unwrap(), 8.0);
}
