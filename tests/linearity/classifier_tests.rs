//! Tests for the linearity classifier

use crate::test_helpers::init_logging;
use specfit_rs::parameters::{Expression, ExpressionError};
use specfit_rs::symbolic::{NormalFormEngine, SymbolicEngine};
use specfit_rs::{
    check_parameter_linearity, is_linear, AbsentParameterPolicy, LinearityClassifier,
    LinearityConfig, SpecFitError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const PEAK: &str = "height * exp(-(x - centre)**2 * 4 * log(2) / fwhm**2)";

#[test]
fn test_parameter_linearity() {
    init_logging();

    let expr = "a*x**2 + b*x + c";
    assert!(check_parameter_linearity(expr, "a").unwrap());
    assert!(check_parameter_linearity(expr, "b").unwrap());
    assert!(check_parameter_linearity(expr, "c").unwrap());

    let expr = "a*sin(b*x)";
    assert!(check_parameter_linearity(expr, "a").unwrap());
    assert!(!check_parameter_linearity(expr, "b").unwrap());

    let expr = "a*exp(-b*x)";
    assert!(check_parameter_linearity(expr, "a").unwrap());
    assert!(!check_parameter_linearity(expr, "b").unwrap());

    let expr = "a * x + b";
    assert!(check_parameter_linearity(expr, "a").unwrap());
    assert!(check_parameter_linearity(expr, "b").unwrap());
}

#[test]
fn test_peak_expression() {
    assert!(check_parameter_linearity(PEAK, "height").unwrap());
    assert!(!check_parameter_linearity(PEAK, "centre").unwrap());
    assert!(!check_parameter_linearity(PEAK, "fwhm").unwrap());
}

#[test]
fn test_absent_parameter() {
    init_logging();
    assert!(check_parameter_linearity("a * x + b", "d").unwrap());

    let strict = LinearityClassifier::new(
        LinearityConfig::default().with_absent_policy(AbsentParameterPolicy::Error),
    );
    let expr = Expression::parse("a * x + b").unwrap();
    match strict.is_linear(&expr, "d", ["a", "b", "x"]) {
        Err(SpecFitError::UnknownSymbol { symbol, expression }) => {
            assert_eq!(symbol, "d");
            assert_eq!(expression, expr.to_string());
        }
        other => panic!("Expected UnknownSymbol, got {:?}", other),
    }
}

#[test]
fn test_parse_failure() {
    assert!(matches!(
        check_parameter_linearity("a * x +", "a"),
        Err(SpecFitError::Expression(ExpressionError::ParseError { .. }))
    ));
}

#[test]
fn test_classification_is_exact() {
    // Non-linearities that cancel symbolically
    for (expr, parameter) in [
        ("(a + x)**2 - a**2 - 2*a*x", "a"),
        ("a * exp(log(2) * x) + exp(x) * 0", "a"),
        ("a**3 / a**2 * sin(x)", "a"),
        ("(a*x + a) / (x + 1)", "a"),
        ("(0.1 + 0.2)*a**2*x - 0.3*a**2*x", "a"),
        ("a * x + 2**0.5 * 2**0.5 * a**2 - 2 * a**2", "a"),
    ] {
        assert!(
            check_parameter_linearity(expr, parameter).unwrap(),
            "{} should be linear in {}",
            expr,
            parameter
        );
    }

    // Non-linearities that a few sampled points could miss
    for (expr, parameter) in [
        ("a * x + 1e-12 * a**2", "a"),
        ("9007199254740993*a**2*x - 9007199254740992*a**2*x", "a"),
        ("pi * a**2 - 3.141592653589793 * a**2", "a"),
        ("x / (1 + a)", "a"),
        ("a * b * x + a**2 * (x - x + 1)", "a"),
        ("exp(a) * x", "a"),
        ("x ** a", "a"),
        ("abs(a) * x", "a"),
        ("sign(a) + x", "a"),
        ("max(a, 0) * x", "a"),
    ] {
        assert!(
            !check_parameter_linearity(expr, parameter).unwrap(),
            "{} should be non-linear in {}",
            expr,
            parameter
        );
    }
}

#[test]
fn test_huge_exponents_do_not_overflow() {
    let tower = "((((((a**1024)**1024)**1024)**1024)**1024)**1024)";
    let expr = vec![tower; 10].join(" * ");
    assert!(!check_parameter_linearity(&expr, "a").unwrap());
    assert!(check_parameter_linearity(&format!("{} * x + b", expr), "b").unwrap());
}

#[test]
fn test_nested_powers_of_sums_classify_quickly() {
    let start = Instant::now();
    assert!(!check_parameter_linearity("((a+b+c+d+e+f)**8)**4 * x", "a").unwrap());
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_other_symbols_are_opaque_and_unordered() {
    let expr = Expression::parse(PEAK).unwrap();
    let forward = ["x", "centre", "fwhm"];
    let backward = ["fwhm", "centre", "x"];
    assert!(is_linear(&expr, "height", forward).unwrap());
    assert!(is_linear(&expr, "height", backward).unwrap());

    // Undeclared symbols are held opaque as well
    assert!(is_linear(&expr, "height", Vec::<String>::new()).unwrap());

    assert!(matches!(
        is_linear(&expr, "height", ["height", "x"]),
        Err(SpecFitError::InvalidInput(_))
    ));
}

#[test]
fn test_classification_is_idempotent() {
    let classifier = LinearityClassifier::new(LinearityConfig::default());
    let expr = Expression::parse(PEAK).unwrap();
    let first = classifier.classify_all(&expr).unwrap();
    let second = classifier.classify_all(&expr).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["centre", "fwhm", "height"]);
}

#[test]
fn test_custom_independent_variable() {
    let classifier =
        LinearityClassifier::new(LinearityConfig::default().with_independent_variable("E"));
    let expr = Expression::parse("A * E**-r + x").unwrap();
    let flags = classifier.classify_all(&expr).unwrap();
    assert_eq!(flags.len(), 3);
    assert!(flags["A"]);
    assert!(!flags["r"]);
    assert!(flags["x"]);
    assert!(matches!(
        classifier.classify(&expr, "E"),
        Err(SpecFitError::InvalidInput(_))
    ));
}

/// Engine that counts differentiations and delegates to the default engine
#[derive(Default)]
struct CountingEngine {
    differentiations: AtomicUsize,
}

impl SymbolicEngine for CountingEngine {
    fn simplify(&self, expr: &Expression) -> Expression {
        NormalFormEngine.simplify(expr)
    }

    fn differentiate(&self, expr: &Expression, symbol: &str) -> Result<Expression, ExpressionError> {
        self.differentiations.fetch_add(1, Ordering::Relaxed);
        NormalFormEngine.differentiate(expr, symbol)
    }

    fn is_zero(&self, expr: &Expression) -> bool {
        NormalFormEngine.is_zero(expr)
    }
}

#[test]
fn test_pluggable_engine() {
    let classifier =
        LinearityClassifier::with_engine(CountingEngine::default(), LinearityConfig::default());
    let expr = Expression::parse("a * x + b").unwrap();

    assert!(classifier.classify(&expr, "a").unwrap());
    // Absent parameters short-circuit
    assert!(classifier.classify(&expr, "c").unwrap());
    assert_eq!(
        classifier_engine_calls(&classifier),
        2,
        "one parameter, two derivatives"
    );
}

fn classifier_engine_calls(classifier: &LinearityClassifier<CountingEngine>) -> usize {
    classifier.engine().differentiations.load(Ordering::Relaxed)
}
