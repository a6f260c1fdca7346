//! Canonical normal form for expressions.
//!
//! An expression is rewritten as a sum of monomials with exact rational
//! coefficients. Each monomial is a product of opaque atoms (symbols, function
//! applications, grouped sums and non-integer powers) raised to integer
//! exponents. Like terms are combined and rational sub-expressions folded, so
//! two expressions that differ only by reordering, expansion or cancellation
//! produce the same normal form. An expression is identically zero when its
//! normal form has no terms.
//!
//! Constants that have no exact rational value (`pi`, `log(2)`, `2**0.5`) stay
//! opaque atoms. Expansion is capped: a product or power that would produce
//! more than `TERM_LIMIT` terms keeps its sums grouped instead.

use crate::parameters::expression::{BinaryOp, Expression, UnaryOp};
use crate::parameters::Rational;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;

/// Largest integer power of a sum that is expanded term by term
const EXPANSION_LIMIT: i64 = 8;

/// Largest number of term products a single expansion may perform
const TERM_LIMIT: u128 = 512;

/// Integer exponents above this are kept symbolic
const MAX_INTEGER_EXPONENT: i64 = 1024;

/// Largest root extracted when folding a rational power of a constant
const MAX_EXACT_ROOT: u32 = 64;

/// Coefficients that would grow past this many bits stay as grouped powers
const MAX_COEFFICIENT_BITS: u64 = 1 << 16;

/// Opaque factor of a monomial
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Atom {
    Symbol(String),
    /// Floating-point constant without an exact rational value, by bit pattern
    Float(u64),
    /// Function applied to arguments in normal form
    Function(String, Vec<Polynomial>),
    /// Sum kept unexpanded; its leading coefficient is positive
    Group(Polynomial),
    /// `base ** exponent` with a non-integer, symbolic or oversized exponent
    Power(Polynomial, Polynomial),
}

impl Atom {
    fn to_expression(&self) -> Expression {
        match self {
            Atom::Symbol(name) => Expression::var(name),
            Atom::Float(bits) => Expression::Number(f64::from_bits(*bits)),
            Atom::Function(name, args) => Expression::Function(
                name.clone(),
                args.iter().map(Polynomial::to_expression).collect(),
            ),
            Atom::Group(inner) => inner.to_expression(),
            Atom::Power(base, exponent) => base.to_expression().pow(exponent.to_expression()),
        }
    }

    /// `self ** exponent` collapses to an integer power of a polynomial
    fn integral_power(&self, exponent: i64) -> Option<i64> {
        if let Atom::Power(_, power) = self {
            let total = power.as_rational()? * BigRational::from_integer(BigInt::from(exponent));
            if total.is_integer() {
                return total
                    .to_integer()
                    .to_i64()
                    .filter(|n| n.abs() <= MAX_INTEGER_EXPONENT);
            }
        }
        None
    }
}

/// Product of atoms raised to non-zero integer exponents
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Monomial(BTreeMap<Atom, i64>);

impl Monomial {
    fn one() -> Self {
        Self::default()
    }

    fn single(atom: Atom, exponent: i64) -> Self {
        let mut factors = BTreeMap::new();
        if exponent != 0 {
            factors.insert(atom, exponent);
        }
        Self(factors)
    }

    fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    fn mul(&self, other: &Monomial) -> Monomial {
        let mut factors = self.0.clone();
        for (atom, &exponent) in &other.0 {
            multiply_factor(&mut factors, atom.clone(), exponent);
        }
        Monomial(factors)
    }

    fn pow(&self, n: i64) -> Option<Monomial> {
        let mut factors = BTreeMap::new();
        for (atom, exponent) in &self.0 {
            factors.insert(atom.clone(), exponent.checked_mul(n)?);
        }
        Some(Monomial(factors))
    }

    fn has_integral_powers(&self) -> bool {
        self.0
            .iter()
            .any(|(atom, &exponent)| atom.integral_power(exponent).is_some())
    }
}

/// Multiply `atom ** exponent` into `factors`.
///
/// An exponent sum that leaves `i64` turns the factor into an explicit
/// [`Atom::Power`] with the exact exponent.
fn multiply_factor(factors: &mut BTreeMap<Atom, i64>, atom: Atom, exponent: i64) {
    let current = factors.get(&atom).copied().unwrap_or(0);
    match current.checked_add(exponent) {
        Some(0) => {
            factors.remove(&atom);
        }
        Some(total) => {
            factors.insert(atom, total);
        }
        None => {
            factors.remove(&atom);
            let total = BigInt::from(current) + BigInt::from(exponent);
            let power = Atom::Power(
                Polynomial::atom(atom),
                Polynomial::constant(BigRational::from_integer(total)),
            );
            multiply_factor(factors, power, 1);
        }
    }
}

/// Sum of monomials with non-zero coefficients
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Polynomial {
    /// The zero polynomial
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant polynomial
    pub fn constant(value: BigRational) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::one(), value);
        poly
    }

    /// An integer constant
    pub fn integer(value: i64) -> Self {
        Self::constant(BigRational::from_integer(BigInt::from(value)))
    }

    fn atom(atom: Atom) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::single(atom, 1), BigRational::one());
        poly
    }

    /// Integral floats are exact; anything else stays opaque
    fn float(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 {
            if let Some(exact) = BigRational::from_float(value) {
                return Self::constant(exact);
            }
        }
        Self::atom(Atom::Float(value.to_bits()))
    }

    /// Convert an expression into normal form
    pub fn from_expression(expr: &Expression) -> Self {
        match expr {
            Expression::Number(n) => Self::float(*n),
            Expression::Rational(r) => Self::constant(r.exact().clone()),
            Expression::Variable(name) => Self::atom(Atom::Symbol(name.clone())),
            Expression::Unary(UnaryOp::Neg, inner) => Self::from_expression(inner).negate(),
            Expression::Binary(op, left, right) => {
                let lhs = Self::from_expression(left);
                let rhs = Self::from_expression(right);
                match op {
                    BinaryOp::Add => lhs.add(&rhs),
                    BinaryOp::Sub => lhs.add(&rhs.negate()),
                    BinaryOp::Mul => lhs.mul(&rhs),
                    BinaryOp::Div => lhs.divide(&rhs),
                    BinaryOp::Pow => Self::power(lhs, rhs),
                }
            }
            Expression::Function(name, args) => {
                Self::function(name, args.iter().map(Self::from_expression).collect())
            }
        }
    }

    /// Convert back into an expression tree with a deterministic term order
    pub fn to_expression(&self) -> Expression {
        let mut result: Option<Expression> = None;
        for (monomial, coefficient) in &self.terms {
            let negative = coefficient.is_negative();
            let term = term_expression(monomial, &coefficient.abs());
            result = Some(match result {
                None if negative => -term,
                None => term,
                Some(acc) if negative => acc - term,
                Some(acc) => acc + term,
            });
        }
        result.unwrap_or_else(|| Expression::integer(0))
    }

    /// True when no terms survive
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns the exact value if the polynomial is a constant
    pub fn as_rational(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(monomial, _)| monomial.is_one())
                .map(|(_, c)| c.clone()),
            _ => None,
        }
    }

    /// Returns the nearest `f64` if the polynomial is a constant
    pub fn as_constant(&self) -> Option<f64> {
        self.as_rational().and_then(|c| c.to_f64())
    }

    fn single_term(&self) -> Option<(&Monomial, &BigRational)> {
        if self.terms.len() == 1 {
            self.terms.iter().next()
        } else {
            None
        }
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: BigRational) {
        if coefficient.is_zero() {
            return;
        }
        let sum = match self.terms.get(&monomial) {
            Some(existing) => existing + coefficient,
            None => coefficient,
        };
        if sum.is_zero() {
            self.terms.remove(&monomial);
        } else {
            self.terms.insert(monomial, sum);
        }
    }

    fn add_assign(&mut self, other: &Polynomial) {
        for (monomial, coefficient) in &other.terms {
            self.add_term(monomial.clone(), coefficient.clone());
        }
    }

    /// Add a product term, collapsing powers such as `sqrt(a)**2` back to `a`
    fn push_product(&mut self, monomial: Monomial, coefficient: BigRational) {
        if coefficient.is_zero() {
            return;
        }
        if !monomial.has_integral_powers() {
            self.add_term(monomial, coefficient);
            return;
        }

        let mut expanded = Self::constant(coefficient);
        let mut rest = Monomial::one();
        for (atom, exponent) in monomial.0 {
            let collapsed = match (&atom, atom.integral_power(exponent)) {
                (Atom::Power(base, _), Some(total)) => Some(base.pow_int(total)),
                _ => None,
            };
            match collapsed {
                Some(poly) => expanded = expanded.mul(&poly),
                None => {
                    rest.0.insert(atom, exponent);
                }
            }
        }
        let mut tail = Self::zero();
        tail.add_term(rest, BigRational::one());
        self.add_assign(&expanded.mul(&tail));
    }

    /// Sum of two polynomials
    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut result = self.clone();
        result.add_assign(other);
        result
    }

    /// Multiply every coefficient by `factor`
    pub fn scale(&self, factor: &BigRational) -> Polynomial {
        let mut result = Self::zero();
        for (monomial, coefficient) in &self.terms {
            result.add_term(monomial.clone(), coefficient * factor);
        }
        result
    }

    fn negate(&self) -> Polynomial {
        self.scale(&-BigRational::one())
    }

    /// Product of two polynomials.
    ///
    /// Sums are distributed unless that takes more than `TERM_LIMIT` term
    /// products, in which case both sides are grouped first.
    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        let products = self.len() as u128 * other.len() as u128;
        if self.len() > 1 && other.len() > 1 && products > TERM_LIMIT {
            return self.grouped().distribute(&other.grouped());
        }
        self.distribute(other)
    }

    fn distribute(&self, other: &Polynomial) -> Polynomial {
        let mut result = Self::zero();
        for (lm, lc) in &self.terms {
            for (rm, rc) in &other.terms {
                result.push_product(lm.mul(rm), lc * rc);
            }
        }
        result
    }

    /// Sum folded into a single grouped term
    fn grouped(&self) -> Polynomial {
        if self.len() <= 1 {
            return self.clone();
        }
        let (sign, group) = self.sign_normalized();
        let mut result = Self::zero();
        result.add_term(Monomial::single(Atom::Group(group), 1), sign);
        result
    }

    /// `self / other`, cancelling exact scalar multiples
    pub fn divide(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() {
            return Self::zero();
        }
        if let Some(ratio) = self.scalar_ratio(other) {
            return Self::constant(ratio);
        }
        self.mul(&other.pow_int(-1))
    }

    /// `Some(r)` when `self == r * other` term by term
    fn scalar_ratio(&self, other: &Polynomial) -> Option<BigRational> {
        if other.is_zero() || self.terms.len() != other.terms.len() {
            return None;
        }
        let mut ratio: Option<BigRational> = None;
        for ((lm, lc), (rm, rc)) in self.terms.iter().zip(other.terms.iter()) {
            if lm != rm {
                return None;
            }
            let r = lc / rc;
            match &ratio {
                None => ratio = Some(r),
                Some(existing) if *existing == r => {}
                Some(_) => return None,
            }
        }
        ratio
    }

    /// Integer power; small powers of sums are expanded, others grouped
    pub fn pow_int(&self, n: i64) -> Polynomial {
        match n {
            0 => return Self::integer(1),
            1 => return self.clone(),
            _ => {}
        }

        if let Some((monomial, coefficient)) = self.single_term() {
            if let (Some(powered), Some(factor)) = (monomial.pow(n), rational_pow(coefficient, n)) {
                let mut result = Self::zero();
                result.push_product(powered, factor);
                return result;
            }
        }

        if self.is_zero() && n > 0 {
            return Self::zero();
        }

        if self.len() > 1
            && (2..=EXPANSION_LIMIT).contains(&n)
            && expansion_terms(self.len(), n) <= TERM_LIMIT
        {
            let mut result = self.clone();
            for _ in 1..n {
                result = result.distribute(self);
            }
            return result;
        }

        let (sign, group) = self.sign_normalized();
        let sign = if n % 2 == 0 { BigRational::one() } else { sign };
        let mut result = Self::zero();
        result.add_term(Monomial::single(Atom::Group(group), n), sign);
        result
    }

    /// Split off the sign of the leading coefficient
    fn sign_normalized(&self) -> (BigRational, Polynomial) {
        match self.terms.values().next() {
            Some(lead) if lead.is_negative() => (-BigRational::one(), self.negate()),
            _ => (BigRational::one(), self.clone()),
        }
    }

    fn power(base: Polynomial, exponent: Polynomial) -> Polynomial {
        if let Some(e) = exponent.as_rational() {
            if e.is_integer() {
                if let Some(n) = e
                    .to_integer()
                    .to_i64()
                    .filter(|n| n.abs() <= MAX_INTEGER_EXPONENT)
                {
                    return base.pow_int(n);
                }
            } else if let Some(folded) = base
                .as_rational()
                .and_then(|c| exact_rational_power(&c, &e))
            {
                return Self::constant(folded);
            }
        }
        Self::atom(Atom::Power(base, exponent))
    }

    fn function(name: &str, args: Vec<Polynomial>) -> Polynomial {
        let name = match name {
            "ln" => "log",
            "atan" => "arctan",
            other => other,
        };

        if name == "sqrt" && args.len() == 1 {
            if let Some(arg) = args.into_iter().next() {
                let half = BigRational::new(BigInt::one(), BigInt::from(2));
                return Self::power(arg, Self::constant(half));
            }
            return Self::zero();
        }

        let constants: Option<Vec<BigRational>> = args.iter().map(Polynomial::as_rational).collect();
        if let Some(value) = constants.and_then(|values| exact_function(name, &values)) {
            return Self::constant(value);
        }

        Self::atom(Atom::Function(name.to_string(), args))
    }
}

/// `base ** n`, or `None` when it is undefined or the result would be too large
fn rational_pow(base: &BigRational, n: i64) -> Option<BigRational> {
    let k = u32::try_from(n.unsigned_abs()).ok()?;
    let bits = base.numer().bits().max(base.denom().bits());
    if bits.saturating_mul(u64::from(k)) > MAX_COEFFICIENT_BITS {
        return None;
    }
    let numer = base.numer().pow(k);
    let denom = base.denom().pow(k);
    if n >= 0 {
        Some(BigRational::new(numer, denom))
    } else if numer.is_zero() {
        None
    } else {
        Some(BigRational::new(denom, numer))
    }
}

/// `base ** exponent` for a non-integer exponent, when the root is exact
fn exact_rational_power(base: &BigRational, exponent: &BigRational) -> Option<BigRational> {
    if base.is_negative() {
        return None;
    }
    if base.is_zero() {
        return exponent.is_positive().then(BigRational::zero);
    }
    let root = exponent.denom().to_u32().filter(|q| *q <= MAX_EXACT_ROOT)?;
    let power = exponent
        .numer()
        .to_i64()
        .filter(|p| p.abs() <= MAX_INTEGER_EXPONENT)?;

    let numer = base.numer().nth_root(root);
    let denom = base.denom().nth_root(root);
    if numer.pow(root) != *base.numer() || denom.pow(root) != *base.denom() {
        return None;
    }
    rational_pow(&BigRational::new(numer, denom), power)
}

/// Values of functions of rational arguments that are themselves rational
fn exact_function(name: &str, values: &[BigRational]) -> Option<BigRational> {
    match (name, values) {
        ("abs", [v]) => Some(v.abs()),
        ("sign", [v]) => Some(v.signum()),
        ("max", _) if values.len() >= 2 => values.iter().max().cloned(),
        ("min", _) if values.len() >= 2 => values.iter().min().cloned(),
        ("exp" | "cos" | "cosh", [v]) if v.is_zero() => Some(BigRational::one()),
        ("sin" | "tan" | "sinh" | "tanh" | "arctan", [v]) if v.is_zero() => {
            Some(BigRational::zero())
        }
        ("log" | "log10", [v]) if v.is_one() => Some(BigRational::zero()),
        _ => None,
    }
}

/// Number of distinct monomials in `(t1 + ... + t_len) ** n`, saturating past the limit
fn expansion_terms(len: usize, n: i64) -> u128 {
    let len = len as u128;
    let mut count: u128 = 1;
    for i in 1..=n.max(0) as u128 {
        count = count * (len + i - 1) / i;
        if count > TERM_LIMIT {
            break;
        }
    }
    count
}

fn exact_integer(value: u64) -> Expression {
    Expression::Rational(Rational::new(BigRational::from_integer(BigInt::from(value))))
}

fn term_expression(monomial: &Monomial, magnitude: &BigRational) -> Expression {
    let mut numerator = if !magnitude.is_one() || monomial.is_one() {
        Some(Expression::Rational(Rational::new(magnitude.clone())))
    } else {
        None
    };
    let mut denominator: Option<Expression> = None;

    for (atom, &exponent) in &monomial.0 {
        let factor = atom.to_expression();
        let factor = if exponent.unsigned_abs() == 1 {
            factor
        } else {
            factor.pow(exact_integer(exponent.unsigned_abs()))
        };
        let slot = if exponent > 0 {
            &mut numerator
        } else {
            &mut denominator
        };
        *slot = Some(match slot.take() {
            Some(acc) => acc * factor,
            None => factor,
        });
    }

    let numerator = numerator.unwrap_or_else(|| Expression::integer(1));
    match denominator {
        Some(den) => numerator / den,
        None => numerator,
    }
}
