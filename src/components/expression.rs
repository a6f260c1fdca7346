//! Components defined by a user formula.

use crate::component::{evaluate_on_axis, Component, ComponentCore, ComponentKind};
use crate::error::{Result, SpecFitError};
use crate::linearity::{LinearityClassifier, LinearityConfig};
use crate::parameters::{Expression, Parameter, Parameters};
use crate::symbolic::{NormalFormEngine, SymbolicEngine};
use log::debug;
use ndarray::Array1;
use std::collections::BTreeMap;

/// Value given to parameters that first appear in a formula
const DEFAULT_VALUE: f64 = 1.0;

/// A component whose model is an arbitrary expression.
///
/// Every symbol other than the independent variable becomes a parameter,
/// ordered by name. Parameters are classified as linear or non-linear when the
/// component is built and again whenever the expression changes.
///
/// ```rust
/// use specfit_rs::component::Component;
/// use specfit_rs::components::ExpressionComponent;
///
/// let peak = ExpressionComponent::new(
///     "peak",
///     "height * exp(-(x - centre)**2 * 4 * log(2) / fwhm**2)",
///     "x",
/// )
/// .unwrap();
///
/// assert!(peak.parameters().get("height").unwrap().linear());
/// assert!(!peak.parameters().get("centre").unwrap().linear());
/// assert!(!peak.parameters().get("fwhm").unwrap().linear());
/// ```
#[derive(Debug, Clone)]
pub struct ExpressionComponent {
    core: ComponentCore,
    source: String,
    expression: Expression,
    independent: String,
    /// Simplified first derivative per parameter; absent when the parameter
    /// sits inside a non-differentiable function
    derivatives: BTreeMap<String, Expression>,
}

impl ExpressionComponent {
    /// Parse `expression` and classify its parameters.
    ///
    /// # Errors
    ///
    /// Fails if the expression cannot be parsed or uses an unknown function.
    pub fn new(name: &str, expression: &str, independent: &str) -> Result<Self> {
        let mut component = Self {
            core: ComponentCore::new(name, Parameters::new()),
            source: String::new(),
            expression: Expression::Number(0.0),
            independent: independent.to_string(),
            derivatives: BTreeMap::new(),
        };
        component.set_expression(expression)?;
        Ok(component)
    }

    /// Set the value of a parameter, builder style.
    ///
    /// Bounds and the `free` flag are kept; a value outside the bounds is
    /// rejected.
    pub fn with_value(mut self, parameter: &str, value: f64) -> Result<Self> {
        let param = self
            .core
            .parameters
            .get_mut(parameter)
            .ok_or_else(|| {
                SpecFitError::ParameterNotFound(format!("{}.{}", self.core.name, parameter))
            })?;
        param.set_value(value)?;
        Ok(self)
    }

    /// The formula as written
    pub fn expression(&self) -> &str {
        &self.source
    }

    /// Replace the formula.
    ///
    /// Parameters whose names survive keep their value, bounds and `free`
    /// flag; new symbols become free parameters. Every parameter is
    /// classified again. On error the component is left unchanged.
    pub fn set_expression(&mut self, expression: &str) -> Result<()> {
        let parsed = Expression::parse(expression)?;
        let classifier = LinearityClassifier::new(
            LinearityConfig::default().with_independent_variable(&self.independent),
        );
        let linearity = classifier.classify_all(&parsed)?;

        let engine = NormalFormEngine;
        let mut derivatives = BTreeMap::new();
        for name in linearity.keys() {
            if let Ok(derivative) = engine.differentiate(&parsed, name) {
                derivatives.insert(name.clone(), engine.simplify(&derivative));
            }
        }

        let mut parameters = Parameters::new();
        for (name, linear) in &linearity {
            let mut param = self
                .core
                .parameters
                .get(name)
                .cloned()
                .unwrap_or_else(|| Parameter::new(name, DEFAULT_VALUE));
            param.set_linear(*linear);
            parameters.insert(param);
        }
        debug!(
            "component '{}' parameters {:?} from '{}'",
            self.core.name,
            linearity,
            expression
        );

        self.core.parameters = parameters;
        self.source = expression.to_string();
        self.expression = parsed;
        self.derivatives = derivatives;
        Ok(())
    }
}

impl Component for ExpressionComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Expression {
            expression: self.source.clone(),
            independent: self.independent.clone(),
        }
    }

    fn analytic_form(&self) -> String {
        self.source.clone()
    }

    fn independent_variable(&self) -> &str {
        &self.independent
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        evaluate_on_axis(&self.expression, &self.core.parameters, &self.independent, x)
    }

    fn gradient(&self, parameter: &str, x: &Array1<f64>) -> Result<Array1<f64>> {
        match self.derivatives.get(parameter) {
            Some(derivative) => {
                evaluate_on_axis(derivative, &self.core.parameters, &self.independent, x)
            }
            None if self.core.parameters.contains(parameter) => {
                // Surfaces the non-differentiable function
                let derivative = NormalFormEngine.differentiate(&self.expression, parameter)?;
                evaluate_on_axis(&derivative, &self.core.parameters, &self.independent, x)
            }
            None => Err(SpecFitError::ParameterNotFound(format!(
                "{}.{}",
                self.core.name, parameter
            ))),
        }
    }
}
