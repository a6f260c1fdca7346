//! Component trait and shared component plumbing.
//!
//! A component is one additive term of a [`Model`](crate::model::Model): a
//! Gaussian peak, a background offset, a user formula. It owns its
//! [`Parameters`] exclusively and knows, for each of them, whether its model
//! is linear in that parameter. Components are shared between a model and any
//! fitting session as [`SharedComponent`] handles.

use crate::components::{
    Exponential, ExpressionComponent, Gaussian, Lorentzian, Offset, Polynomial, PowerLaw,
};
use crate::error::{Result, SpecFitError};
use crate::parameters::expression::{EvaluationContext, Expression, ExpressionError};
use crate::parameters::{Parameter, ParameterError, Parameters};
use crate::symbolic::differentiate;
use ndarray::Array1;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A component handle that can be shared between models and fitting sessions
pub type SharedComponent = Arc<RwLock<dyn Component>>;

/// Wrap a component into a [`SharedComponent`] handle
pub fn shared<C: Component + 'static>(component: C) -> SharedComponent {
    Arc::new(RwLock::new(component))
}

/// State common to every component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCore {
    pub name: String,
    pub active: bool,
    pub parameters: Parameters,
}

impl ComponentCore {
    /// An active component with the given parameters
    pub fn new(name: &str, parameters: Parameters) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            parameters,
        }
    }

    /// Value of a named parameter
    pub fn value(&self, name: &str) -> Result<f64> {
        self.parameters
            .get(name)
            .map(Parameter::value)
            .ok_or_else(|| SpecFitError::ParameterNotFound(format!("{}.{}", self.name, name)))
    }
}

/// One additive term of a model.
///
/// Implementors only provide access to their [`ComponentCore`] plus the
/// evaluation of their model; everything else has a default implementation.
pub trait Component: Send + Sync + fmt::Debug {
    fn core(&self) -> &ComponentCore;

    fn core_mut(&mut self) -> &mut ComponentCore;

    /// Description used to rebuild the component from JSON
    fn kind(&self) -> ComponentKind;

    /// The model written in the expression language, with `x` as the
    /// independent variable unless the component says otherwise
    fn analytic_form(&self) -> String;

    /// Evaluate the component at every point of `x` with the current
    /// parameter values
    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Name of the independent variable in [`Component::analytic_form`]
    fn independent_variable(&self) -> &str {
        "x"
    }

    /// Partial derivative of the component with respect to `parameter`,
    /// evaluated at every point of `x`
    fn gradient(&self, parameter: &str, x: &Array1<f64>) -> Result<Array1<f64>> {
        if !self.parameters().contains(parameter) {
            return Err(SpecFitError::ParameterNotFound(format!(
                "{}.{}",
                self.name(),
                parameter
            )));
        }
        let expr = Expression::parse(&self.analytic_form())?;
        let derivative = differentiate(&expr, parameter)?;
        evaluate_on_axis(&derivative, self.parameters(), self.independent_variable(), x)
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn set_name(&mut self, name: &str) {
        self.core_mut().name = name.to_string();
    }

    fn parameters(&self) -> &Parameters {
        &self.core().parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.core_mut().parameters
    }

    /// Whether the component takes part in evaluation and fitting
    fn active(&self) -> bool {
        self.core().active
    }

    fn set_active(&mut self, active: bool) {
        self.core_mut().active = active;
    }

    /// Set the `free` flag of the named parameters, or of all parameters
    /// when `names` is `None`. Unknown names leave every flag untouched.
    fn set_parameters_free_value(&mut self, free: bool, names: Option<&[&str]>) -> Result<()> {
        let parameters = self.parameters_mut();
        match names {
            None => {
                for param in parameters.iter_mut() {
                    param.set_free(free);
                }
            }
            Some(names) => {
                if let Some(missing) = names.iter().find(|name| !parameters.contains(name)) {
                    return Err(ParameterError::ParameterNotFound {
                        name: missing.to_string(),
                    }
                    .into());
                }
                for name in names {
                    parameters.require_mut(name)?.set_free(free);
                }
            }
        }
        Ok(())
    }

    /// Let a fit vary the named parameters (all when `None`)
    fn set_parameters_free(&mut self, names: Option<&[&str]>) -> Result<()> {
        self.set_parameters_free_value(true, names)
    }

    /// Hold the named parameters (all when `None`) at their current values
    fn set_parameters_not_free(&mut self, names: Option<&[&str]>) -> Result<()> {
        self.set_parameters_free_value(false, names)
    }

    /// True when every free parameter of this component is linear
    fn is_linear(&self) -> bool {
        self.parameters()
            .iter()
            .all(|param| !param.free() || param.linear())
    }

    /// Snapshot for JSON storage
    fn to_record(&self) -> ComponentRecord {
        ComponentRecord {
            name: self.name().to_string(),
            kind: self.kind(),
            active: self.active(),
            parameters: self.parameters().clone(),
        }
    }
}

/// Stored description of how to rebuild a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Expression {
        expression: String,
        independent: String,
    },
    Gaussian,
    Lorentzian,
    Offset,
    Polynomial {
        order: usize,
    },
    Exponential,
    PowerLaw,
}

impl ComponentKind {
    /// Build a fresh component of this kind with default parameter values.
    ///
    /// Linearity is classified as part of construction.
    pub fn build(&self, name: &str) -> Result<SharedComponent> {
        Ok(match self {
            Self::Expression {
                expression,
                independent,
            } => shared(ExpressionComponent::new(name, expression, independent)?),
            Self::Gaussian => shared(Gaussian::new(name)),
            Self::Lorentzian => shared(Lorentzian::new(name)),
            Self::Offset => shared(Offset::new(name)),
            Self::Polynomial { order } => shared(Polynomial::new(name, *order)),
            Self::Exponential => shared(Exponential::new(name)),
            Self::PowerLaw => shared(PowerLaw::new(name)),
        })
    }
}

/// JSON form of a component.
///
/// Parameters are stored without their linear flag; restoring rebuilds the
/// component from its kind, which classifies every parameter again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub kind: ComponentKind,
    pub active: bool,
    pub parameters: Parameters,
}

impl ComponentRecord {
    /// Rebuild the component and copy stored parameter state onto it
    pub fn restore(&self) -> Result<SharedComponent> {
        let component = self.kind.build(&self.name)?;
        {
            let mut guard = component.write();
            guard.set_active(self.active);
            let parameters = guard.parameters_mut();
            for stored in &self.parameters {
                let param = parameters.get_mut(stored.name()).ok_or_else(|| {
                    SpecFitError::ParameterNotFound(format!("{}.{}", self.name, stored.name()))
                })?;
                let linear = param.linear();
                *param = stored.clone();
                param.set_linear(linear);
            }
        }
        Ok(component)
    }
}

/// Evaluation context for one point of the independent axis
struct AxisContext<'a> {
    parameters: &'a Parameters,
    independent: &'a str,
    x: f64,
}

impl EvaluationContext for AxisContext<'_> {
    fn get_variable(&self, name: &str) -> std::result::Result<f64, ExpressionError> {
        if name == self.independent {
            Ok(self.x)
        } else {
            self.parameters.get_variable(name)
        }
    }

    fn has_variable(&self, name: &str) -> bool {
        name == self.independent || self.parameters.has_variable(name)
    }
}

/// Evaluate `expr` at every point of `x`, reading parameters by name
pub fn evaluate_on_axis(
    expr: &Expression,
    parameters: &Parameters,
    independent: &str,
    x: &Array1<f64>,
) -> Result<Array1<f64>> {
    let mut values = Vec::with_capacity(x.len());
    for &point in x.iter() {
        let context = AxisContext {
            parameters,
            independent,
            x: point,
        };
        values.push(expr.evaluate(&context)?);
    }
    Ok(Array1::from_vec(values))
}
