//! Parameters collection implementation
//!
//! [`Parameters`] is the ordered set of parameters owned by a single component.
//! Order is the order of insertion, which for expression components is the
//! sorted order of the expression's symbols.

use crate::parameters::expression::{EvaluationContext, ExpressionError};
use crate::parameters::parameter::{Parameter, ParameterError};
use serde::{Deserialize, Serialize};

/// An ordered collection of uniquely named parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    /// Create an empty collection
    ///
    /// # Examples
    ///
    /// ```
    /// use specfit_rs::parameters::Parameters;
    ///
    /// let params = Parameters::new();
    /// assert!(params.is_empty());
    /// ```
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter, rejecting duplicate names
    ///
    /// # Examples
    ///
    /// ```
    /// use specfit_rs::parameters::{Parameter, Parameters};
    ///
    /// let mut params = Parameters::new();
    /// params.add(Parameter::new("A", 10.0)).unwrap();
    /// assert!(params.add(Parameter::new("A", 1.0)).is_err());
    /// assert_eq!(params.len(), 1);
    /// ```
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if param.name().is_empty() {
            return Err(ParameterError::InvalidName {
                name: param.name().to_string(),
            });
        }
        if self.contains(param.name()) {
            return Err(ParameterError::DuplicateParameter {
                name: param.name().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    /// Add a free, unbounded parameter
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    /// Add a free parameter restricted to `[min, max]`
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    /// Insert a parameter, replacing and returning any parameter of the same
    /// name. A replaced parameter keeps its position.
    pub fn insert(&mut self, param: Parameter) -> Option<Parameter> {
        match self.params.iter_mut().find(|p| p.name() == param.name()) {
            Some(slot) => Some(std::mem::replace(slot, param)),
            None => {
                self.params.push(param);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    /// Like [`Parameters::get_mut`], failing with `ParameterNotFound`
    pub fn require_mut(&mut self, name: &str) -> Result<&mut Parameter, ParameterError> {
        self.get_mut(name)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name() == name)
    }

    /// Remove a parameter, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let index = self.params.iter().position(|p| p.name() == name)?;
        Some(self.params.remove(index))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in order
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    /// Current values in order
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(Parameter::value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.iter_mut()
    }

    /// Parameters a fit may vary
    pub fn free(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.free()).collect()
    }

    /// Parameters held at their current value
    pub fn fixed(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| !p.free()).collect()
    }

    /// Parameters the model depends on non-linearly
    pub fn nonlinear(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| !p.linear()).collect()
    }

    /// Reset every parameter to its initial value
    pub fn reset(&mut self) {
        for param in &mut self.params {
            param.reset();
        }
    }
}

impl EvaluationContext for Parameters {
    fn get_variable(&self, name: &str) -> Result<f64, ExpressionError> {
        self.get(name)
            .map(Parameter::value)
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
