//! Model: an ordered sum of components.
//!
//! A [`Model`] holds shared handles to its components and aggregates their
//! parameters. Its central query is [`Model::is_linear`]: a model is linear
//! when every parameter that a fit would actually vary (free, in an active
//! component) enters the model linearly. Fitting code uses
//! [`Model::fit_strategy`] to choose between a linear least-squares solve and
//! an iterative nonlinear optimizer.
//!
//! ```rust
//! use specfit_rs::component::Component;
//! use specfit_rs::components::{Gaussian, Offset};
//! use specfit_rs::model::{FitStrategy, Model};
//!
//! let mut model = Model::new();
//! let peak = model.push(Gaussian::new("peak")).unwrap();
//! model.push(Offset::new("background")).unwrap();
//! assert_eq!(model.fit_strategy(), FitStrategy::NonLinear);
//!
//! // With position and width frozen only amplitudes remain free
//! peak.write().set_parameters_not_free(Some(&["centre", "sigma"])).unwrap();
//! assert_eq!(model.fit_strategy(), FitStrategy::Linear);
//! ```

use crate::component::{shared, Component, ComponentRecord, SharedComponent};
use crate::error::{Result, SpecFitError};
use log::{debug, warn};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

/// Identifies a parameter within a model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId {
    pub component: String,
    pub parameter: String,
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.parameter)
    }
}

/// Which kind of solver a fit of the model needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrategy {
    /// All free parameters enter linearly: solve by linear least squares
    Linear,
    /// At least one free parameter enters non-linearly
    NonLinear,
}

#[derive(Serialize, Deserialize)]
struct ModelRecord {
    components: Vec<ComponentRecord>,
}

/// An ordered sum of components.
///
/// Cloning a model clones the handles, so the clone shares its components
/// with the original.
#[derive(Debug, Clone, Default)]
pub struct Model {
    components: Vec<SharedComponent>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component handle.
    ///
    /// A component whose name is already taken is renamed to the first free
    /// `name_N`. Appending the same handle twice is an error.
    pub fn append(&mut self, component: SharedComponent) -> Result<()> {
        if self.components.iter().any(|c| Arc::ptr_eq(c, &component)) {
            let name = component.read().name().to_string();
            return Err(SpecFitError::InvalidInput(format!(
                "Component '{}' is already part of the model",
                name
            )));
        }

        let requested = component.read().name().to_string();
        let names = self.component_names();
        if names.contains(&requested) {
            let unique = (1..)
                .map(|i| format!("{}_{}", requested, i))
                .find(|candidate| !names.contains(candidate))
                .unwrap_or_else(|| requested.clone());
            warn!(
                "component name '{}' is taken, renaming to '{}'",
                requested, unique
            );
            component.write().set_name(&unique);
        }

        self.components.push(component);
        Ok(())
    }

    /// Wrap `component` in a shared handle, append it and return the handle
    pub fn push<C: Component + 'static>(&mut self, component: C) -> Result<SharedComponent> {
        let handle = shared(component);
        self.append(Arc::clone(&handle))?;
        Ok(handle)
    }

    /// Append several component handles in order
    pub fn extend<I>(&mut self, components: I) -> Result<()>
    where
        I: IntoIterator<Item = SharedComponent>,
    {
        for component in components {
            self.append(component)?;
        }
        Ok(())
    }

    /// Remove a component by name and return its handle
    pub fn remove(&mut self, name: &str) -> Result<SharedComponent> {
        let index = self
            .components
            .iter()
            .position(|c| c.read().name() == name)
            .ok_or_else(|| SpecFitError::ComponentNotFound(name.to_string()))?;
        Ok(self.components.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<SharedComponent> {
        self.components
            .iter()
            .find(|c| c.read().name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[SharedComponent] {
        &self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedComponent> {
        self.components.iter()
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components
            .iter()
            .map(|c| c.read().name().to_string())
            .collect()
    }

    /// Free parameters of active components, in model order
    pub fn free_parameters(&self) -> Vec<ParameterId> {
        let mut ids = Vec::new();
        for component in &self.components {
            let component = component.read();
            if !component.active() {
                continue;
            }
            for param in component.parameters().iter().filter(|p| p.free()) {
                ids.push(ParameterId {
                    component: component.name().to_string(),
                    parameter: param.name().to_string(),
                });
            }
        }
        ids
    }

    /// Every parameter the model depends on non-linearly, whatever its
    /// `free` flag or the state of its component
    pub fn nonlinear_parameters(&self) -> Vec<ParameterId> {
        let mut ids = Vec::new();
        for component in &self.components {
            let component = component.read();
            for param in component.parameters().nonlinear() {
                ids.push(ParameterId {
                    component: component.name().to_string(),
                    parameter: param.name().to_string(),
                });
            }
        }
        ids
    }

    /// Free parameters of active components that enter non-linearly
    fn blocking_parameters(&self) -> Vec<ParameterId> {
        let mut ids = Vec::new();
        for component in &self.components {
            let component = component.read();
            if !component.active() {
                continue;
            }
            for param in component.parameters().iter() {
                if param.free() && !param.linear() {
                    ids.push(ParameterId {
                        component: component.name().to_string(),
                        parameter: param.name().to_string(),
                    });
                }
            }
        }
        ids
    }

    /// True when every free parameter of every active component is linear.
    ///
    /// An empty model, or one with nothing free, is linear.
    pub fn is_linear(&self) -> bool {
        self.components.iter().all(|component| {
            let component = component.read();
            !component.active() || component.is_linear()
        })
    }

    pub fn fit_strategy(&self) -> FitStrategy {
        let strategy = if self.is_linear() {
            FitStrategy::Linear
        } else {
            FitStrategy::NonLinear
        };
        debug!("fit strategy {:?} for {} components", strategy, self.len());
        strategy
    }

    /// Fail with [`SpecFitError::NonLinearModel`] naming the offending free
    /// parameters unless the model is linear
    pub fn ensure_linear(&self) -> Result<()> {
        let blocking = self.blocking_parameters();
        if blocking.is_empty() {
            Ok(())
        } else {
            Err(SpecFitError::NonLinearModel {
                parameters: blocking.iter().map(ToString::to_string).collect(),
            })
        }
    }

    /// Set `active` on the named components, or on all of them when `names`
    /// is `None`. Nothing changes if any name is unknown.
    pub fn set_component_active_value(&self, active: bool, names: Option<&[&str]>) -> Result<()> {
        let targets = self.select(names)?;
        for component in targets {
            component.write().set_active(active);
        }
        Ok(())
    }

    /// Free the named parameters of the selected components.
    ///
    /// `components` and `parameters` default to everything when `None`.
    /// Parameter names a component lacks are skipped for that component.
    pub fn set_parameters_free(
        &self,
        components: Option<&[&str]>,
        parameters: Option<&[&str]>,
    ) -> Result<()> {
        self.set_parameters_free_value(true, components, parameters)
    }

    /// Counterpart of [`Model::set_parameters_free`] that fixes parameters
    pub fn set_parameters_not_free(
        &self,
        components: Option<&[&str]>,
        parameters: Option<&[&str]>,
    ) -> Result<()> {
        self.set_parameters_free_value(false, components, parameters)
    }

    fn set_parameters_free_value(
        &self,
        free: bool,
        components: Option<&[&str]>,
        parameters: Option<&[&str]>,
    ) -> Result<()> {
        for component in self.select(components)? {
            let mut component = component.write();
            for param in component.parameters_mut().iter_mut() {
                if parameters.map_or(true, |names| names.contains(&param.name())) {
                    param.set_free(free);
                }
            }
        }
        Ok(())
    }

    /// Resolve component names to handles, all components for `None`
    fn select(&self, names: Option<&[&str]>) -> Result<Vec<SharedComponent>> {
        match names {
            None => Ok(self.components.clone()),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.get(name)
                        .ok_or_else(|| SpecFitError::ComponentNotFound(name.to_string()))
                })
                .collect(),
        }
    }

    /// Current values of [`Model::free_parameters`], in the same order
    pub fn free_values(&self) -> Vec<f64> {
        let mut values = Vec::new();
        for component in &self.components {
            let component = component.read();
            if component.active() {
                values.extend(component.parameters().free().iter().map(|p| p.value()));
            }
        }
        values
    }

    /// Write values back in the order of [`Model::free_parameters`]
    pub fn set_free_values(&self, values: &[f64]) -> Result<()> {
        let expected = self.free_parameters().len();
        if values.len() != expected {
            return Err(SpecFitError::DimensionMismatch(format!(
                "Expected {} free parameter values, got {}",
                expected,
                values.len()
            )));
        }

        // Validate every value before writing any
        let mut remaining = values.iter();
        for component in &self.components {
            let component = component.read();
            if !component.active() {
                continue;
            }
            for param in component.parameters().free() {
                if let Some(&value) = remaining.next() {
                    param.bounds().check(value)?;
                }
            }
        }

        let mut remaining = values.iter();
        for component in &self.components {
            let mut component = component.write();
            if !component.active() {
                continue;
            }
            for param in component.parameters_mut().iter_mut().filter(|p| p.free()) {
                if let Some(&value) = remaining.next() {
                    param.set_value(value)?;
                }
            }
        }
        Ok(())
    }

    /// Sum of all active components evaluated on `x`.
    ///
    /// Components are evaluated in parallel.
    pub fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let parts = self
            .components
            .par_iter()
            .filter_map(|component| {
                let component = component.read();
                if component.active() {
                    Some(component.function(x))
                } else {
                    None
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut total = Array1::<f64>::zeros(x.len());
        for part in parts {
            if part.len() != x.len() {
                return Err(SpecFitError::DimensionMismatch(format!(
                    "Component returned {} values for {} points",
                    part.len(),
                    x.len()
                )));
            }
            total += &part;
        }
        Ok(total)
    }

    /// Observed minus modelled values
    pub fn residuals(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        if x.len() != y.len() {
            return Err(SpecFitError::DimensionMismatch(format!(
                "Expected {} observed values, got {}",
                x.len(),
                y.len()
            )));
        }
        Ok(y - &self.function(x)?)
    }

    fn record(&self) -> ModelRecord {
        ModelRecord {
            components: self.components.iter().map(|c| c.read().to_record()).collect(),
        }
    }

    fn from_record(record: &ModelRecord) -> Result<Self> {
        let mut model = Self::new();
        for component in &record.components {
            model.append(component.restore()?)?;
        }
        Ok(model)
    }

    /// Store component definitions, parameter state and `active` flags
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.record())?)
    }

    /// Rebuild a model stored with [`Model::to_json`].
    ///
    /// Linearity flags are not stored; they are classified again.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_record(&serde_json::from_str(json)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.record())?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Self::from_record(&serde_json::from_reader(reader)?)
    }
}
