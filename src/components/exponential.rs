//! Decay components.

use crate::component::{Component, ComponentCore, ComponentKind};
use crate::components::closed_form_parameters;
use crate::error::Result;
use ndarray::Array1;

/// Exponential decay, f(x) = A * exp(-x / tau)
#[derive(Debug, Clone)]
pub struct Exponential {
    core: ComponentCore,
}

impl Exponential {
    pub const ANALYTIC_FORM: &'static str = "A * exp(-x / tau)";

    pub fn new(name: &str) -> Self {
        let parameters = closed_form_parameters(&[("A", 1.0, true), ("tau", 1.0, false)]);
        Self {
            core: ComponentCore::new(name, parameters),
        }
    }
}

impl Component for Exponential {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Exponential
    }

    fn analytic_form(&self) -> String {
        Self::ANALYTIC_FORM.to_string()
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let amplitude = self.core.value("A")?;
        let tau = self.core.value("tau")?;
        Ok(x.mapv(|xi| amplitude * (-xi / tau).exp()))
    }
}

/// Power law, f(x) = A * (x - origin)^(-r)
#[derive(Debug, Clone)]
pub struct PowerLaw {
    core: ComponentCore,
}

impl PowerLaw {
    pub const ANALYTIC_FORM: &'static str = "A * (x - origin)**(-r)";

    pub fn new(name: &str) -> Self {
        let parameters = closed_form_parameters(&[
            ("A", 1.0, true),
            ("r", 3.0, false),
            ("origin", 0.0, false),
        ]);
        Self {
            core: ComponentCore::new(name, parameters),
        }
    }
}

impl Component for PowerLaw {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::PowerLaw
    }

    fn analytic_form(&self) -> String {
        Self::ANALYTIC_FORM.to_string()
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let amplitude = self.core.value("A")?;
        let r = self.core.value("r")?;
        let origin = self.core.value("origin")?;
        Ok(x.mapv(|xi| amplitude * (xi - origin).powf(-r)))
    }
}
