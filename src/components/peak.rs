//! Peak components.

use crate::component::{Component, ComponentCore, ComponentKind};
use crate::components::closed_form_parameters;
use crate::error::Result;
use ndarray::Array1;
use std::f64::consts::PI;

/// Normalised Gaussian peak
///
/// f(x) = A / (sigma * sqrt(2 pi)) * exp(-(x - centre)² / (2 sigma²))
///
/// `A` is the peak area. The model is linear in `A` only.
#[derive(Debug, Clone)]
pub struct Gaussian {
    core: ComponentCore,
}

impl Gaussian {
    pub const ANALYTIC_FORM: &'static str =
        "A / (sigma * sqrt(2 * pi)) * exp(-(x - centre)**2 / (2 * sigma**2))";

    pub fn new(name: &str) -> Self {
        let parameters = closed_form_parameters(&[
            ("A", 1.0, true),
            ("centre", 0.0, false),
            ("sigma", 1.0, false),
        ]);
        Self {
            core: ComponentCore::new(name, parameters),
        }
    }

    /// Full width at half maximum
    pub fn fwhm(&self) -> Result<f64> {
        Ok(self.core.value("sigma")? * 2.0 * (2.0 * 2.0_f64.ln()).sqrt())
    }
}

impl Component for Gaussian {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Gaussian
    }

    fn analytic_form(&self) -> String {
        Self::ANALYTIC_FORM.to_string()
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let amplitude = self.core.value("A")?;
        let centre = self.core.value("centre")?;
        let sigma = self.core.value("sigma")?;

        let norm = amplitude / (sigma * (2.0 * PI).sqrt());
        Ok(x.mapv(|xi| norm * (-(xi - centre).powi(2) / (2.0 * sigma * sigma)).exp()))
    }
}

/// Lorentzian (Cauchy) peak
///
/// f(x) = A / pi * gamma / ((x - centre)² + gamma²)
///
/// `gamma` is the half width at half maximum. Linear in `A` only.
#[derive(Debug, Clone)]
pub struct Lorentzian {
    core: ComponentCore,
}

impl Lorentzian {
    pub const ANALYTIC_FORM: &'static str = "A / pi * gamma / ((x - centre)**2 + gamma**2)";

    pub fn new(name: &str) -> Self {
        let parameters = closed_form_parameters(&[
            ("A", 1.0, true),
            ("centre", 0.0, false),
            ("gamma", 1.0, false),
        ]);
        Self {
            core: ComponentCore::new(name, parameters),
        }
    }
}

impl Component for Lorentzian {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Lorentzian
    }

    fn analytic_form(&self) -> String {
        Self::ANALYTIC_FORM.to_string()
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let amplitude = self.core.value("A")?;
        let centre = self.core.value("centre")?;
        let gamma = self.core.value("gamma")?;

        Ok(x.mapv(|xi| amplitude / PI * gamma / ((xi - centre).powi(2) + gamma * gamma)))
    }
}
