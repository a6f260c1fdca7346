//! Background components linear in all of their parameters.

use crate::component::{Component, ComponentCore, ComponentKind};
use crate::components::closed_form_parameters;
use crate::error::Result;
use ndarray::Array1;

/// Constant background, f(x) = offset
#[derive(Debug, Clone)]
pub struct Offset {
    core: ComponentCore,
}

impl Offset {
    pub const ANALYTIC_FORM: &'static str = "offset";

    pub fn new(name: &str) -> Self {
        Self {
            core: ComponentCore::new(name, closed_form_parameters(&[("offset", 0.0, true)])),
        }
    }
}

impl Component for Offset {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Offset
    }

    fn analytic_form(&self) -> String {
        Self::ANALYTIC_FORM.to_string()
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_elem(x.len(), self.core.value("offset")?))
    }
}

/// Polynomial of a given order
///
/// f(x) = a0 + a1 * x + ... + aN * x^N
#[derive(Debug, Clone)]
pub struct Polynomial {
    core: ComponentCore,
    order: usize,
}

impl Polynomial {
    pub fn new(name: &str, order: usize) -> Self {
        let names: Vec<String> = (0..=order).map(coefficient_name).collect();
        let entries: Vec<(&str, f64, bool)> =
            names.iter().map(|name| (name.as_str(), 0.0, true)).collect();
        Self {
            core: ComponentCore::new(name, closed_form_parameters(&entries)),
            order,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    fn coefficients(&self) -> Result<Vec<f64>> {
        (0..=self.order)
            .map(|i| self.core.value(&coefficient_name(i)))
            .collect()
    }
}

fn coefficient_name(power: usize) -> String {
    format!("a{}", power)
}

impl Component for Polynomial {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Polynomial { order: self.order }
    }

    fn analytic_form(&self) -> String {
        (0..=self.order)
            .map(|i| match i {
                0 => coefficient_name(0),
                1 => format!("{} * x", coefficient_name(1)),
                _ => format!("{} * x**{}", coefficient_name(i), i),
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients()?;
        // Horner's scheme
        Ok(x.mapv(|xi| coefficients.iter().rev().fold(0.0, |acc, &c| acc * xi + c)))
    }
}
