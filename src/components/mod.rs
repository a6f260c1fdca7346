//! Built-in components.
//!
//! [`ExpressionComponent`] wraps an arbitrary formula and classifies its
//! parameters symbolically. The closed-form components (peaks, backgrounds and
//! decays commonly fitted to spectra) evaluate their analytic form directly and
//! carry fixed linearity flags, which the integration tests check against the
//! classifier.

mod exponential;
mod expression;
mod peak;
mod polynomial;

pub use exponential::{Exponential, PowerLaw};
pub use expression::ExpressionComponent;
pub use peak::{Gaussian, Lorentzian};
pub use polynomial::{Offset, Polynomial};

use crate::parameters::{Parameter, Parameters};

/// Parameters of a closed-form component as `(name, initial value, linear)`
fn closed_form_parameters(entries: &[(&str, f64, bool)]) -> Parameters {
    let mut parameters = Parameters::new();
    for &(name, value, linear) in entries {
        let mut param = Parameter::new(name, value);
        param.set_linear(linear);
        parameters.insert(param);
    }
    parameters
}
