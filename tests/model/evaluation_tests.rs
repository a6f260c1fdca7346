//! Evaluating models and solving linear ones

use crate::test_helpers::{array_approx_eq, axis, init_logging};
use approx::assert_relative_eq;
use ndarray::Array1;
use specfit_rs::component::Component;
use specfit_rs::components::{Gaussian, Offset, Polynomial};
use specfit_rs::{FitStrategy, Model, SharedComponent};

fn set(component: &SharedComponent, parameter: &str, value: f64) {
    component
        .write()
        .parameters_mut()
        .get_mut(parameter)
        .unwrap()
        .set_value(value)
        .unwrap();
}

#[test]
fn test_function_is_sum_of_components() {
    init_logging();
    let x = axis();
    let mut model = Model::new();
    let mut handles = Vec::new();
    for i in 0..16 {
        let g = model.push(Gaussian::new("peak")).unwrap();
        set(&g, "centre", -4.0 + 0.5 * i as f64);
        set(&g, "A", 1.0 + i as f64);
        handles.push(g);
    }
    assert_eq!(model.len(), 16);
    assert_eq!(model.component_names()[15], "peak_15");

    let mut expected = Array1::<f64>::zeros(x.len());
    for g in &handles {
        expected += &g.read().function(&x).unwrap();
    }
    assert!(array_approx_eq(&model.function(&x).unwrap(), &expected, 1e-12));

    handles[3].write().set_active(false);
    expected -= &handles[3].read().function(&x).unwrap();
    assert!(array_approx_eq(&model.function(&x).unwrap(), &expected, 1e-12));
}

#[test]
fn test_linear_model_solves_by_least_squares() {
    init_logging();
    let x = axis();
    let mut model = Model::new();
    let g = model.push(Gaussian::new("g")).unwrap();
    let o = model.push(Offset::new("o")).unwrap();
    set(&g, "centre", 0.5);
    set(&g, "sigma", 1.2);
    g.write()
        .set_parameters_not_free(Some(&["centre", "sigma"]))
        .unwrap();

    model.set_free_values(&[3.0, 0.7]).unwrap();
    let y = model.function(&x).unwrap();
    model.set_free_values(&[1.0, 0.0]).unwrap();

    assert_eq!(model.fit_strategy(), FitStrategy::Linear);

    // Design matrix columns are the partial derivatives of the free parameters
    let columns = [
        g.read().gradient("A", &x).unwrap(),
        o.read().gradient("offset", &x).unwrap(),
    ];
    let a11 = columns[0].dot(&columns[0]);
    let a12 = columns[0].dot(&columns[1]);
    let a22 = columns[1].dot(&columns[1]);
    let b1 = columns[0].dot(&y);
    let b2 = columns[1].dot(&y);
    let det = a11 * a22 - a12 * a12;
    let amplitude = (b1 * a22 - b2 * a12) / det;
    let offset = (a11 * b2 - a12 * b1) / det;

    assert_relative_eq!(amplitude, 3.0, epsilon = 1e-9);
    assert_relative_eq!(offset, 0.7, epsilon = 1e-9);

    model.set_free_values(&[amplitude, offset]).unwrap();
    let residuals = model.residuals(&x, &y).unwrap();
    assert!(residuals.iter().all(|r| r.abs() < 1e-9));
}

#[test]
fn test_polynomial_gradient_is_design_matrix() {
    let x = axis();
    let mut model = Model::new();
    let p = model.push(Polynomial::new("p", 2)).unwrap();
    model.set_free_values(&[1.0, -2.0, 0.5]).unwrap();

    let p = p.read();
    for (i, name) in ["a0", "a1", "a2"].iter().enumerate() {
        let column = p.gradient(name, &x).unwrap();
        let expected = x.mapv(|xi| xi.powi(i as i32));
        assert!(array_approx_eq(&column, &expected, 1e-12));
    }
    let y = p.function(&x).unwrap();
    assert_relative_eq!(y[50], 1.0, epsilon = 1e-12);
    assert_relative_eq!(y[100], 1.0 - 10.0 + 12.5, epsilon = 1e-12);
}
