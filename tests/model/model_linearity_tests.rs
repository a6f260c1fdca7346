//! Linearity of models built from components

use crate::test_helpers::init_logging;
use specfit_rs::component::Component;
use specfit_rs::components::{ExpressionComponent, Gaussian, Lorentzian, Offset, PowerLaw};
use specfit_rs::{FitStrategy, Model, SharedComponent, SpecFitError};

fn gaussian_model() -> (Model, SharedComponent) {
    init_logging();
    let mut model = Model::new();
    let g = model.push(Gaussian::new("g")).unwrap();
    (model, g)
}

fn freeze_shape(g: &SharedComponent) {
    let mut g = g.write();
    g.parameters_mut().get_mut("sigma").unwrap().set_free(false);
    g.parameters_mut().get_mut("centre").unwrap().set_free(false);
}

#[test]
fn test_model_linear() {
    let (model, g) = gaussian_model();
    assert!(!model.is_linear());

    freeze_shape(&g);
    let nonlinear = model.nonlinear_parameters();
    assert_eq!(nonlinear.len(), 2);
    {
        let g = g.read();
        assert!(nonlinear
            .iter()
            .all(|id| !g.parameters().get(&id.parameter).unwrap().free()));
    }
    assert!(model.is_linear());
}

#[test]
fn test_model_linear_inactive_component() {
    let (model, g) = gaussian_model();
    assert!(!model.is_linear());

    g.write().set_active(false);
    assert!(model.is_linear());
    assert_eq!(model.fit_strategy(), FitStrategy::Linear);
}

#[test]
fn test_model_linear_set_component_active_value() {
    let (model, _g) = gaussian_model();
    assert!(!model.is_linear());

    model.set_component_active_value(false, Some(&["g"])).unwrap();
    assert!(model.is_linear());

    model.set_component_active_value(true, None).unwrap();
    assert!(!model.is_linear());
}

#[test]
fn test_expression_components() {
    init_logging();
    let peak = ExpressionComponent::new(
        "peak",
        "height * exp(-(x - centre) ** 2 * 4 * log(2)/ fwhm ** 2)",
        "x",
    )
    .unwrap();
    let flags: Vec<(String, bool)> = peak
        .parameters()
        .iter()
        .map(|p| (p.name().to_string(), p.linear()))
        .collect();
    assert_eq!(
        flags,
        vec![
            ("centre".to_string(), false),
            ("fwhm".to_string(), false),
            ("height".to_string(), true),
        ]
    );

    let line = ExpressionComponent::new("line", "a * x + b", "x").unwrap();
    assert!(line.parameters().iter().all(|p| p.linear()));

    let mut model = Model::new();
    model.push(peak).unwrap();
    model.push(line).unwrap();
    assert!(!model.is_linear());

    model
        .set_parameters_not_free(Some(&["peak"]), Some(&["centre", "fwhm"]))
        .unwrap();
    assert!(model.is_linear());
}

#[test]
fn test_linearity_tracks_free_and_active_flags() {
    init_logging();
    let mut model = Model::new();
    model.push(Lorentzian::new("l")).unwrap();
    model.push(PowerLaw::new("background")).unwrap();
    model.push(Offset::new("o")).unwrap();

    match model.ensure_linear() {
        Err(SpecFitError::NonLinearModel { parameters }) => assert_eq!(
            parameters,
            vec!["l.centre", "l.gamma", "background.r", "background.origin"]
        ),
        other => panic!("Expected NonLinearModel, got {:?}", other),
    }

    model.set_parameters_not_free(None, Some(&["centre", "gamma"])).unwrap();
    model.set_component_active_value(false, Some(&["background"])).unwrap();
    assert!(model.ensure_linear().is_ok());

    // Freeing a linear parameter cannot break linearity
    model.set_parameters_free(Some(&["o"]), None).unwrap();
    assert!(model.is_linear());

    model.set_parameters_free(Some(&["l"]), Some(&["gamma"])).unwrap();
    assert!(!model.is_linear());
}

#[test]
fn test_unknown_component_leaves_model_untouched() {
    let (model, g) = gaussian_model();
    assert!(matches!(
        model.set_parameters_not_free(Some(&["g", "nope"]), None),
        Err(SpecFitError::ComponentNotFound(name)) if name == "nope"
    ));
    assert!(g.read().parameters().iter().all(|p| p.free()));
    assert!(!model.is_linear());
}
