//! Closed-form components against the symbolic classifier

use approx::assert_relative_eq;
use ndarray::Array1;
use specfit_rs::parameters::Expression;
use specfit_rs::{ComponentKind, LinearityClassifier, LinearityConfig, SharedComponent};

fn closed_form_kinds() -> Vec<ComponentKind> {
    vec![
        ComponentKind::Gaussian,
        ComponentKind::Lorentzian,
        ComponentKind::Offset,
        ComponentKind::Polynomial { order: 0 },
        ComponentKind::Polynomial { order: 3 },
        ComponentKind::Exponential,
        ComponentKind::PowerLaw,
    ]
}

fn build(kind: &ComponentKind) -> SharedComponent {
    kind.build("c").unwrap()
}

#[test]
fn test_flags_match_classifier() {
    for kind in closed_form_kinds() {
        let component = build(&kind);
        let component = component.read();
        let classifier = LinearityClassifier::new(
            LinearityConfig::default().with_independent_variable(component.independent_variable()),
        );
        let form = Expression::parse(&component.analytic_form()).unwrap();
        let classified = classifier.classify_all(&form).unwrap();

        assert_eq!(
            classified.keys().cloned().collect::<Vec<_>>(),
            {
                let mut names = component.parameters().names();
                names.sort();
                names
            },
            "{:?} parameters differ from its analytic form",
            kind
        );
        for param in component.parameters() {
            assert_eq!(
                param.linear(),
                classified[param.name()],
                "{:?}: flag of '{}'",
                kind,
                param.name()
            );
        }
    }
}

#[test]
fn test_known_flags() {
    let expectations: [(ComponentKind, &[&str], &[&str]); 5] = [
        (ComponentKind::Gaussian, &["A"], &["centre", "sigma"]),
        (ComponentKind::Lorentzian, &["A"], &["centre", "gamma"]),
        (ComponentKind::Offset, &["offset"], &[]),
        (ComponentKind::Exponential, &["A"], &["tau"]),
        (ComponentKind::PowerLaw, &["A"], &["origin", "r"]),
    ];
    for (kind, linear, nonlinear) in expectations {
        let component = build(&kind);
        let component = component.read();
        for name in linear {
            assert!(component.parameters().get(name).unwrap().linear(), "{}", name);
        }
        for name in nonlinear {
            assert!(!component.parameters().get(name).unwrap().linear(), "{}", name);
        }
        assert_eq!(component.is_linear(), nonlinear.is_empty());
    }
}

#[test]
fn test_function_matches_analytic_form() {
    let x = Array1::linspace(0.5, 5.0, 10);
    for kind in closed_form_kinds() {
        let component = build(&kind);
        let component = component.read();
        let direct = component.function(&x).unwrap();

        let form = Expression::parse(&component.analytic_form()).unwrap();
        let via_form = specfit_rs::component::evaluate_on_axis(
            &form,
            component.parameters(),
            component.independent_variable(),
            &x,
        )
        .unwrap();

        for (a, b) in direct.iter().zip(via_form.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12, max_relative = 1e-10);
        }
    }
}

#[test]
fn test_gradient_matches_finite_differences() {
    let x = Array1::linspace(0.5, 5.0, 10);
    for kind in closed_form_kinds() {
        let component = build(&kind);
        let names = component.read().parameters().names();

        for name in names {
            let value = component.read().parameters().get(&name).unwrap().value();
            let step = 1e-6 * value.abs().max(1.0);

            let shifted = |delta: f64| {
                let mut guard = component.write();
                guard
                    .parameters_mut()
                    .get_mut(&name)
                    .unwrap()
                    .set_value(value + delta)
                    .unwrap();
                let y = guard.function(&x).unwrap();
                guard
                    .parameters_mut()
                    .get_mut(&name)
                    .unwrap()
                    .set_value(value)
                    .unwrap();
                y
            };
            let numeric = (shifted(step) - shifted(-step)) / (2.0 * step);
            let analytic = component.read().gradient(&name, &x).unwrap();

            for (a, n) in analytic.iter().zip(numeric.iter()) {
                assert_relative_eq!(*a, *n, epsilon = 1e-6, max_relative = 1e-5);
            }
        }
    }
}
