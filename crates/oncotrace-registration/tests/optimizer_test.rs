use nalgebra::Vector6;
use oncotrace_registration::{RegistrationConfig, RegularStepGradientDescent, StopReason};
use proptest::prelude::*;

fn vector6() -> impl Strategy<Value = Vector6<f64>> {
    prop::array::uniform6(-10.0f64..10.0).prop_map(|a| Vector6::from_row_slice(&a))
}

fn scales() -> impl Strategy<Value = Vector6<f64>> {
    prop::array::uniform6(0.1f64..50.0).prop_map(|a| Vector6::from_row_slice(&a))
}

proptest! {
    #[test]
    fn scaled_step_length_equals_learning_rate(gradient in vector6(), scales in scales(), lr in 0.01f64..5.0) {
        prop_assume!(gradient.component_div(&scales).norm() > 1e-3);
        let config = RegistrationConfig::default()
            .with_learning_rate(lr)
            .with_min_step_length(lr / 10.0);
        let optimizer = RegularStepGradientDescent::new(&config, scales);

        let (next, stop) = optimizer.step(optimizer.start(Vector6::zeros()), 0.0, &gradient);
        prop_assert!(stop.is_none());

        let scaled_step = next.parameters.component_mul(&scales);
        prop_assert!((scaled_step.norm() - lr).abs() < 1e-9);
        // descent direction
        prop_assert!(scaled_step.dot(&gradient.component_div(&scales)) < 0.0);
    }

    #[test]
    fn learning_rate_never_grows(gradients in prop::collection::vec(vector6(), 1..30)) {
        let config = RegistrationConfig::default().with_max_iterations(1000);
        let optimizer = RegularStepGradientDescent::new(&config, Vector6::repeat(1.0));
        let mut state = optimizer.start(Vector6::zeros());
        let mut previous_lr = state.learning_rate;

        for (i, g) in gradients.iter().enumerate() {
            let (next, stop) = optimizer.step(state, i as f64, g);
            prop_assert!(next.learning_rate <= previous_lr);
            previous_lr = next.learning_rate;
            state = next;
            if let Some(reason) = stop {
                prop_assert!(reason != StopReason::MaximumIterations);
                break;
            }
        }
    }
}
