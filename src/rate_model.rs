use crate::params::RateModelParams;

/// Per-population activation rule: combines the aggregated per-kind input
/// sums and advances the activity by one timestep.
pub trait RateModel {
    fn initial_activity(&self) -> f32 {
        0.0
    }

    fn total_input(&self, excitatory_sum: f32, inhibitory_sum: f32) -> f32 {
        excitatory_sum - inhibitory_sum
    }

    fn advance(&self, activity: f32, input: f32, dt: f32) -> f32;
}

pub fn create(params: &RateModelParams) -> Box<dyn RateModel + Send> {
    match *params {
        RateModelParams::Identity => Box::new(Identity),
        RateModelParams::Constant { value } => Box::new(Constant { value }),
        RateModelParams::LeakyIntegrator {
            tau,
            baseline,
            floor,
        } => Box::new(LeakyIntegrator {
            tau,
            baseline,
            floor,
        }),
    }
}

struct Identity;

struct Constant {
    value: f32,
}

struct LeakyIntegrator {
    tau: f32,
    baseline: f32,
    floor: f32,
}

impl RateModel for Identity {
    fn advance(&self, _activity: f32, input: f32, _dt: f32) -> f32 {
        input
    }
}

impl RateModel for Constant {
    fn initial_activity(&self) -> f32 {
        self.value
    }

    fn advance(&self, _activity: f32, _input: f32, _dt: f32) -> f32 {
        self.value
    }
}

impl RateModel for LeakyIntegrator {
    fn advance(&self, activity: f32, input: f32, dt: f32) -> f32 {
        let next_activity = activity + dt / self.tau * (input + self.baseline - activity);
        next_activity.max(self.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn identity() {
        let model = create(&RateModelParams::Identity);
        assert_approx_eq!(f32, model.initial_activity(), 0.0);
        assert_approx_eq!(f32, model.advance(0.7, 0.3, 1.0), 0.3);
    }

    #[test]
    fn constant() {
        let model = create(&RateModelParams::Constant { value: 1.5 });
        assert_approx_eq!(f32, model.initial_activity(), 1.5);
        assert_approx_eq!(f32, model.advance(0.0, 100.0, 1.0), 1.5);
    }

    #[test]
    fn input_combination() {
        let model = create(&RateModelParams::Identity);
        assert_approx_eq!(f32, model.total_input(0.8, 0.3), 0.5);
    }

    #[test]
    fn leaky_integrator_relaxes_towards_input() {
        let model = create(&RateModelParams::LeakyIntegrator {
            tau: 10.0,
            baseline: 0.1,
            floor: 0.0,
        });

        let next_activity = model.advance(0.5, 1.0, 1.0);
        assert_approx_eq!(f32, next_activity, 0.5 + 0.1 * (1.0 + 0.1 - 0.5));

        let mut activity = 0.0;
        for _ in 0..1000 {
            activity = model.advance(activity, 1.0, 1.0);
        }
        assert_approx_eq!(f32, activity, 1.1, epsilon = 1e-3);
    }

    #[test]
    fn leaky_integrator_floor() {
        let model = create(&RateModelParams::LeakyIntegrator {
            tau: 1.0,
            baseline: 0.0,
            floor: 0.0,
        });

        assert_approx_eq!(f32, model.advance(0.2, -5.0, 1.0), 0.0);
    }
}
