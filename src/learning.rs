use crate::dendrite::Synapse;
use crate::params::{GlobalRuleParams, LocalRuleParams, WeightBounds};

/// Connection-level plasticity: one weight update computable from a single
/// synapse's pre/post activity and current weight.
pub trait LocalRule {
    fn weight_delta(&self, pre_activity: f32, post_activity: f32, weight: f32) -> f32;
}

/// Dendrite-scoped plasticity: one update over a dendrite's whole synapse
/// set, applied once per eligible step after the local pass.
pub trait GlobalRule {
    fn apply(&self, synapses: &mut [Synapse], weight_bounds: &WeightBounds);
}

pub fn create_local(params: &LocalRuleParams) -> Box<dyn LocalRule + Send> {
    match *params {
        LocalRuleParams::None => Box::new(NoLocalRule),
        LocalRuleParams::Hebbian { learning_rate } => Box::new(Hebbian { learning_rate }),
        LocalRuleParams::Oja { learning_rate } => Box::new(Oja { learning_rate }),
    }
}

pub fn create_global(params: &GlobalRuleParams) -> Box<dyn GlobalRule + Send> {
    match *params {
        GlobalRuleParams::None => Box::new(NoGlobalRule),
        GlobalRuleParams::Normalize { target } => Box::new(Normalize { target }),
    }
}

struct NoLocalRule;

struct Hebbian {
    learning_rate: f32,
}

struct Oja {
    learning_rate: f32,
}

struct NoGlobalRule;

struct Normalize {
    target: f32,
}

impl LocalRule for NoLocalRule {
    fn weight_delta(&self, _pre_activity: f32, _post_activity: f32, _weight: f32) -> f32 {
        0.0
    }
}

impl LocalRule for Hebbian {
    fn weight_delta(&self, pre_activity: f32, post_activity: f32, _weight: f32) -> f32 {
        self.learning_rate * pre_activity * post_activity
    }
}

impl LocalRule for Oja {
    fn weight_delta(&self, pre_activity: f32, post_activity: f32, weight: f32) -> f32 {
        self.learning_rate * post_activity * (pre_activity - post_activity * weight)
    }
}

impl GlobalRule for NoGlobalRule {
    fn apply(&self, _synapses: &mut [Synapse], _weight_bounds: &WeightBounds) {}
}

impl GlobalRule for Normalize {
    fn apply(&self, synapses: &mut [Synapse], weight_bounds: &WeightBounds) {
        let total: f32 = synapses.iter().map(|synapse| synapse.weight.abs()).sum();

        if total <= 0.0 {
            return;
        }

        let scale = self.target / total;

        for synapse in synapses {
            synapse.weight = weight_bounds.clamp(synapse.weight * scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn make_synapses(weights: &[f32]) -> Vec<Synapse> {
        weights
            .iter()
            .enumerate()
            .map(|(source_rank, weight)| Synapse {
                source_rank,
                delay: 0,
                weight: *weight,
            })
            .collect()
    }

    #[test]
    fn no_local_rule() {
        let rule = create_local(&LocalRuleParams::None);
        assert_approx_eq!(f32, rule.weight_delta(1.0, 1.0, 0.5), 0.0);
    }

    #[test]
    fn hebbian() {
        let rule = create_local(&LocalRuleParams::Hebbian { learning_rate: 0.1 });
        assert_approx_eq!(f32, rule.weight_delta(0.5, 2.0, 0.3), 0.1 * 0.5 * 2.0);
        assert_approx_eq!(f32, rule.weight_delta(0.0, 2.0, 0.3), 0.0);
    }

    #[test]
    fn oja() {
        let rule = create_local(&LocalRuleParams::Oja { learning_rate: 0.1 });
        assert_approx_eq!(
            f32,
            rule.weight_delta(0.5, 2.0, 0.3),
            0.1 * 2.0 * (0.5 - 2.0 * 0.3)
        );
    }

    #[test]
    fn no_global_rule() {
        let rule = create_global(&GlobalRuleParams::None);
        let mut synapses = make_synapses(&[0.1, 0.7]);
        rule.apply(&mut synapses, &WeightBounds::default());

        assert_approx_eq!(f32, synapses[0].weight, 0.1);
        assert_approx_eq!(f32, synapses[1].weight, 0.7);
    }

    #[test]
    fn normalize() {
        let rule = create_global(&GlobalRuleParams::Normalize { target: 1.0 });
        let mut synapses = make_synapses(&[0.1, 0.3]);
        rule.apply(&mut synapses, &WeightBounds::default());

        assert_approx_eq!(f32, synapses[0].weight, 0.25);
        assert_approx_eq!(f32, synapses[1].weight, 0.75);

        let total: f32 = synapses.iter().map(|synapse| synapse.weight).sum();
        assert_approx_eq!(f32, total, 1.0);
    }

    #[test]
    fn normalize_skips_all_zero_weights() {
        let rule = create_global(&GlobalRuleParams::Normalize { target: 1.0 });
        let mut synapses = make_synapses(&[0.0, 0.0]);
        rule.apply(&mut synapses, &WeightBounds::default());

        assert_approx_eq!(f32, synapses[0].weight, 0.0);
        assert_approx_eq!(f32, synapses[1].weight, 0.0);
    }

    #[test]
    fn normalize_respects_bounds() {
        let rule = create_global(&GlobalRuleParams::Normalize { target: 2.0 });
        let weight_bounds = WeightBounds {
            min_weight: 0.0,
            max_weight: 1.2,
        };

        let mut synapses = make_synapses(&[0.5, 0.5]);
        rule.apply(&mut synapses, &weight_bounds);

        assert_approx_eq!(f32, synapses[0].weight, 1.0);
        assert_approx_eq!(f32, synapses[1].weight, 1.0);

        let mut synapses = make_synapses(&[0.9, 0.1]);
        rule.apply(&mut synapses, &weight_bounds);

        assert_approx_eq!(f32, synapses[0].weight, 1.2);
        assert_approx_eq!(f32, synapses[1].weight, 0.2);
    }
}
