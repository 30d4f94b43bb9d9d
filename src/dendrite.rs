use log::warn;
use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng};

use crate::activity_history::ActivityView;
use crate::learning::{GlobalRule, LocalRule};
use crate::params::{Connector, NetworkParams, ProjectionParams, WeightBounds, WeightInit};
use crate::util;

#[derive(Debug, Clone)]
pub struct Synapse {
    pub source_rank: usize,
    pub delay: usize,
    pub weight: f32,
}

/// The incoming connections of one postsynaptic neuron from one projection.
#[derive(Debug, Clone)]
pub struct Dendrite {
    pub synapses: Vec<Synapse>,
}

impl Dendrite {
    /// Weighted input sum over all synapses, reading the source activity at
    /// each synapse's conduction delay. A delay beyond the source's history
    /// horizon contributes a neutral 0.0 and is reported, never fatal.
    pub fn compute_sum(&self, source_activity: &ActivityView) -> f32 {
        let mut sum = 0.0;

        for synapse in &self.synapses {
            match source_activity.at(synapse.source_rank, synapse.delay) {
                Some(pre_activity) => sum += synapse.weight * pre_activity,
                None => warn!(
                    "delay {} of synapse from rank {} exceeds source history horizon, substituting 0.0",
                    synapse.delay, synapse.source_rank
                ),
            }
        }

        sum
    }

    pub fn local_learn(
        &mut self,
        rule: &dyn LocalRule,
        source_activity: &ActivityView,
        post_activity: f32,
        weight_bounds: &WeightBounds,
    ) {
        for synapse in &mut self.synapses {
            let pre_activity = source_activity
                .at(synapse.source_rank, synapse.delay)
                .unwrap_or(0.0);

            let delta = rule.weight_delta(pre_activity, post_activity, synapse.weight);
            synapse.weight = weight_bounds.clamp(synapse.weight + delta);
        }
    }

    pub fn global_learn(&mut self, rule: &dyn GlobalRule, weight_bounds: &WeightBounds) {
        rule.apply(&mut self.synapses, weight_bounds);
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }
}

/// Expands a projection's connector for one postsynaptic rank. `None` means
/// the neuron receives nothing from this projection and is skipped by every
/// phase.
pub fn build_dendrite(
    projection_params: &ProjectionParams,
    projection_id: usize,
    post_rank: usize,
    source_count: usize,
    seed: u64,
) -> Option<Dendrite> {
    let self_projection = projection_params.source == projection_params.target;

    match &projection_params.connector {
        Connector::AllToAll {
            weight,
            delay,
            allow_self_connection,
        } => {
            let synapses: Vec<Synapse> = (0..source_count)
                .filter(|source_rank| {
                    *allow_self_connection || !self_projection || *source_rank != post_rank
                })
                .map(|source_rank| Synapse {
                    source_rank,
                    delay: *delay,
                    weight: initial_weight(weight, projection_id, source_rank, post_rank, seed),
                })
                .collect();

            if synapses.is_empty() {
                None
            } else {
                Some(Dendrite { synapses })
            }
        }
        Connector::OneToOne { weight, delay } => {
            if post_rank < source_count {
                Some(Dendrite {
                    synapses: vec![Synapse {
                        source_rank: post_rank,
                        delay: *delay,
                        weight: initial_weight(weight, projection_id, post_rank, post_rank, seed),
                    }],
                })
            } else {
                None
            }
        }
        Connector::Explicit { dendrites } => {
            dendrites[post_rank].as_ref().map(|dendrite_seed| Dendrite {
                synapses: dendrite_seed
                    .synapses
                    .iter()
                    .map(|synapse_seed| Synapse {
                        source_rank: synapse_seed.source_rank,
                        delay: synapse_seed.delay,
                        weight: synapse_seed.weight,
                    })
                    .collect(),
            })
        }
    }
}

// seeded per synapse so the result is independent of the thread count
fn initial_weight(
    weight_init: &WeightInit,
    projection_id: usize,
    source_rank: usize,
    post_rank: usize,
    seed: u64,
) -> f32 {
    match *weight_init {
        WeightInit::Constant(weight) => weight,
        WeightInit::Randomized(max_weight) => {
            let mut rng = StdRng::seed_from_u64(util::stable_hash(&(
                seed,
                projection_id,
                source_rank,
                post_rank,
            )));
            Uniform::new_inclusive(0.0, max_weight).sample(&mut rng)
        }
    }
}

/// Orchestrator-side structural mirror: which postsynaptic ranks carry a
/// dendrite, and how many synapses each one holds.
pub fn presence_and_counts(
    network_params: &NetworkParams,
    projection_id: usize,
) -> (Vec<bool>, Vec<usize>) {
    let projection_params = &network_params.projections[projection_id];
    let source_count = network_params.populations[projection_params.source].neuron_count;
    let target_count = network_params.populations[projection_params.target].neuron_count;
    let seed = network_params.technical_params.seed_override.unwrap_or(0);

    let mut presence = Vec::with_capacity(target_count);
    let mut synapse_counts = Vec::with_capacity(target_count);

    for post_rank in 0..target_count {
        let dendrite = build_dendrite(
            projection_params,
            projection_id,
            post_rank,
            source_count,
            seed,
        );

        presence.push(dendrite.is_some());
        synapse_counts.push(dendrite.map_or(0, |dendrite| dendrite.synapse_count()));
    }

    (presence, synapse_counts)
}

/// The largest conduction delay a connector can produce; drives the source
/// population's history horizon.
pub fn max_connector_delay(connector: &Connector) -> usize {
    match connector {
        Connector::AllToAll { delay, .. } => *delay,
        Connector::OneToOne { delay, .. } => *delay,
        Connector::Explicit { dendrites } => dendrites
            .iter()
            .flatten()
            .flat_map(|dendrite_seed| dendrite_seed.synapses.iter())
            .map(|synapse_seed| synapse_seed.delay)
            .max()
            .unwrap_or(0),
    }
}
