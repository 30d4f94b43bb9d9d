use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

use crate::types::HashSet;

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct NetworkParams {
    pub populations: Vec<PopulationParams>,
    pub projections: Vec<ProjectionParams>,
    pub technical_params: TechnicalParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationParams {
    pub name: String,
    pub neuron_count: usize,
    pub dt: f32,
    pub model: RateModelParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RateModelParams {
    Identity,
    Constant {
        value: f32,
    },
    LeakyIntegrator {
        tau: f32,
        baseline: f32,
        floor: f32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionParams {
    pub source: usize,
    pub target: usize,
    pub kind: TargetKind,
    pub connector: Connector,
    pub learn_period: u64,
    pub learn_phase: u64,
    pub local_rule: LocalRuleParams,
    pub global_rule: GlobalRuleParams,
    pub weight_bounds: WeightBounds,
}

impl ProjectionParams {
    pub fn defaults_for_population_ids(source: usize, target: usize) -> Self {
        Self {
            source,
            target,
            kind: TargetKind::Excitatory,
            connector: Connector::AllToAll {
                weight: WeightInit::Constant(1.0),
                delay: 0,
                allow_self_connection: true,
            },
            learn_period: 1,
            learn_phase: 0,
            local_rule: LocalRuleParams::None,
            global_rule: GlobalRuleParams::None,
            weight_bounds: WeightBounds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Excitatory,
    Inhibitory,
}

impl TargetKind {
    pub const COUNT: usize = 2;

    pub fn index(self) -> usize {
        match self {
            TargetKind::Excitatory => 0,
            TargetKind::Inhibitory => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Connector {
    AllToAll {
        weight: WeightInit,
        delay: usize,
        allow_self_connection: bool,
    },
    OneToOne {
        weight: WeightInit,
        delay: usize,
    },
    Explicit {
        dendrites: Vec<Option<DendriteSeed>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DendriteSeed {
    pub synapses: Vec<SynapseSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapseSeed {
    pub source_rank: usize,
    pub delay: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WeightInit {
    Randomized(f32),
    Constant(f32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LocalRuleParams {
    None,
    Hebbian { learning_rate: f32 },
    Oja { learning_rate: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GlobalRuleParams {
    None,
    Normalize { target: f32 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightBounds {
    pub min_weight: f32,
    pub max_weight: f32,
}

impl WeightBounds {
    pub fn clamp(&self, weight: f32) -> f32 {
        weight.max(self.min_weight).min(self.max_weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalParams {
    pub num_threads: Option<usize>,
    pub pin_threads: bool,
    pub seed_override: Option<u64>,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            name: String::new(),
            neuron_count: 1,
            dt: 1.0,
            model: RateModelParams::Identity,
        }
    }
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self {
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            num_threads: Some(1),
            pin_threads: false,
            seed_override: None,
        }
    }
}

pub fn validate_network_params(network_params: &NetworkParams) -> Result<(), SimpleError> {
    let mut seen_names = HashSet::default();

    for population_params in &network_params.populations {
        if !seen_names.insert(population_params.name.as_str()) {
            return Err(SimpleError::new(format!(
                "duplicate population name: {}",
                population_params.name
            )));
        }

        validate_population_params(population_params)?;
    }

    let mut seen_target_kind_pairs = HashSet::default();

    for projection_params in &network_params.projections {
        if projection_params.source >= network_params.populations.len() {
            return Err(SimpleError::new(format!(
                "invalid source population id: {}",
                projection_params.source
            )));
        }

        if projection_params.target >= network_params.populations.len() {
            return Err(SimpleError::new(format!(
                "invalid target population id: {}",
                projection_params.target
            )));
        }

        if !seen_target_kind_pairs.insert((projection_params.target, projection_params.kind)) {
            return Err(SimpleError::new(format!(
                "duplicate {:?} projection into population {}",
                projection_params.kind, projection_params.target
            )));
        }

        validate_projection_params(projection_params, network_params)?;
    }

    validate_technical_params(&network_params.technical_params)?;

    Ok(())
}

fn validate_population_params(population_params: &PopulationParams) -> Result<(), SimpleError> {
    if population_params.dt <= 0.0 {
        return Err(SimpleError::new("dt must be strictly positive"));
    }

    if let RateModelParams::LeakyIntegrator { tau, .. } = population_params.model {
        if tau <= 0.0 {
            return Err(SimpleError::new("tau must be strictly positive"));
        }
    }

    Ok(())
}

fn validate_projection_params(
    projection_params: &ProjectionParams,
    network_params: &NetworkParams,
) -> Result<(), SimpleError> {
    if projection_params.learn_period == 0 {
        return Err(SimpleError::new("learn_period must be strictly positive"));
    }

    if projection_params.learn_phase >= projection_params.learn_period {
        return Err(SimpleError::new(
            "learn_phase must be less than learn_period",
        ));
    }

    if projection_params.weight_bounds.min_weight > projection_params.weight_bounds.max_weight {
        return Err(SimpleError::new(
            "min_weight must not be greater than max_weight",
        ));
    }

    validate_connector(&projection_params.connector, projection_params, network_params)?;
    validate_local_rule_params(&projection_params.local_rule)?;
    validate_global_rule_params(&projection_params.global_rule)?;

    Ok(())
}

fn validate_connector(
    connector: &Connector,
    projection_params: &ProjectionParams,
    network_params: &NetworkParams,
) -> Result<(), SimpleError> {
    match connector {
        Connector::AllToAll { weight, .. } => validate_weight_init(weight)?,
        Connector::OneToOne { weight, .. } => validate_weight_init(weight)?,
        Connector::Explicit { dendrites } => {
            let target_count = network_params.populations[projection_params.target].neuron_count;
            if dendrites.len() != target_count {
                return Err(SimpleError::new(
                    "explicit connector must provide one entry per target neuron",
                ));
            }

            let source_count = network_params.populations[projection_params.source].neuron_count;

            for synapse_seed in dendrites
                .iter()
                .flatten()
                .flat_map(|dendrite_seed| dendrite_seed.synapses.iter())
            {
                if synapse_seed.source_rank >= source_count {
                    return Err(SimpleError::new(format!(
                        "invalid source rank in explicit connector: {}",
                        synapse_seed.source_rank
                    )));
                }
            }
        }
    }

    Ok(())
}

fn validate_weight_init(weight_init: &WeightInit) -> Result<(), SimpleError> {
    match *weight_init {
        WeightInit::Randomized(max_weight) => {
            if max_weight <= 0.0 {
                return Err(SimpleError::new(
                    "Parameter for randomized initial weight must be strictly positive",
                ));
            }
        }
        WeightInit::Constant(weight) => {
            if weight < 0.0 {
                return Err(SimpleError::new(
                    "Parameter for constant initial weight must not be negative",
                ));
            }
        }
    }

    Ok(())
}

fn validate_local_rule_params(local_rule: &LocalRuleParams) -> Result<(), SimpleError> {
    let learning_rate = match *local_rule {
        LocalRuleParams::None => return Ok(()),
        LocalRuleParams::Hebbian { learning_rate } => learning_rate,
        LocalRuleParams::Oja { learning_rate } => learning_rate,
    };

    if learning_rate <= 0.0 {
        return Err(SimpleError::new("learning_rate must be strictly positive"));
    }

    Ok(())
}

fn validate_global_rule_params(global_rule: &GlobalRuleParams) -> Result<(), SimpleError> {
    if let GlobalRuleParams::Normalize { target } = *global_rule {
        if target <= 0.0 {
            return Err(SimpleError::new(
                "normalization target must be strictly positive",
            ));
        }
    }

    Ok(())
}

fn validate_technical_params(technical_params: &TechnicalParams) -> Result<(), SimpleError> {
    if let Some(num_threads) = technical_params.num_threads {
        if num_threads == 0 {
            return Err(SimpleError::new("num_threads must be strictly positive"));
        }

        if num_cpus::get() < num_threads {
            return Err(SimpleError::new(
                "num_threads must not be greater than number of available CPUs",
            ));
        }
    }

    Ok(())
}
