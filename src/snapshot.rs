use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub population_states: Vec<PopulationSnapshot>,
    pub projection_states: Vec<ProjectionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub name: String,
    pub activity: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSnapshot {
    pub sums: Vec<f32>,
    pub dendrites: Vec<DendriteSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DendriteSnapshot {
    pub post_rank: usize,
    pub synapses: Vec<SynapseSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapseSnapshot {
    pub source_rank: usize,
    pub delay: usize,
    pub weight: f32,
}
