use std::sync::mpsc::channel as mpsc_channel;
use std::sync::mpsc::Receiver as MpscReceiver;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use bus::Bus;
use core_affinity::CoreId;
use itertools::Itertools;
use simple_error::{try_with, SimpleError, SimpleResult};

use crate::activity_history::{ActivityHistory, ActivityView};
use crate::dendrite;
use crate::params;
use crate::params::{NetworkParams, TargetKind};
use crate::population::PopulationEntry;
use crate::projection::ProjectionEntry;
use crate::rate_model;
use crate::snapshot::{PopulationSnapshot, ProjectionSnapshot, StepSnapshot};
use crate::types::HashMap;
use crate::worker;
use crate::worker::{
    AdvanceContext, AdvancePhaseResult, Command, PhaseContext, ShardSnapshot, SumPhaseResult,
};

pub use crate::worker::Stimulus;

pub fn create_network(params: NetworkParams) -> Result<Network, SimpleError> {
    try_with!(
        params::validate_network_params(&params),
        "invalid network parameters"
    );

    // the history horizon of a population is the largest delay reading it
    let mut max_delays = vec![0usize; params.populations.len()];
    for projection_params in &params.projections {
        let connector_delay = dendrite::max_connector_delay(&projection_params.connector);
        max_delays[projection_params.source] =
            max_delays[projection_params.source].max(connector_delay);
    }

    let mut populations = Vec::with_capacity(params.populations.len());

    for (population_id, population_params) in params.populations.iter().enumerate() {
        let model = rate_model::create(&population_params.model);
        let initial_activity = vec![model.initial_activity(); population_params.neuron_count];

        populations.push(PopulationEntry {
            name: population_params.name.clone(),
            neuron_count: population_params.neuron_count,
            dt: population_params.dt,
            history: ActivityHistory::new(initial_activity, max_delays[population_id]),
            incoming: vec![[None; TargetKind::COUNT]; population_params.neuron_count],
        });
    }

    let mut projections = Vec::with_capacity(params.projections.len());

    for (projection_id, projection_params) in params.projections.iter().enumerate() {
        let (presence, synapse_counts) = dendrite::presence_and_counts(&params, projection_id);

        for (rank, present) in presence.iter().enumerate() {
            if *present {
                populations[projection_params.target].incoming[rank]
                    [projection_params.kind.index()] = Some(projection_id);
            }
        }

        let target_count = presence.len();

        projections.push(ProjectionEntry {
            source: projection_params.source,
            target: projection_params.target,
            kind: projection_params.kind,
            learn_period: projection_params.learn_period,
            learn_phase: projection_params.learn_phase,
            presence,
            synapse_counts,
            sums: Arc::new(vec![0.0; target_count]),
        });
    }

    let mut command_tx = Bus::new(1);
    let (sum_result_tx, sum_result_rx) = mpsc_channel();
    let (advance_result_tx, advance_result_rx) = mpsc_channel();
    let (learn_ack_tx, learn_ack_rx) = mpsc_channel();
    let (snapshot_tx, snapshot_rx) = mpsc_channel();
    let (structure_ack_tx, structure_ack_rx) = mpsc_channel();

    let num_threads = get_num_threads(&params);
    let mut join_handles = Vec::new();

    for thread_id in 0..num_threads {
        let command_rx = command_tx.add_rx();
        let sum_result_tx = sum_result_tx.clone();
        let advance_result_tx = advance_result_tx.clone();
        let learn_ack_tx = learn_ack_tx.clone();
        let snapshot_tx = snapshot_tx.clone();
        let structure_ack_tx = structure_ack_tx.clone();
        let params = params.clone();

        join_handles.push(thread::spawn(move || {
            if params.technical_params.pin_threads {
                let core_id = CoreId { id: thread_id };
                core_affinity::set_for_current(core_id);
            }

            let shard = worker::build_shard(num_threads, thread_id, &params);
            worker::run(
                shard,
                command_rx,
                sum_result_tx,
                advance_result_tx,
                learn_ack_tx,
                snapshot_tx,
                structure_ack_tx,
            );
        }));
    }

    let name_to_id = populations
        .iter()
        .enumerate()
        .map(|(population_id, population)| (population.name.clone(), population_id))
        .collect();

    Ok(Network {
        time: 0,
        populations,
        projections,
        name_to_id,
        command_tx: Some(command_tx),
        sum_result_rx,
        advance_result_rx,
        learn_ack_rx,
        snapshot_rx,
        structure_ack_rx,
        num_workers: num_threads,
        join_handles,
    })
}

fn get_num_threads(params: &NetworkParams) -> usize {
    params
        .technical_params
        .num_threads
        .unwrap_or_else(num_cpus::get)
}

#[derive(Debug, Clone)]
pub struct StepInput {
    pub stimuli: Vec<Stimulus>,
    pub record: bool,
}

static EMPTY_STEP_INPUT: StepInput = StepInput {
    stimuli: Vec::new(),
    record: false,
};

impl StepInput {
    pub fn new() -> Self {
        EMPTY_STEP_INPUT.clone()
    }

    pub fn from_stimuli(stimuli: Vec<Stimulus>) -> Self {
        Self {
            stimuli,
            record: false,
        }
    }

    pub fn reset(&mut self) {
        self.stimuli.clear();
        self.record = false;
    }
}

impl Default for StepInput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct StepResult {
    pub t: u64,
    pub transmission_count: usize,
    pub snapshot: Option<StepSnapshot>,
}

/// The orchestrator: owns the clock, the population/projection registries and
/// the worker pool, and drives the sum -> advance -> learn phase sequence.
/// Structural mutation only happens between steps, through `&mut self`.
pub struct Network {
    time: u64,
    populations: Vec<PopulationEntry>,
    projections: Vec<ProjectionEntry>,
    name_to_id: HashMap<String, usize>,
    command_tx: Option<Bus<Command>>,
    sum_result_rx: MpscReceiver<SumPhaseResult>,
    advance_result_rx: MpscReceiver<AdvancePhaseResult>,
    learn_ack_rx: MpscReceiver<()>,
    snapshot_rx: MpscReceiver<ShardSnapshot>,
    structure_ack_rx: MpscReceiver<()>,
    num_workers: usize,
    join_handles: Vec<JoinHandle<()>>,
}

impl Network {
    /// Advances the clock and runs one full step: sum phase, advance phase,
    /// learn phase, each fanned out to every worker with a collection
    /// barrier in between.
    pub fn step(&mut self, input: &StepInput) -> SimpleResult<StepResult> {
        self.validate_step_input(input)?;

        self.time += 1;
        let t = self.time;

        // sum phase
        let views = self.activity_views();
        self.broadcast(Command::ComputeSums(PhaseContext {
            t,
            activities: views.clone(),
        }));

        let mut assembled_sums: Vec<Vec<f32>> = self
            .projections
            .iter()
            .map(|projection| vec![0.0; projection.presence.len()])
            .collect();
        let mut transmission_count = 0;

        for _ in 0..self.num_workers {
            let result = self.sum_result_rx.recv().unwrap();

            for (projection_id, segment) in result.segments.into_iter().enumerate() {
                transmission_count += segment.transmission_count;
                let target_range = segment.rank_start..segment.rank_start + segment.values.len();
                assembled_sums[projection_id][target_range].copy_from_slice(&segment.values);
            }
        }

        for (projection, sums) in self.projections.iter_mut().zip(assembled_sums) {
            projection.sums = Arc::new(sums);
        }

        // advance phase
        let sums = self
            .projections
            .iter()
            .map(|projection| Arc::clone(&projection.sums))
            .collect();

        self.broadcast(Command::Advance(AdvanceContext {
            activities: views,
            sums,
            stimuli: Arc::new(input.stimuli.clone()),
        }));

        let mut next_activities: Vec<Vec<f32>> = self
            .populations
            .iter()
            .map(|population| vec![0.0; population.neuron_count])
            .collect();

        for _ in 0..self.num_workers {
            let result = self.advance_result_rx.recv().unwrap();

            for (population_id, segment) in result.segments.into_iter().enumerate() {
                let target_range = segment.rank_start..segment.rank_start + segment.activity.len();
                next_activities[population_id][target_range].copy_from_slice(&segment.activity);
            }
        }

        for (population, next_activity) in self.populations.iter_mut().zip(next_activities) {
            population.history.rotate(next_activity);
        }

        // learn phase, reading post-advance activity
        let views = self.activity_views();
        self.broadcast(Command::Learn(PhaseContext {
            t,
            activities: views,
        }));

        for _ in 0..self.num_workers {
            self.learn_ack_rx.recv().unwrap();
        }

        let snapshot = if input.record {
            Some(self.extract_snapshot())
        } else {
            None
        };

        Ok(StepResult {
            t,
            transmission_count,
            snapshot,
        })
    }

    pub fn step_no_input(&mut self) -> StepResult {
        self.step(&EMPTY_STEP_INPUT).unwrap()
    }

    pub fn step_no_input_until(&mut self, t: u64) {
        while self.time() < t {
            self.step_no_input();
        }
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    pub fn name(&self, population: usize) -> &str {
        &self.populations[population].name
    }

    pub fn population_id(&self, name: &str) -> Option<usize> {
        self.name_to_id.get(name).copied()
    }

    pub fn neuron_count(&self, population: usize) -> usize {
        self.populations[population].neuron_count
    }

    pub fn dt(&self, population: usize) -> f32 {
        self.populations[population].dt
    }

    pub fn max_delay(&self, population: usize) -> usize {
        self.populations[population].max_delay()
    }

    pub fn activity(&self, population: usize) -> &[f32] {
        self.populations[population].activity()
    }

    pub fn activity_at(&self, population: usize, delay: usize) -> SimpleResult<&[f32]> {
        self.populations[population].activity_at(delay)
    }

    pub fn activity_at_ranks(
        &self,
        population: usize,
        delays: &[usize],
        ranks: &[usize],
    ) -> SimpleResult<Vec<f32>> {
        self.populations[population].activity_at_ranks(delays, ranks)
    }

    pub fn set_max_delay(&mut self, population: usize, delay: usize) {
        self.populations[population].set_max_delay(delay);
    }

    pub fn projection_source(&self, projection: usize) -> usize {
        self.projections[projection].source
    }

    pub fn projection_target(&self, projection: usize) -> usize {
        self.projections[projection].target
    }

    pub fn projection_kind(&self, projection: usize) -> TargetKind {
        self.projections[projection].kind
    }

    pub fn learn_period(&self, projection: usize) -> u64 {
        self.projections[projection].learn_period
    }

    pub fn learn_phase(&self, projection: usize) -> u64 {
        self.projections[projection].learn_phase
    }

    pub fn sum(&self, projection: usize, rank: usize) -> f32 {
        self.projections[projection].sum(rank)
    }

    pub fn has_dendrite(&self, projection: usize, rank: usize) -> bool {
        self.projections[projection].has_dendrite(rank)
    }

    pub fn synapse_count(&self, projection: usize, rank: usize) -> usize {
        self.projections[projection].synapse_count(rank)
    }

    /// Structural removal of one dendrite. Only callable between steps;
    /// removing an absent entry is fatal.
    pub fn remove_dendrite(&mut self, projection: usize, rank: usize) {
        self.projections[projection].remove_dendrite_entry(rank);

        let target = self.projections[projection].target;
        let kind_index = self.projections[projection].kind.index();
        self.populations[target].incoming[rank][kind_index] = None;

        self.broadcast(Command::RemoveDendrite {
            projection_id: projection,
            rank,
        });

        for _ in 0..self.num_workers {
            self.structure_ack_rx.recv().unwrap();
        }
    }

    fn activity_views(&self) -> Vec<ActivityView> {
        self.populations
            .iter()
            .map(|population| population.history.view())
            .collect()
    }

    fn broadcast(&mut self, command: Command) {
        self.command_tx.as_mut().unwrap().broadcast(command);
    }

    fn extract_snapshot(&mut self) -> StepSnapshot {
        self.broadcast(Command::ExtractSnapshot);

        let mut dendrites_by_projection: Vec<Vec<_>> = self
            .projections
            .iter()
            .map(|_| Vec::new())
            .collect();

        for _ in 0..self.num_workers {
            let shard_snapshot = self.snapshot_rx.recv().unwrap();

            for state in shard_snapshot.dendrites {
                dendrites_by_projection[state.projection_id].push(state.dendrite);
            }
        }

        let projection_states = self
            .projections
            .iter()
            .zip(dendrites_by_projection)
            .map(|(projection, dendrites)| ProjectionSnapshot {
                sums: projection.sums.as_ref().clone(),
                dendrites: dendrites
                    .into_iter()
                    .sorted_by_key(|dendrite| dendrite.post_rank)
                    .collect(),
            })
            .collect();

        let population_states = self
            .populations
            .iter()
            .map(|population| PopulationSnapshot {
                name: population.name.clone(),
                activity: population.activity().to_vec(),
            })
            .collect();

        StepSnapshot {
            population_states,
            projection_states,
        }
    }

    fn validate_step_input(&self, input: &StepInput) -> SimpleResult<()> {
        for stimulus in &input.stimuli {
            if stimulus.population >= self.populations.len() {
                return Err(SimpleError::new(format!(
                    "Invalid population id in stimulus: {}",
                    stimulus.population
                )));
            }

            if stimulus.rank >= self.populations[stimulus.population].neuron_count {
                return Err(SimpleError::new(format!(
                    "Invalid neuron rank in stimulus: {}",
                    stimulus.rank
                )));
            }
        }

        Ok(())
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        drop(self.command_tx.take()); // signals the worker threads to exit the loop

        self.join_handles.drain(..).for_each(|join_handle| {
            join_handle.join().ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PopulationParams;

    #[test]
    fn empty_network() {
        let mut network = create_network(NetworkParams::default()).unwrap();

        assert_eq!(network.time(), 0);
        assert_eq!(network.population_count(), 0);

        let result = network.step_no_input();
        assert_eq!(result.t, 1);
        assert_eq!(result.transmission_count, 0);
        assert_eq!(network.time(), 1);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut params = NetworkParams::default();
        params.populations.push(PopulationParams {
            name: "pop".to_string(),
            dt: 0.0,
            ..PopulationParams::default()
        });

        let result = create_network(params);
        assert!(result.is_err());
        assert_eq!(
            result.err().unwrap().as_str(),
            "invalid network parameters, dt must be strictly positive"
        );
    }

    #[test]
    fn invalid_step_input() {
        let mut params = NetworkParams::default();
        params.populations.push(PopulationParams {
            name: "pop".to_string(),
            neuron_count: 2,
            ..PopulationParams::default()
        });

        let mut network = create_network(params).unwrap();

        let input = StepInput::from_stimuli(vec![Stimulus {
            population: 1,
            rank: 0,
            amount: 1.0,
        }]);
        let result = network.step(&input);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().as_str(),
            "Invalid population id in stimulus: 1"
        );

        let input = StepInput::from_stimuli(vec![Stimulus {
            population: 0,
            rank: 2,
            amount: 1.0,
        }]);
        let result = network.step(&input);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().as_str(),
            "Invalid neuron rank in stimulus: 2"
        );

        // a rejected step does not advance the clock
        assert_eq!(network.time(), 0);
    }

    #[test]
    fn name_lookup() {
        let mut params = NetworkParams::default();
        params.populations.push(PopulationParams {
            name: "sensory".to_string(),
            ..PopulationParams::default()
        });

        let network = create_network(params).unwrap();

        assert_eq!(network.name(0), "sensory");
        assert_eq!(network.population_id("sensory"), Some(0));
        assert_eq!(network.population_id("motor"), None);
    }
}
