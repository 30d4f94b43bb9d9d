use std::ops::Range;
use std::sync::mpsc::Sender as MpscSender;
use std::sync::Arc;

use bus::BusReader;
use log::debug;

use crate::activity_history::ActivityView;
use crate::dendrite::{self, Dendrite};
use crate::learning::{self, GlobalRule, LocalRule};
use crate::params::{NetworkParams, TargetKind, WeightBounds};
use crate::rate_model::{self, RateModel};
use crate::snapshot::{DendriteSnapshot, SynapseSnapshot};
use crate::util;

/// Phase command broadcast to every worker. The orchestrator collecting one
/// reply per worker is the barrier between phases.
#[derive(Debug, Clone)]
pub enum Command {
    ComputeSums(PhaseContext),
    Advance(AdvanceContext),
    Learn(PhaseContext),
    ExtractSnapshot,
    RemoveDendrite { projection_id: usize, rank: usize },
}

/// Immutable per-phase inputs: the clock is copied by value, activity is
/// shared as `Arc` snapshots, so a worker can never observe a mid-phase
/// mutation.
#[derive(Debug, Clone)]
pub struct PhaseContext {
    pub t: u64,
    pub activities: Vec<ActivityView>,
}

#[derive(Debug, Clone)]
pub struct AdvanceContext {
    pub activities: Vec<ActivityView>,
    pub sums: Vec<Arc<Vec<f32>>>,
    pub stimuli: Arc<Vec<Stimulus>>,
}

/// Additive external input on one neuron for one step.
#[derive(Debug, Clone)]
pub struct Stimulus {
    pub population: usize,
    pub rank: usize,
    pub amount: f32,
}

/// One sum segment per projection, in registration order.
pub struct SumPhaseResult {
    pub segments: Vec<SumSegment>,
}

pub struct SumSegment {
    pub rank_start: usize,
    pub values: Vec<f32>,
    pub transmission_count: usize,
}

/// One activity segment per population, in registration order.
pub struct AdvancePhaseResult {
    pub segments: Vec<ActivitySegment>,
}

pub struct ActivitySegment {
    pub rank_start: usize,
    pub activity: Vec<f32>,
}

pub struct ShardSnapshot {
    pub dendrites: Vec<ShardDendriteState>,
}

pub struct ShardDendriteState {
    pub projection_id: usize,
    pub dendrite: DendriteSnapshot,
}

/// One worker's confined slice of the network: a contiguous rank range per
/// population and the dendrites whose postsynaptic rank falls in it. Weights
/// are only ever written by the owning worker.
pub struct Shard {
    populations: Vec<ShardPopulation>,
    projections: Vec<ShardProjection>,
}

struct ShardPopulation {
    rank_range: Range<usize>,
    dt: f32,
    model: Box<dyn RateModel + Send>,
    // indexed by local rank, then target kind
    incoming: Vec<[Option<usize>; TargetKind::COUNT]>,
}

struct ShardProjection {
    source: usize,
    target: usize,
    kind: TargetKind,
    rank_start: usize,
    dendrites: Vec<Option<Dendrite>>,
    learn_period: u64,
    learn_phase: u64,
    local_rule: Box<dyn LocalRule + Send>,
    global_rule: Box<dyn GlobalRule + Send>,
    weight_bounds: WeightBounds,
}

pub fn build_shard(num_threads: usize, thread_id: usize, params: &NetworkParams) -> Shard {
    let seed = params.technical_params.seed_override.unwrap_or(0);

    let mut projections = Vec::with_capacity(params.projections.len());

    for (projection_id, projection_params) in params.projections.iter().enumerate() {
        let source_count = params.populations[projection_params.source].neuron_count;
        let target_count = params.populations[projection_params.target].neuron_count;
        let rank_range = util::rank_range(num_threads, thread_id, target_count);

        let dendrites = rank_range
            .clone()
            .map(|post_rank| {
                dendrite::build_dendrite(
                    projection_params,
                    projection_id,
                    post_rank,
                    source_count,
                    seed,
                )
            })
            .collect();

        projections.push(ShardProjection {
            source: projection_params.source,
            target: projection_params.target,
            kind: projection_params.kind,
            rank_start: rank_range.start,
            dendrites,
            learn_period: projection_params.learn_period,
            learn_phase: projection_params.learn_phase,
            local_rule: learning::create_local(&projection_params.local_rule),
            global_rule: learning::create_global(&projection_params.global_rule),
            weight_bounds: projection_params.weight_bounds,
        });
    }

    let mut populations = Vec::with_capacity(params.populations.len());

    for (population_id, population_params) in params.populations.iter().enumerate() {
        let rank_range = util::rank_range(num_threads, thread_id, population_params.neuron_count);
        let mut incoming = vec![[None; TargetKind::COUNT]; rank_range.len()];

        for (projection_id, projection) in projections.iter().enumerate() {
            if projection.target != population_id {
                continue;
            }

            for (local_rank, dendrite) in projection.dendrites.iter().enumerate() {
                if dendrite.is_some() {
                    incoming[local_rank][projection.kind.index()] = Some(projection_id);
                }
            }
        }

        populations.push(ShardPopulation {
            rank_range,
            dt: population_params.dt,
            model: rate_model::create(&population_params.model),
            incoming,
        });
    }

    Shard {
        populations,
        projections,
    }
}

pub fn run(
    mut shard: Shard,
    mut command_rx: BusReader<Command>,
    sum_result_tx: MpscSender<SumPhaseResult>,
    advance_result_tx: MpscSender<AdvancePhaseResult>,
    learn_ack_tx: MpscSender<()>,
    snapshot_tx: MpscSender<ShardSnapshot>,
    structure_ack_tx: MpscSender<()>,
) {
    while let Ok(command) = command_rx.recv() {
        match command {
            Command::ComputeSums(ctx) => {
                sum_result_tx.send(shard.compute_sums(&ctx)).unwrap();
            }
            Command::Advance(ctx) => {
                advance_result_tx.send(shard.advance(&ctx)).unwrap();
            }
            Command::Learn(ctx) => {
                shard.learn(&ctx);
                learn_ack_tx.send(()).unwrap();
            }
            Command::ExtractSnapshot => {
                snapshot_tx.send(shard.extract_snapshot()).unwrap();
            }
            Command::RemoveDendrite {
                projection_id,
                rank,
            } => {
                shard.remove_dendrite(projection_id, rank);
                structure_ack_tx.send(()).unwrap();
            }
        }
    }

    debug!("worker exiting");
}

impl Shard {
    fn compute_sums(&self, ctx: &PhaseContext) -> SumPhaseResult {
        let mut segments = Vec::with_capacity(self.projections.len());

        for projection in &self.projections {
            let source_activity = &ctx.activities[projection.source];
            let mut values = vec![0.0; projection.dendrites.len()];
            let mut transmission_count = 0;

            for (local_rank, dendrite) in projection.dendrites.iter().enumerate() {
                if let Some(dendrite) = dendrite {
                    values[local_rank] = dendrite.compute_sum(source_activity);
                    transmission_count += dendrite.synapse_count();
                }
            }

            segments.push(SumSegment {
                rank_start: projection.rank_start,
                values,
                transmission_count,
            });
        }

        SumPhaseResult { segments }
    }

    fn advance(&self, ctx: &AdvanceContext) -> AdvancePhaseResult {
        let mut segments = Vec::with_capacity(self.populations.len());

        for (population_id, population) in self.populations.iter().enumerate() {
            let view = &ctx.activities[population_id];
            let rank_range = population.rank_range.clone();

            let mut stimulus_amounts = vec![0.0f32; rank_range.len()];
            for stimulus in ctx.stimuli.iter() {
                if stimulus.population == population_id && rank_range.contains(&stimulus.rank) {
                    stimulus_amounts[stimulus.rank - rank_range.start] += stimulus.amount;
                }
            }

            let mut activity = Vec::with_capacity(rank_range.len());

            for (local_rank, rank) in rank_range.enumerate() {
                let mut kind_sums = [0.0f32; TargetKind::COUNT];

                for (kind_index, projection_id) in
                    population.incoming[local_rank].iter().enumerate()
                {
                    if let Some(projection_id) = projection_id {
                        kind_sums[kind_index] = ctx.sums[*projection_id][rank];
                    }
                }

                let input = population.model.total_input(
                    kind_sums[TargetKind::Excitatory.index()],
                    kind_sums[TargetKind::Inhibitory.index()],
                ) + stimulus_amounts[local_rank];

                activity.push(
                    population
                        .model
                        .advance(view.current[rank], input, population.dt),
                );
            }

            segments.push(ActivitySegment {
                rank_start: population.rank_range.start,
                activity,
            });
        }

        AdvancePhaseResult { segments }
    }

    /// Gated local-then-global learning over the shard's dendrites. Runs
    /// after the advance barrier, so the post activity and the delayed pre
    /// reads are in post-rotation coordinates.
    fn learn(&mut self, ctx: &PhaseContext) {
        for projection in &mut self.projections {
            if !util::learning_due(ctx.t, projection.learn_period, projection.learn_phase) {
                continue;
            }

            let source_activity = &ctx.activities[projection.source];
            let target_activity = &ctx.activities[projection.target];

            for (local_rank, dendrite) in projection.dendrites.iter_mut().enumerate() {
                if let Some(dendrite) = dendrite {
                    let post_activity = target_activity.current[projection.rank_start + local_rank];

                    dendrite.local_learn(
                        projection.local_rule.as_ref(),
                        source_activity,
                        post_activity,
                        &projection.weight_bounds,
                    );
                    dendrite.global_learn(
                        projection.global_rule.as_ref(),
                        &projection.weight_bounds,
                    );
                }
            }
        }
    }

    fn extract_snapshot(&self) -> ShardSnapshot {
        let mut dendrites = Vec::new();

        for (projection_id, projection) in self.projections.iter().enumerate() {
            for (local_rank, dendrite) in projection.dendrites.iter().enumerate() {
                if let Some(dendrite) = dendrite {
                    dendrites.push(ShardDendriteState {
                        projection_id,
                        dendrite: DendriteSnapshot {
                            post_rank: projection.rank_start + local_rank,
                            synapses: dendrite
                                .synapses
                                .iter()
                                .map(|synapse| SynapseSnapshot {
                                    source_rank: synapse.source_rank,
                                    delay: synapse.delay,
                                    weight: synapse.weight,
                                })
                                .collect(),
                        },
                    });
                }
            }
        }

        ShardSnapshot { dendrites }
    }

    fn remove_dendrite(&mut self, projection_id: usize, rank: usize) {
        let projection = &mut self.projections[projection_id];
        let rank_range =
            projection.rank_start..projection.rank_start + projection.dendrites.len();

        if !rank_range.contains(&rank) {
            return;
        }

        let local_rank = rank - projection.rank_start;
        projection.dendrites[local_rank] = None;

        let target = projection.target;
        let kind_index = projection.kind.index();
        self.populations[target].incoming[local_rank][kind_index] = None;
    }
}
