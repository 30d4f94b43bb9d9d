use simple_error::{SimpleError, SimpleResult};

use crate::activity_history::ActivityHistory;
use crate::params::TargetKind;

/// Orchestrator-side record of one population: activity with its delay
/// history, and the incoming table mapping (rank, target kind) to the
/// projection feeding that neuron.
pub struct PopulationEntry {
    pub name: String,
    pub neuron_count: usize,
    pub dt: f32,
    pub history: ActivityHistory,
    pub incoming: Vec<[Option<usize>; TargetKind::COUNT]>,
}

impl PopulationEntry {
    pub fn activity(&self) -> &[f32] {
        self.history.current()
    }

    pub fn activity_at(&self, delay: usize) -> SimpleResult<&[f32]> {
        self.history.at(delay).ok_or_else(|| {
            SimpleError::new(format!(
                "delay {} exceeds max delay {} of population {}",
                delay,
                self.history.max_delay(),
                self.name
            ))
        })
    }

    /// Gathers one value per (delay, rank) pair. Fails as a whole on a
    /// length mismatch or any out-of-range pair.
    pub fn activity_at_ranks(&self, delays: &[usize], ranks: &[usize]) -> SimpleResult<Vec<f32>> {
        if delays.len() != ranks.len() {
            return Err(SimpleError::new("delays and ranks must have equal length"));
        }

        delays
            .iter()
            .zip(ranks)
            .map(|(delay, rank)| {
                let activity = self.activity_at(*delay)?;

                activity.get(*rank).copied().ok_or_else(|| {
                    SimpleError::new(format!(
                        "rank {} out of range for population {}",
                        rank, self.name
                    ))
                })
            })
            .collect()
    }

    pub fn set_max_delay(&mut self, max_delay: usize) {
        self.history.grow(max_delay);
    }

    pub fn max_delay(&self) -> usize {
        self.history.max_delay()
    }
}
