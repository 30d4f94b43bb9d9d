use std::sync::Arc;

use log::warn;

use crate::params::TargetKind;

/// Orchestrator-side record of one projection: structural mirrors for the
/// driver queries plus the sums assembled at the last sum phase. The
/// dendrites themselves live in the worker shards.
pub struct ProjectionEntry {
    pub source: usize,
    pub target: usize,
    pub kind: TargetKind,
    pub learn_period: u64,
    pub learn_phase: u64,
    pub presence: Vec<bool>,
    pub synapse_counts: Vec<usize>,
    pub sums: Arc<Vec<f32>>,
}

impl ProjectionEntry {
    /// Last computed sum for a postsynaptic rank. Absent ranks read 0.0;
    /// out-of-range ranks are reported and read 0.0 as well.
    pub fn sum(&self, rank: usize) -> f32 {
        match self.sums.get(rank) {
            Some(sum) => *sum,
            None => {
                warn!("rank {} out of range in sum query, substituting 0.0", rank);
                0.0
            }
        }
    }

    pub fn has_dendrite(&self, rank: usize) -> bool {
        self.presence.get(rank).copied().unwrap_or(false)
    }

    /// Precondition: the entry at `rank` is present. Querying an absent or
    /// out-of-range rank is a caller bug.
    pub fn synapse_count(&self, rank: usize) -> usize {
        assert!(
            self.has_dendrite(rank),
            "synapse count queried for absent dendrite at rank {}",
            rank
        );

        self.synapse_counts[rank]
    }

    pub fn remove_dendrite_entry(&mut self, rank: usize) {
        assert!(
            self.has_dendrite(rank),
            "dendrite removal requested for absent entry at rank {}",
            rank
        );

        self.presence[rank] = false;
        self.synapse_counts[rank] = 0;
        Arc::make_mut(&mut self.sums)[rank] = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn make_entry() -> ProjectionEntry {
        ProjectionEntry {
            source: 0,
            target: 1,
            kind: TargetKind::Excitatory,
            learn_period: 1,
            learn_phase: 0,
            presence: vec![true, false],
            synapse_counts: vec![3, 0],
            sums: Arc::new(vec![0.4, 0.0]),
        }
    }

    #[test]
    fn sum_fallbacks() {
        let entry = make_entry();

        assert_approx_eq!(f32, entry.sum(0), 0.4);
        assert_approx_eq!(f32, entry.sum(1), 0.0);
        assert_approx_eq!(f32, entry.sum(17), 0.0);
    }

    #[test]
    fn presence() {
        let entry = make_entry();

        assert!(entry.has_dendrite(0));
        assert!(!entry.has_dendrite(1));
        assert!(!entry.has_dendrite(17));
    }

    #[test]
    fn synapse_count_present() {
        let entry = make_entry();
        assert_eq!(entry.synapse_count(0), 3);
    }

    #[test]
    #[should_panic(expected = "absent dendrite at rank 1")]
    fn synapse_count_absent_is_fatal() {
        let entry = make_entry();
        entry.synapse_count(1);
    }

    #[test]
    fn removal_clears_mirrors() {
        let mut entry = make_entry();
        entry.remove_dendrite_entry(0);

        assert!(!entry.has_dendrite(0));
        assert_approx_eq!(f32, entry.sum(0), 0.0);
    }

    #[test]
    #[should_panic(expected = "absent entry at rank 1")]
    fn removal_of_absent_entry_is_fatal() {
        let mut entry = make_entry();
        entry.remove_dendrite_entry(1);
    }
}
