use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded history of a population's activity. Slot `d - 1` of `past` holds
/// the activity from `d` steps ago; the length of `past` is the population's
/// maximum conduction delay.
#[derive(Debug, Clone)]
pub struct ActivityHistory {
    current: Arc<Vec<f32>>,
    past: VecDeque<Arc<Vec<f32>>>,
}

/// Cheap read-only handle on a history, shared with the worker threads for
/// the duration of a phase.
#[derive(Debug, Clone)]
pub struct ActivityView {
    pub current: Arc<Vec<f32>>,
    past: Vec<Arc<Vec<f32>>>,
}

impl ActivityHistory {
    pub fn new(initial_activity: Vec<f32>, max_delay: usize) -> Self {
        let zero_slab = Arc::new(vec![0.0; initial_activity.len()]);
        let past = (0..max_delay).map(|_| Arc::clone(&zero_slab)).collect();

        Self {
            current: Arc::new(initial_activity),
            past,
        }
    }

    pub fn max_delay(&self) -> usize {
        self.past.len()
    }

    pub fn current(&self) -> &[f32] {
        &self.current
    }

    /// Activity `delay` steps ago, or `None` beyond the history horizon.
    pub fn at(&self, delay: usize) -> Option<&[f32]> {
        if delay == 0 {
            Some(&self.current)
        } else {
            self.past.get(delay - 1).map(|slab| slab.as_slice())
        }
    }

    /// Makes `next_activity` current and pushes the superseded activity into
    /// slot 1; the oldest slot falls off the horizon.
    pub fn rotate(&mut self, next_activity: Vec<f32>) {
        let superseded = std::mem::replace(&mut self.current, Arc::new(next_activity));

        let max_delay = self.past.len();
        if max_delay > 0 {
            self.past.push_front(superseded);
            self.past.truncate(max_delay);
        }
    }

    /// Grow-only: extends the horizon with zero-filled slots at the old end.
    /// Already recorded slots keep their position and contents.
    pub fn grow(&mut self, new_max_delay: usize) {
        let num_neurons = self.current.len();

        while self.past.len() < new_max_delay {
            self.past.push_back(Arc::new(vec![0.0; num_neurons]));
        }
    }

    pub fn view(&self) -> ActivityView {
        ActivityView {
            current: Arc::clone(&self.current),
            past: self.past.iter().cloned().collect(),
        }
    }
}

impl ActivityView {
    /// Value of one neuron `delay` steps ago, or `None` if the delay is
    /// beyond the horizon or the rank out of range.
    pub fn at(&self, rank: usize, delay: usize) -> Option<f32> {
        let slab = if delay == 0 {
            &self.current
        } else {
            self.past.get(delay - 1)?
        };

        slab.get(rank).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_util::assert_approx_eq_slice;

    #[test]
    fn fresh_history_is_zero_filled() {
        let history = ActivityHistory::new(vec![0.5, 1.5], 3);

        assert_eq!(history.max_delay(), 3);
        assert_approx_eq_slice(history.current(), &[0.5, 1.5]);

        for delay in 1..=3 {
            assert_approx_eq_slice(history.at(delay).unwrap(), &[0.0, 0.0]);
        }

        assert!(history.at(4).is_none());
    }

    #[test]
    fn rotation_shifts_slots() {
        let mut history = ActivityHistory::new(vec![1.0], 2);

        history.rotate(vec![2.0]);
        history.rotate(vec![3.0]);

        assert_approx_eq_slice(history.current(), &[3.0]);
        assert_approx_eq_slice(history.at(1).unwrap(), &[2.0]);
        assert_approx_eq_slice(history.at(2).unwrap(), &[1.0]);

        history.rotate(vec![4.0]);

        assert_approx_eq_slice(history.current(), &[4.0]);
        assert_approx_eq_slice(history.at(1).unwrap(), &[3.0]);
        assert_approx_eq_slice(history.at(2).unwrap(), &[2.0]);
        assert_eq!(history.max_delay(), 2);
    }

    #[test]
    fn zero_horizon_discards_superseded_activity() {
        let mut history = ActivityHistory::new(vec![1.0], 0);

        history.rotate(vec![2.0]);

        assert_approx_eq_slice(history.current(), &[2.0]);
        assert!(history.at(1).is_none());
    }

    #[test]
    fn growth_preserves_recorded_slots() {
        let mut history = ActivityHistory::new(vec![1.0], 1);
        history.rotate(vec![2.0]);

        history.grow(3);

        assert_eq!(history.max_delay(), 3);
        assert_approx_eq_slice(history.at(1).unwrap(), &[1.0]);
        assert_approx_eq_slice(history.at(2).unwrap(), &[0.0]);
        assert_approx_eq_slice(history.at(3).unwrap(), &[0.0]);

        // growth never shrinks
        history.grow(2);
        assert_eq!(history.max_delay(), 3);
    }

    #[test]
    fn view_reads_match_history() {
        let mut history = ActivityHistory::new(vec![1.0, 10.0], 2);
        history.rotate(vec![2.0, 20.0]);

        let view = history.view();

        assert_eq!(view.at(0, 0), Some(2.0));
        assert_eq!(view.at(1, 0), Some(20.0));
        assert_eq!(view.at(0, 1), Some(1.0));
        assert_eq!(view.at(1, 2), Some(0.0));
        assert_eq!(view.at(0, 3), None);
        assert_eq!(view.at(2, 0), None);

        // views are snapshots, later rotations do not show through
        history.rotate(vec![3.0, 30.0]);
        assert_eq!(view.at(0, 0), Some(2.0));
    }
}
