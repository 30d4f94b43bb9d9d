use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

pub fn rank_range(num_threads: usize, thread_id: usize, num_ranks: usize) -> Range<usize> {
    let start = num_ranks * thread_id / num_threads;
    let end = num_ranks * (thread_id + 1) / num_threads;
    Range { start, end }
}

pub fn learning_due(t: u64, learn_period: u64, learn_phase: u64) -> bool {
    t % learn_period == learn_phase
}

pub fn stable_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
