use std::time::Instant;

use popnet::network::{self, StepInput, Stimulus};
use rand::{
    distributions::Uniform, prelude::Distribution, rngs::StdRng, seq::SliceRandom, SeedableRng,
};
use statrs::distribution::Poisson;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    let mut network = network::create_network(scenario_params::get_scenario_params()).unwrap();

    let all_ranks: Vec<usize> = (0..800).collect();
    let mut rng = StdRng::seed_from_u64(0);
    let amount_dist = Uniform::new(0.0, 0.5);
    let num_stimuli_dist = Poisson::new(5.0).unwrap();

    let mut transmission_count = 0usize;
    let mut checksum = 0.0f64;
    let t_stop = 10000;

    let mut step_input = StepInput::new();

    let wall_start = Instant::now();

    for _ in 0..t_stop {
        let num_stimuli = num_stimuli_dist.sample(&mut rng) as usize;

        step_input.reset();
        step_input.stimuli = all_ranks
            .choose_multiple(&mut rng, num_stimuli)
            .map(|rank| Stimulus {
                population: 0,
                rank: *rank,
                amount: amount_dist.sample(&mut rng),
            })
            .collect();

        let step_result = network.step(&step_input).unwrap();
        transmission_count += step_result.transmission_count;
    }

    for population in 0..network.population_count() {
        checksum += network
            .activity(population)
            .iter()
            .map(|activity| *activity as f64)
            .sum::<f64>();
    }

    let wall_time = wall_start.elapsed();
    let steps_per_second = t_stop as f64 / wall_time.as_secs_f64();
    let transmission_throughput = transmission_count as f64 / wall_time.as_secs_f64();

    eprintln!("Steps per second: {:.1}", steps_per_second);
    eprintln!(
        "Synaptic transmission throughput: {:.3e} ({:.3} ns per transmission)",
        transmission_throughput,
        1e9 / transmission_throughput
    );
    eprintln!("Activity checksum: {}", checksum);
}
