use popnet::network::{self, StepInput, Stimulus};
use rand::{prelude::Distribution, rngs::StdRng, seq::SliceRandom, SeedableRng};
use statrs::distribution::Poisson;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    let mut network = network::create_network(scenario_params::get_scenario_params()).unwrap();

    let all_ranks: Vec<usize> = (0..800).collect();
    let mut rng = StdRng::seed_from_u64(0);
    let num_stimuli_dist = Poisson::new(10.0).unwrap();

    let mut transmission_count = 0usize;
    let mut activity_checksum = 0.0f64;
    let t_stop = 1000;

    let mut step_input = StepInput::new();

    for _ in 0..t_stop {
        let num_stimuli = num_stimuli_dist.sample(&mut rng) as usize;

        step_input.reset();
        step_input.stimuli = all_ranks
            .choose_multiple(&mut rng, num_stimuli)
            .map(|rank| Stimulus {
                population: 0,
                rank: *rank,
                amount: 0.2,
            })
            .collect();

        let step_result = network.step(&step_input).unwrap();
        transmission_count += step_result.transmission_count;

        for population in 0..network.population_count() {
            for (rank, activity) in network.activity(population).iter().enumerate() {
                activity_checksum += step_result.t as f64 * (rank + 1) as f64 * *activity as f64;
            }
        }
    }

    println!("batch result:");
    println!("...activity checksum: {}", activity_checksum);
    println!("...synaptic transmission count: {}", transmission_count);

    step_input.reset();
    step_input.record = true;

    let step_result = network.step(&step_input).unwrap();
    let snapshot = step_result.snapshot.unwrap();

    let mut weight_checksum = 0.0f64;

    for projection_state in &snapshot.projection_states {
        for dendrite in &projection_state.dendrites {
            for synapse in &dendrite.synapses {
                weight_checksum += (synapse.source_rank + 1) as f64
                    * (dendrite.post_rank + 1) as f64
                    * (synapse.delay + 1) as f64
                    * synapse.weight as f64;
            }
        }
    }

    println!("single result:");
    println!("...weight checksum: {}", weight_checksum);
    println!(
        "...synaptic transmission count: {}",
        step_result.transmission_count
    );
    println!("{}", serde_json::to_string(&snapshot).unwrap());
}
