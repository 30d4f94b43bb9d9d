use popnet::params::NetworkParams;

pub fn get_scenario_params() -> NetworkParams {
    let params_yaml_str = r#"
populations:
- name: excitatory
  neuron_count: 800
  dt: 1.0
  model: !LeakyIntegrator
    tau: 10.0
    baseline: 0.05
    floor: 0.0
- name: inhibitory
  neuron_count: 200
  dt: 1.0
  model: !LeakyIntegrator
    tau: 4.0
    baseline: 0.0
    floor: 0.0
projections:
- source: 0
  target: 0
  kind: Excitatory
  connector: !AllToAll
    weight: !Randomized 0.002
    delay: 1
    allow_self_connection: false
  learn_period: 1
  learn_phase: 0
  local_rule: None
  global_rule: None
  weight_bounds:
    min_weight: 0.0
    max_weight: 0.01
- source: 0
  target: 1
  kind: Excitatory
  connector: !AllToAll
    weight: !Randomized 0.005
    delay: 2
    allow_self_connection: true
  learn_period: 10
  learn_phase: 0
  local_rule: !Hebbian
    learning_rate: 0.0001
  global_rule: !Normalize
    target: 2.0
  weight_bounds:
    min_weight: 0.0
    max_weight: 0.02
- source: 1
  target: 0
  kind: Inhibitory
  connector: !AllToAll
    weight: !Constant 0.004
    delay: 1
    allow_self_connection: true
  learn_period: 1
  learn_phase: 0
  local_rule: None
  global_rule: None
  weight_bounds:
    min_weight: 0.0
    max_weight: 0.01
- source: 1
  target: 1
  kind: Inhibitory
  connector: !AllToAll
    weight: !Constant 0.004
    delay: 1
    allow_self_connection: false
  learn_period: 1
  learn_phase: 0
  local_rule: None
  global_rule: None
  weight_bounds:
    min_weight: 0.0
    max_weight: 0.01
technical_params:
  num_threads: 1
  pin_threads: false
  seed_override: 0
"#;

    serde_yaml::from_str(params_yaml_str).unwrap()
}
