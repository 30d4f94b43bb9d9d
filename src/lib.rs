pub mod network;
pub mod params;
pub mod snapshot;

mod activity_history;
mod dendrite;
mod learning;
mod population;
mod projection;
mod rate_model;
mod types;
mod util;
mod worker;
