pub mod scenario;
pub mod util;

pub use scenario::{TestScenario, get_scenario, list_scenarios};
pub use util::split_csv;
