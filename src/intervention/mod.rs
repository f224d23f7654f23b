pub mod catalog;
pub mod coordinator;

pub use catalog::{find_intervention, random_intervention, Intervention, INTERVENTIONS};
pub use coordinator::{ActiveBreak, BreakOutcome, InterventionCoordinator};
