pub mod ease;
pub mod orchestrator;
pub mod typed;
