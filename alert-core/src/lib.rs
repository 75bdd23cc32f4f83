pub mod audit;
pub mod engine;
pub mod evaluator;
pub mod metrics;
pub mod state_store;
