//! cvrp-planner core
//!
//! Capacitated vehicle routing over a precomputed distance matrix: input
//! validation, region clustering, normalization, solving, route
//! post-processing and what-if scenarios.

pub mod traits;
pub mod error;
pub mod matrix;
pub mod validator;
pub mod cluster;
pub mod normalizer;
pub mod solver;
pub mod heuristics;
pub mod pipeline;
pub mod scenario;

pub use error::Diagnostic;
pub use pipeline::{PlannerOptions, plan};
pub use scenario::{BaseScenario, ScenarioId, ScenarioOverride, run_scenarios};
pub use solver::{Solution, SolveOptions};
