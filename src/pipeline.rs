//! Single-scenario planning chain.
//!
//! Validator → normalizer → aggregate capacity gate → solver →
//! optional post-processing. Region labels are computed alongside when asked.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cluster::region_labels;
use crate::error::Diagnostic;
use crate::heuristics::{self, Heuristic, HeuristicConfig, RouteContext};
use crate::matrix::DistanceMatrix;
use crate::normalizer::normalize;
use crate::solver::{CvrpInstance, SolveOptions, Solution, solve};
use crate::traits::{FleetField, Order, OrderField, Vehicle};
use crate::validator::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// Percentage applied to every vehicle capacity, clamped to 0..=120.
    pub capacity_adjust_pct: f64,
    pub solve: SolveOptions,
    /// Post-processing pass run on solved routes; none when unset.
    pub post_processing: Option<HeuristicConfig>,
    /// Target region count for clustering orders; no clustering when unset.
    pub cluster_count: Option<usize>,
    pub required_order_fields: Vec<OrderField>,
    pub required_fleet_fields: Vec<FleetField>,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            capacity_adjust_pct: 100.0,
            solve: SolveOptions::default(),
            post_processing: None,
            cluster_count: None,
            required_order_fields: vec![OrderField::Demand],
            required_fleet_fields: vec![FleetField::Capacity],
        }
    }
}

/// Plans routes for `orders` over `fleet`.
///
/// `matrix` row/column 0 is the depot; row `i + 1` is `orders[i]`.
pub fn plan<O, V>(
    orders: &[O],
    fleet: &[V],
    matrix: &[Vec<f64>],
    options: &PlannerOptions,
) -> Result<Solution, Diagnostic>
where
    O: Order,
    V: Vehicle,
{
    validate(
        orders,
        &options.required_order_fields,
        fleet,
        &options.required_fleet_fields,
        matrix,
        Some(orders.len() + 1),
    )
    .inspect_err(|diagnostic| warn!(code = diagnostic.code(), "{}", diagnostic))?;

    let distances = DistanceMatrix::from_rows(matrix)?;
    let regions = options.cluster_count.map(|count| region_labels(orders, count));

    let problem = normalize(orders, fleet, options.capacity_adjust_pct);
    problem
        .check_capacity()
        .inspect_err(|diagnostic| warn!(code = diagnostic.code(), "{}", diagnostic))?;
    debug!(
        total_demand = problem.total_demand(),
        total_capacity = problem.total_capacity(),
        "problem normalized"
    );

    let instance = CvrpInstance::new(&distances, &problem.demands, &problem.capacities);
    let mut solution = solve(instance, &options.solve)?;

    if let Some(config) = &options.post_processing {
        let context = RouteContext {
            matrix: &distances,
            demands: &problem.demands,
            capacities: &problem.capacities,
            depot: instance.depot,
        };
        let heuristic = Heuristic::from(config);
        let sequences = heuristics::apply(&heuristic, heuristics::sequences_of(&solution), &context);
        let elapsed_ms = solution.elapsed_ms;
        solution = heuristics::rebuild(&sequences, &context);
        solution.elapsed_ms = elapsed_ms;
        debug!(
            heuristic = %config.name,
            routes = solution.routes.len(),
            total_distance = solution.total_distance,
            "post-processing applied"
        );
    }

    if let Some(regions) = regions {
        solution.regions = regions;
    }
    Ok(solution)
}
