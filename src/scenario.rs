//! What-if scenarios over a shared base configuration.
//!
//! Every scenario substitutes part of the base (orders, fleet, matrix,
//! capacity percentage) and runs the full pipeline on its own copies. The
//! base is only ever read, so scenarios run in parallel.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use tracing::{info, info_span, warn};

use crate::error::Diagnostic;
use crate::pipeline::{PlannerOptions, plan};
use crate::solver::Solution;
use crate::traits::{Order, Vehicle};

/// 1-based scenario label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScenarioId(pub usize);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scenario_{}", self.0)
    }
}

pub type ScenarioResults = BTreeMap<ScenarioId, Result<Solution, Diagnostic>>;

/// Base inputs every scenario starts from.
#[derive(Debug, Clone)]
pub struct BaseScenario<'a, O, V> {
    pub orders: &'a [O],
    pub fleet: &'a [V],
    pub matrix: &'a [Vec<f64>],
    pub options: PlannerOptions,
}

/// Partial override of the base; unset parts fall back to the base.
#[derive(Debug, Clone)]
pub struct ScenarioOverride<O, V> {
    pub orders: Option<Vec<O>>,
    /// Positions of the orders to keep. The matrix is restricted to the same
    /// nodes, depot included.
    pub order_subset: Option<Vec<usize>>,
    pub fleet: Option<Vec<V>>,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub capacity_adjust_pct: Option<f64>,
}

impl<O, V> Default for ScenarioOverride<O, V> {
    fn default() -> Self {
        Self {
            orders: None,
            order_subset: None,
            fleet: None,
            matrix: None,
            capacity_adjust_pct: None,
        }
    }
}

impl<O, V> ScenarioOverride<O, V> {
    pub fn with_orders(mut self, orders: Vec<O>) -> Self {
        self.orders = Some(orders);
        self
    }

    pub fn with_order_subset(mut self, positions: Vec<usize>) -> Self {
        self.order_subset = Some(positions);
        self
    }

    pub fn with_fleet(mut self, fleet: Vec<V>) -> Self {
        self.fleet = Some(fleet);
        self
    }

    pub fn with_matrix(mut self, matrix: Vec<Vec<f64>>) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn with_capacity_adjust_pct(mut self, pct: f64) -> Self {
        self.capacity_adjust_pct = Some(pct);
        self
    }
}

/// Runs every scenario independently and keys the results by scenario.
///
/// With no overrides the base configuration runs alone as `scenario_1`.
pub fn run_scenarios<O, V>(base: &BaseScenario<'_, O, V>, overrides: &[ScenarioOverride<O, V>]) -> ScenarioResults
where
    O: Order + Clone + Send + Sync,
    V: Vehicle + Clone + Send + Sync,
{
    if overrides.is_empty() {
        return BTreeMap::from([(ScenarioId(1), run_scenario(ScenarioId(1), base, &ScenarioOverride::default()))]);
    }

    overrides
        .par_iter()
        .enumerate()
        .map(|(i, scenario)| {
            let id = ScenarioId(i + 1);
            (id, run_scenario(id, base, scenario))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Runs one scenario against `base`.
pub fn run_scenario<O, V>(
    id: ScenarioId,
    base: &BaseScenario<'_, O, V>,
    scenario: &ScenarioOverride<O, V>,
) -> Result<Solution, Diagnostic>
where
    O: Order + Clone,
    V: Vehicle + Clone,
{
    let _span = info_span!("scenario", id = %id).entered();

    let mut orders: Cow<'_, [O]> = match &scenario.orders {
        Some(orders) => Cow::Borrowed(orders.as_slice()),
        None => Cow::Borrowed(base.orders),
    };
    let mut matrix: Cow<'_, [Vec<f64>]> = match &scenario.matrix {
        Some(matrix) => Cow::Borrowed(matrix.as_slice()),
        None => Cow::Borrowed(base.matrix),
    };
    let fleet = scenario.fleet.as_deref().unwrap_or(base.fleet);

    if let Some(positions) = &scenario.order_subset {
        let kept = valid_positions(positions, orders.len(), matrix.len());
        matrix = Cow::Owned(restrict_rows(&matrix, &kept));
        orders = Cow::Owned(kept.iter().map(|&p| orders[p].clone()).collect());
    }

    let mut options = base.options.clone();
    if let Some(pct) = scenario.capacity_adjust_pct {
        options.capacity_adjust_pct = pct;
    }

    let result = plan(&*orders, fleet, &*matrix, &options);
    match &result {
        Ok(solution) => info!(
            orders = orders.len(),
            vehicles = fleet.len(),
            total_distance = solution.total_distance,
            vehicles_used = solution.vehicles_used,
            "scenario solved"
        ),
        Err(diagnostic) => warn!(code = diagnostic.code(), "scenario produced no solution"),
    }
    result
}

/// Drops duplicate positions and those with no order or matrix row.
fn valid_positions(positions: &[usize], orders: usize, matrix_rows: usize) -> Vec<usize> {
    let mut kept = Vec::with_capacity(positions.len());
    for &position in positions {
        if position >= orders || position + 1 >= matrix_rows {
            warn!(position, "order subset position out of range, skipped");
        } else if !kept.contains(&position) {
            kept.push(position);
        }
    }
    kept
}

/// Rows and columns for the depot and the kept orders.
fn restrict_rows(matrix: &[Vec<f64>], kept: &[usize]) -> Vec<Vec<f64>> {
    let nodes: Vec<usize> = std::iter::once(0).chain(kept.iter().map(|p| p + 1)).collect();
    nodes
        .iter()
        .map(|&row| {
            nodes
                .iter()
                .map(|&column| matrix[row].get(column).copied().unwrap_or(f64::NAN))
                .collect()
        })
        .collect()
}
