//! Converts raw order/fleet figures into aligned integer arrays.

use crate::error::Diagnostic;
use crate::traits::{Order, Vehicle};

/// Capacity assigned to every vehicle when no vehicle reports one.
pub const DEFAULT_CAPACITY: f64 = 1000.0;

/// Upper bound for the capacity-adjustment percentage.
pub const MAX_CAPACITY_ADJUST_PCT: f64 = 120.0;

/// Largest demand or capacity kept after coercion; route loads and fleet
/// totals stay far from `i64` overflow.
pub const MAX_QUANTITY: f64 = 1e12;

/// Integer demand per node and capacity per vehicle.
///
/// `demands[0]` is the depot and always 0; `demands[i + 1]` belongs to
/// `orders[i]`. `capacities[k]` belongs to `fleet[k]` and is at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedProblem {
    pub demands: Vec<i64>,
    pub capacities: Vec<i64>,
}

impl NormalizedProblem {
    pub fn total_demand(&self) -> i64 {
        self.demands.iter().copied().fold(0, i64::saturating_add)
    }

    pub fn total_capacity(&self) -> i64 {
        self.capacities.iter().copied().fold(0, i64::saturating_add)
    }

    /// Feasibility gate run before the search.
    ///
    /// An order larger than every vehicle is [`Diagnostic::Infeasible`];
    /// otherwise total demand above total capacity is
    /// [`Diagnostic::InsufficientCapacity`].
    pub fn check_capacity(&self) -> Result<(), Diagnostic> {
        let max_capacity = self.capacities.iter().copied().max().unwrap_or(0);
        if let Some((node, &demand)) = self
            .demands
            .iter()
            .enumerate()
            .find(|&(_, &demand)| demand > max_capacity)
        {
            return Err(Diagnostic::Infeasible {
                reason: format!(
                    "node {} demands {} but the largest vehicle holds {} (total demand {}, total capacity {}, vehicles {})",
                    node,
                    demand,
                    max_capacity,
                    self.total_demand(),
                    self.total_capacity(),
                    self.capacities.len()
                ),
            });
        }

        let total_demand = self.total_demand();
        let total_capacity = self.total_capacity();
        if total_capacity < total_demand {
            return Err(Diagnostic::InsufficientCapacity {
                total_demand,
                total_capacity,
            });
        }
        Ok(())
    }
}

/// Builds the demand and capacity arrays for the solver.
///
/// `capacity_adjust_pct` is clamped to `[0, 120]` and applied to every raw
/// capacity before flooring. Missing demand cells become 0, or 1 for every
/// order if no order carries a demand at all.
pub fn normalize<O, V>(orders: &[O], fleet: &[V], capacity_adjust_pct: f64) -> NormalizedProblem
where
    O: Order,
    V: Vehicle,
{
    let any_demand = orders.iter().any(|order| order.demand().is_some());
    let mut demands = Vec::with_capacity(orders.len() + 1);
    demands.push(0);
    demands.extend(orders.iter().map(|order| {
        if any_demand {
            order.demand().map(coerce_non_negative).unwrap_or(0)
        } else {
            1
        }
    }));

    let pct = clamp_pct(capacity_adjust_pct);
    let any_capacity = fleet.iter().any(|vehicle| vehicle.capacity().is_some());
    let capacities = fleet
        .iter()
        .map(|vehicle| {
            let raw = if any_capacity {
                vehicle.capacity().filter(|c| c.is_finite()).unwrap_or(0.0)
            } else {
                DEFAULT_CAPACITY
            };
            adjust_capacity(raw, pct)
        })
        .collect();

    NormalizedProblem { demands, capacities }
}

/// Applies a clamped percentage to a raw capacity, flooring and clamping to
/// `1..=MAX_QUANTITY`.
pub fn adjust_capacity(raw: f64, capacity_adjust_pct: f64) -> i64 {
    // multiply before dividing so integer inputs stay exact
    let adjusted = (raw * clamp_pct(capacity_adjust_pct) / 100.0).floor();
    if adjusted.is_finite() && adjusted >= 1.0 {
        adjusted.min(MAX_QUANTITY) as i64
    } else {
        1
    }
}

fn clamp_pct(pct: f64) -> f64 {
    if pct.is_nan() {
        return 100.0;
    }
    pct.clamp(0.0, MAX_CAPACITY_ADJUST_PCT)
}

fn coerce_non_negative(value: f64) -> i64 {
    if value.is_finite() && value > 0.0 {
        value.min(MAX_QUANTITY).floor() as i64
    } else {
        0
    }
}
