//! Test fixtures for cvrp-planner.
//!
//! Provides:
//! - Real São Paulo delivery locations around a single depot
//! - Builders for orders and vehicles
//! - Distance matrices derived from coordinates

#![allow(dead_code)]

pub mod sao_paulo_locations;

pub use sao_paulo_locations::*;

use cvrp_planner::solver::{Solution, SolveOptions};
use cvrp_planner::traits::{Order, Vehicle};

/// Builder for test orders with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestOrder {
    pub id: String,
    pub location: Option<(f64, f64)>,
    pub demand: Option<f64>,
    pub region: Option<i32>,
}

impl TestOrder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            location: None,
            demand: Some(1.0),
            region: None,
        }
    }

    pub fn demand(mut self, demand: f64) -> Self {
        self.demand = Some(demand);
        self
    }

    pub fn without_demand(mut self) -> Self {
        self.demand = None;
        self
    }

    pub fn at(mut self, location: &Location) -> Self {
        self.location = Some(location.coords());
        self
    }
}

impl Order for TestOrder {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn location(&self) -> Option<(f64, f64)> {
        self.location
    }

    fn demand(&self) -> Option<f64> {
        self.demand
    }

    fn region(&self) -> Option<i32> {
        self.region
    }
}

/// Builder for test vehicles.
#[derive(Clone, Debug)]
pub struct TestVehicle {
    pub plate: String,
    pub capacity: Option<f64>,
}

impl TestVehicle {
    pub fn new(plate: &str, capacity: f64) -> Self {
        Self {
            plate: plate.to_string(),
            capacity: Some(capacity),
        }
    }
}

impl Vehicle for TestVehicle {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.plate
    }

    fn capacity(&self) -> Option<f64> {
        self.capacity
    }
}

/// `count` vehicles of equal capacity, plates `TST-0001`, `TST-0002`, ...
pub fn fleet(count: usize, capacity: f64) -> Vec<TestVehicle> {
    (1..=count)
        .map(|i| TestVehicle::new(&format!("TST-{:04}", i), capacity))
        .collect()
}

/// Orders at the given locations with the given demands.
pub fn orders_at(locations: &[Location], demands: &[f64]) -> Vec<TestOrder> {
    locations
        .iter()
        .zip(demands)
        .enumerate()
        .map(|(i, (location, &demand))| TestOrder::new(&format!("order_{}", i + 1)).at(location).demand(demand))
        .collect()
}

/// Straight-line distance matrix in meters, depot first.
pub fn matrix_for(depot: &Location, orders: &[TestOrder]) -> Vec<Vec<f64>> {
    let points: Vec<(f64, f64)> = std::iter::once(depot.coords())
        .chain(orders.iter().map(|order| order.location.unwrap_or(depot.coords())))
        .collect();
    points
        .iter()
        .map(|from| points.iter().map(|to| haversine_meters(*from, *to)).collect())
        .collect()
}

/// Symmetric matrix where every off-diagonal entry is given by `cost`.
pub fn uniform_matrix(nodes: usize, cost: f64) -> Vec<Vec<f64>> {
    (0..nodes)
        .map(|i| (0..nodes).map(|j| if i == j { 0.0 } else { cost }).collect())
        .collect()
}

fn haversine_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let a = ((lat2 - lat1) / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * ((lng2 - lng1) / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().asin()
}

/// Short budget so the suite stays fast.
pub fn quick_options() -> SolveOptions {
    SolveOptions {
        time_limit_ms: 2_000,
        max_idle_rounds: 30,
        ..SolveOptions::default()
    }
}

/// Asserts every order node 1..=orders appears exactly once across routes.
pub fn assert_each_order_once(solution: &Solution, orders: usize) {
    let mut visited: Vec<usize> = solution.routes.iter().flat_map(|route| route.nodes()).collect();
    visited.sort_unstable();
    let expected: Vec<usize> = (1..=orders).collect();
    assert_eq!(visited, expected, "every order must be routed exactly once");
    assert!(solution.unrouted.is_empty());
}

/// Asserts no route carries more than its vehicle's capacity.
pub fn assert_within_capacity(solution: &Solution, demands: &[i64], capacities: &[i64]) {
    for route in &solution.routes {
        let load: i64 = route.nodes().iter().map(|&node| demands[node]).sum();
        assert_eq!(load, route.load);
        assert!(
            load <= capacities[route.vehicle],
            "vehicle {} carries {} over capacity {}",
            route.vehicle,
            load,
            capacities[route.vehicle]
        );
    }
}
