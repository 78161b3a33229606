//! Solver tests
//!
//! Coverage, capacity, status transitions and failure diagnostics.

mod fixtures;

use std::time::{Duration, Instant};

use cvrp_planner::matrix::DistanceMatrix;
use cvrp_planner::solver::{CvrpInstance, CvrpSolver, SolveOptions, SolveStatus, solve};
use fixtures::*;

fn line_matrix(nodes: usize) -> DistanceMatrix {
    DistanceMatrix::from_fn(nodes, |i, j| (i as i64 - j as i64).abs() * 10)
}

// ============================================================================
// Feasible Instances
// ============================================================================

#[test]
fn test_two_vehicles_share_four_orders() {
    let matrix = line_matrix(5);
    let demands = [0, 10, 15, 5, 20];
    let capacities = [25, 25];

    let solution = solve(CvrpInstance::new(&matrix, &demands, &capacities), &quick_options()).unwrap();

    assert_each_order_once(&solution, 4);
    assert_within_capacity(&solution, &demands, &capacities);
    assert_eq!(solution.routes.len(), 2);
    assert_eq!(solution.vehicles_used, 2);
    assert_eq!(solution.routes.iter().map(|route| route.load).sum::<i64>(), 50);
}

#[test]
fn test_sao_paulo_deliveries() {
    let orders = orders_at(&all_locations(), &[3.0, 4.0, 2.0, 5.0, 1.0, 4.0, 3.0, 2.0, 6.0, 2.0]);
    let rows = matrix_for(&DEPOT, &orders);
    let matrix = DistanceMatrix::from_rows(&rows).unwrap();
    let demands: Vec<i64> = std::iter::once(0)
        .chain(orders.iter().map(|order| order.demand.unwrap_or(0.0) as i64))
        .collect();
    let capacities = [12, 12, 12, 12];

    let solution = solve(CvrpInstance::new(&matrix, &demands, &capacities), &quick_options()).unwrap();

    assert_each_order_once(&solution, orders.len());
    assert_within_capacity(&solution, &demands, &capacities);
    assert!(solution.vehicles_used >= 3, "32 units need at least three 12-unit vans");
    assert_eq!(
        solution.total_distance,
        solution.routes.iter().map(|route| route.distance).sum::<i64>()
    );
    for route in &solution.routes {
        assert_eq!(route.distance, matrix.route_distance(&route.sequence(0)));
    }
}

#[test]
fn test_identical_seeds_give_identical_routes() {
    let orders = orders_at(&all_locations(), &[1.0; 10]);
    let rows = matrix_for(&DEPOT, &orders);
    let matrix = DistanceMatrix::from_rows(&rows).unwrap();
    let demands: Vec<i64> = std::iter::once(0).chain(std::iter::repeat_n(1, 10)).collect();
    let capacities = [4, 4, 4];
    let options = SolveOptions {
        max_idle_rounds: 10,
        ..quick_options()
    };

    let first = solve(CvrpInstance::new(&matrix, &demands, &capacities), &options).unwrap();
    let second = solve(CvrpInstance::new(&matrix, &demands, &capacities), &options).unwrap();

    assert_eq!(first.sequences(), second.sequences());
}

#[test]
fn test_zero_orders_is_solved_with_no_routes() {
    let matrix = DistanceMatrix::from_rows(&[vec![0.0]]).unwrap();
    let demands = [0];
    let capacities = [10];
    let mut solver = CvrpSolver::new(CvrpInstance::new(&matrix, &demands, &capacities), quick_options());

    let solution = solver.solve().unwrap();

    assert_eq!(solver.status(), SolveStatus::Solved);
    assert!(solution.routes.is_empty());
    assert_eq!(solution.total_distance, 0);
    assert_eq!(solution.vehicles_used, 0);
}

#[test]
fn test_stop_records_carry_fleet_ids() {
    let matrix = line_matrix(4);
    let demands = [0, 2, 2, 2];
    let capacities = [10];
    let vehicles = fleet(1, 10.0);

    let solution = solve(CvrpInstance::new(&matrix, &demands, &capacities), &quick_options()).unwrap();
    let records = solution.stop_records(&vehicles);

    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|record| record.vehicle_id == "TST-0001"));
    let mut order_indexes: Vec<usize> = records.iter().map(|record| record.order_index).collect();
    order_indexes.sort_unstable();
    assert_eq!(order_indexes, vec![0, 1, 2]);
    assert_eq!(records.last().map(|record| record.load), Some(6));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_oversized_order_is_infeasible() {
    let matrix = line_matrix(2);
    let demands = [0, 999];
    let capacities = [100, 100];
    let mut solver = CvrpSolver::new(CvrpInstance::new(&matrix, &demands, &capacities), quick_options());

    let err = solver.solve().unwrap_err();

    assert_eq!(err.code(), "Infeasible");
    assert_eq!(solver.status(), SolveStatus::Infeasible);
}

#[test]
fn test_too_few_slots_is_infeasible_without_search() {
    // every vehicle holds two orders at most, so five orders need three
    let matrix = line_matrix(6);
    let demands = [0, 4, 4, 4, 4, 4];
    let capacities = [10, 10];
    let options = SolveOptions {
        time_limit_ms: 3_000,
        ..quick_options()
    };
    let mut solver = CvrpSolver::new(CvrpInstance::new(&matrix, &demands, &capacities), options);

    let started = Instant::now();
    let err = solver.solve().unwrap_err();

    assert_eq!(err.code(), "Infeasible");
    assert_eq!(solver.status(), SolveStatus::Infeasible);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_mixed_demands_fill_slots() {
    // slot counting leaves room: 9 + 1 and 6 + 4 fit two vans of 10
    let matrix = line_matrix(5);
    let demands = [0, 9, 1, 6, 4];
    let capacities = [10, 10];

    let solution = solve(CvrpInstance::new(&matrix, &demands, &capacities), &quick_options()).unwrap();

    assert_each_order_once(&solution, 4);
    assert_within_capacity(&solution, &demands, &capacities);
}

#[test]
#[should_panic(expected = "does not match the demand array")]
fn test_mismatched_matrix_panics() {
    let matrix = line_matrix(3);
    let demands = [0, 1];
    let capacities = [5];
    let _ = CvrpSolver::new(CvrpInstance::new(&matrix, &demands, &capacities), SolveOptions::default());
}
