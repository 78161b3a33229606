//! Capacitated VRP solver.
//!
//! Cheapest-insertion construction followed by guided local search
//! (relocate, exchange, 2-opt) under a wall-clock budget. Costs are integer
//! arc costs taken straight from the distance matrix.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Diagnostic;
use crate::matrix::DistanceMatrix;
use crate::traits::Vehicle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Wall-clock budget for one solve, in milliseconds.
    pub time_limit_ms: u64,
    /// Guided local search rounds without a new best solution before stopping early.
    pub max_idle_rounds: usize,
    /// Penalty weight relative to the average arc cost of the first local optimum.
    pub penalty_factor: f64,
    /// Seed for the randomized packing fallback.
    pub seed: u64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit_ms: 30_000,
            max_idle_rounds: 200,
            penalty_factor: 0.1,
            seed: 42,
        }
    }
}

impl SolveOptions {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Unsolved,
    Solving,
    Solved,
    Infeasible,
    TimedOut,
}

/// Solver-ready problem: one matrix node per demand entry, one capacity per vehicle.
#[derive(Debug, Clone, Copy)]
pub struct CvrpInstance<'a> {
    pub matrix: &'a DistanceMatrix,
    pub demands: &'a [i64],
    pub capacities: &'a [i64],
    pub depot: usize,
}

impl<'a> CvrpInstance<'a> {
    pub fn new(matrix: &'a DistanceMatrix, demands: &'a [i64], capacities: &'a [i64]) -> Self {
        Self {
            matrix,
            demands,
            capacities,
            depot: 0,
        }
    }

    pub fn with_depot(mut self, depot: usize) -> Self {
        self.depot = depot;
        self
    }

    pub fn node_count(&self) -> usize {
        self.demands.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.capacities.len()
    }

    fn customers(&self) -> Vec<usize> {
        (0..self.node_count()).filter(|&node| node != self.depot).collect()
    }
}

/// One visited order within a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stop {
    /// 1-based position within the route.
    pub sequence: usize,
    pub node: usize,
    pub demand: i64,
    /// Cumulative load after serving this stop.
    pub load: i64,
    /// Cost of the arc to the next stop, or back to the depot.
    pub distance_to_next: i64,
}

/// Depot-bounded sequence of stops served by one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub vehicle: usize,
    pub stops: Vec<Stop>,
    pub load: i64,
    pub distance: i64,
}

impl Route {
    /// Builds a route for `vehicle` visiting `nodes` (depot excluded) in order.
    pub fn build(vehicle: usize, nodes: &[usize], depot: usize, matrix: &DistanceMatrix, demands: &[i64]) -> Self {
        let mut stops = Vec::with_capacity(nodes.len());
        let mut load = 0;
        let mut distance = nodes.first().map_or(0, |&first| matrix.get(depot, first));

        for (i, &node) in nodes.iter().enumerate() {
            let next = nodes.get(i + 1).copied().unwrap_or(depot);
            let leg = matrix.get(node, next);
            load += demands[node];
            distance += leg;
            stops.push(Stop {
                sequence: i + 1,
                node,
                demand: demands[node],
                load,
                distance_to_next: leg,
            });
        }

        Self {
            vehicle,
            stops,
            load,
            distance,
        }
    }

    /// Visited nodes in order, depot excluded.
    pub fn nodes(&self) -> Vec<usize> {
        self.stops.iter().map(|stop| stop.node).collect()
    }

    /// Visited nodes with the depot at both ends.
    pub fn sequence(&self, depot: usize) -> Vec<usize> {
        let mut sequence = Vec::with_capacity(self.stops.len() + 2);
        sequence.push(depot);
        sequence.extend(self.stops.iter().map(|stop| stop.node));
        sequence.push(depot);
        sequence
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub routes: Vec<Route>,
    pub depot: usize,
    pub total_distance: i64,
    pub vehicles_used: usize,
    pub orders_routed: usize,
    /// Nodes left out; always empty for a solved result.
    pub unrouted: Vec<usize>,
    pub elapsed_ms: u64,
    /// Region label per order, when clustering was requested.
    pub regions: Vec<i32>,
}

/// Flat stop row for reporting and mapping layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopRecord<VehicleId> {
    pub vehicle_id: VehicleId,
    pub sequence: usize,
    pub node: usize,
    /// Position of the order in the caller's order list.
    pub order_index: usize,
    pub demand: i64,
    pub load: i64,
    pub distance_to_next: i64,
}

impl Solution {
    pub fn from_routes(routes: Vec<Route>, depot: usize) -> Self {
        let mut vehicles: Vec<usize> = routes
            .iter()
            .filter(|route| !route.stops.is_empty())
            .map(|route| route.vehicle)
            .collect();
        vehicles.sort_unstable();
        vehicles.dedup();

        Self {
            total_distance: routes.iter().map(|route| route.distance).sum(),
            orders_routed: routes.iter().map(|route| route.stops.len()).sum(),
            vehicles_used: vehicles.len(),
            routes,
            depot,
            ..Self::default()
        }
    }

    /// Node sequences of every route, depot at both ends.
    pub fn sequences(&self) -> Vec<Vec<usize>> {
        self.routes.iter().map(|route| route.sequence(self.depot)).collect()
    }

    /// Flattens the routes into stop rows labelled with the fleet's identifiers.
    pub fn stop_records<V: Vehicle>(&self, fleet: &[V]) -> Vec<StopRecord<V::Id>> {
        self.routes
            .iter()
            .flat_map(|route| {
                let vehicle_id = fleet[route.vehicle].id().clone();
                route.stops.iter().map(move |stop| StopRecord {
                    vehicle_id: vehicle_id.clone(),
                    sequence: stop.sequence,
                    node: stop.node,
                    order_index: if stop.node > self.depot { stop.node - 1 } else { stop.node },
                    demand: stop.demand,
                    load: stop.load,
                    distance_to_next: stop.distance_to_next,
                })
            })
            .collect()
    }
}

/// Solver with an observable `Unsolved → Solving → {Solved | Infeasible | TimedOut}` status.
pub struct CvrpSolver<'a> {
    instance: CvrpInstance<'a>,
    options: SolveOptions,
    status: SolveStatus,
}

impl<'a> CvrpSolver<'a> {
    /// # Panics
    ///
    /// Panics if the matrix dimension differs from the demand array length or
    /// the depot is not a node; both mean the caller skipped validation.
    pub fn new(instance: CvrpInstance<'a>, options: SolveOptions) -> Self {
        assert_eq!(
            instance.matrix.dimension(),
            instance.node_count(),
            "distance matrix dimension does not match the demand array"
        );
        assert!(
            instance.node_count() == 0 || instance.depot < instance.node_count(),
            "depot index {} out of range",
            instance.depot
        );
        Self {
            instance,
            options,
            status: SolveStatus::Unsolved,
        }
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn solve(&mut self) -> Result<Solution, Diagnostic> {
        self.status = SolveStatus::Solving;
        let result = self.run();
        self.status = match &result {
            Ok(_) => SolveStatus::Solved,
            Err(Diagnostic::TimedOut { .. }) => SolveStatus::TimedOut,
            Err(_) => SolveStatus::Infeasible,
        };
        if let Err(diagnostic) = &result {
            warn!(code = diagnostic.code(), "{}", diagnostic);
        }
        result
    }

    fn run(&self) -> Result<Solution, Diagnostic> {
        let started = Instant::now();
        let instance = &self.instance;
        let customers = instance.customers();

        info!(
            orders = customers.len(),
            vehicles = instance.vehicle_count(),
            time_limit_ms = self.options.time_limit_ms,
            "solving CVRP"
        );

        if customers.is_empty() {
            return Ok(Solution {
                depot: instance.depot,
                elapsed_ms: elapsed_ms(started),
                ..Solution::default()
            });
        }

        check_feasibility(instance, &customers)?;

        let mut search = Search::new(instance, &self.options, started + self.options.time_limit());
        let plan = match search.construct(&customers) {
            Some(plan) => plan,
            None => {
                debug!("cheapest insertion left orders unrouted, falling back to packing");
                search.pack(&customers).ok_or_else(|| Diagnostic::TimedOut {
                    elapsed_ms: elapsed_ms(started),
                })?
            }
        };

        let best = search.improve(plan);
        debug_assert!(best.covers(&customers));

        let routes = best
            .routes
            .iter()
            .enumerate()
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(vehicle, nodes)| Route::build(vehicle, nodes, instance.depot, instance.matrix, instance.demands))
            .collect();
        let mut solution = Solution::from_routes(routes, instance.depot);
        solution.elapsed_ms = elapsed_ms(started);

        info!(
            total_distance = solution.total_distance,
            vehicles_used = solution.vehicles_used,
            elapsed_ms = solution.elapsed_ms,
            "CVRP solved"
        );
        Ok(solution)
    }
}

/// Solves `instance` within the options' time budget.
pub fn solve(instance: CvrpInstance<'_>, options: &SolveOptions) -> Result<Solution, Diagnostic> {
    CvrpSolver::new(instance, options.clone()).solve()
}

/// Cheap proofs of infeasibility, run before any search.
fn check_feasibility(instance: &CvrpInstance<'_>, customers: &[usize]) -> Result<(), Diagnostic> {
    let total_demand = customers
        .iter()
        .map(|&node| instance.demands[node])
        .fold(0, i64::saturating_add);
    let total_capacity = instance.capacities.iter().copied().fold(0, i64::saturating_add);
    let detail = format!(
        "total demand {}, total capacity {}, vehicles {}",
        total_demand,
        total_capacity,
        instance.vehicle_count()
    );

    let Some(&max_capacity) = instance.capacities.iter().max() else {
        return Err(Diagnostic::Infeasible {
            reason: format!("no vehicles available for {} orders", customers.len()),
        });
    };

    if let Some(&node) = customers.iter().find(|&&node| instance.demands[node] > max_capacity) {
        return Err(Diagnostic::Infeasible {
            reason: format!(
                "node {} demands {} but the largest vehicle holds {} ({})",
                node, instance.demands[node], max_capacity, detail
            ),
        });
    }

    if total_demand > total_capacity {
        return Err(Diagnostic::Infeasible {
            reason: format!("demand exceeds fleet capacity ({})", detail),
        });
    }

    // two orders heavier than half the largest vehicle can never share one
    let heavy = customers
        .iter()
        .filter(|&&node| instance.demands[node].saturating_mul(2) > max_capacity)
        .count();
    if heavy > instance.vehicle_count() {
        return Err(Diagnostic::Infeasible {
            reason: format!(
                "{} orders each need a vehicle of their own but only {} exist ({})",
                heavy,
                instance.vehicle_count(),
                detail
            ),
        });
    }

    // a vehicle never holds more orders than its smallest demands fill
    let mut ascending: Vec<i64> = customers.iter().map(|&node| instance.demands[node]).collect();
    ascending.sort_unstable();
    let slots: usize = instance
        .capacities
        .iter()
        .map(|&capacity| max_orders_held(&ascending, capacity))
        .fold(0, usize::saturating_add);
    if slots < customers.len() {
        return Err(Diagnostic::Infeasible {
            reason: format!(
                "the fleet holds at most {} of {} orders ({})",
                slots,
                customers.len(),
                detail
            ),
        });
    }

    Ok(())
}

/// Orders a vehicle of `capacity` can carry at most, given demands sorted ascending.
fn max_orders_held(ascending: &[i64], capacity: i64) -> usize {
    let mut load: i64 = 0;
    ascending
        .iter()
        .take_while(|&&demand| {
            load = load.saturating_add(demand);
            load <= capacity
        })
        .count()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Per-vehicle node sequences (depot excluded) and their loads.
#[derive(Debug, Clone)]
struct Plan {
    routes: Vec<Vec<usize>>,
    loads: Vec<i64>,
}

impl Plan {
    fn empty(vehicles: usize) -> Self {
        Self {
            routes: vec![Vec::new(); vehicles],
            loads: vec![0; vehicles],
        }
    }

    fn vehicles_used(&self) -> usize {
        self.routes.iter().filter(|route| !route.is_empty()).count()
    }

    fn covers(&self, customers: &[usize]) -> bool {
        let mut visited: Vec<usize> = self.routes.iter().flatten().copied().collect();
        visited.sort_unstable();
        visited == customers
    }
}

struct Search<'a> {
    matrix: &'a DistanceMatrix,
    demands: &'a [i64],
    capacities: &'a [i64],
    depot: usize,
    symmetric: bool,
    /// Guided local search penalty per arc, row-major.
    penalties: Vec<i64>,
    lambda: i64,
    penalty_factor: f64,
    max_idle_rounds: usize,
    seed: u64,
    deadline: Instant,
}

impl<'a> Search<'a> {
    fn new(instance: &CvrpInstance<'a>, options: &SolveOptions, deadline: Instant) -> Self {
        let n = instance.node_count();
        Self {
            matrix: instance.matrix,
            demands: instance.demands,
            capacities: instance.capacities,
            depot: instance.depot,
            symmetric: instance.matrix.is_symmetric(),
            penalties: vec![0; n * n],
            lambda: 0,
            penalty_factor: options.penalty_factor,
            max_idle_rounds: options.max_idle_rounds,
            seed: options.seed,
            deadline,
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Penalized arc cost used while searching.
    #[inline]
    fn arc(&self, from: usize, to: usize) -> i64 {
        let penalty = self.penalties[from * self.matrix.dimension() + to];
        self.matrix.get(from, to) + self.lambda * penalty
    }

    /// Nodes before and after position `pos` of `route`.
    fn neighbors(&self, route: &[usize], pos: usize) -> (usize, usize) {
        let prev = if pos == 0 { self.depot } else { route[pos - 1] };
        let next = route.get(pos + 1).copied().unwrap_or(self.depot);
        (prev, next)
    }

    /// Nodes bounding the insertion gap before position `pos`.
    fn gap(&self, route: &[usize], pos: usize) -> (usize, usize) {
        let prev = if pos == 0 { self.depot } else { route[pos - 1] };
        let next = route.get(pos).copied().unwrap_or(self.depot);
        (prev, next)
    }

    fn route_cost(&self, route: &[usize], arc: impl Fn(usize, usize) -> i64) -> i64 {
        if route.is_empty() {
            return 0;
        }
        let inner: i64 = route.windows(2).map(|pair| arc(pair[0], pair[1])).sum();
        arc(self.depot, route[0]) + inner + arc(route[route.len() - 1], self.depot)
    }

    fn key(&self, plan: &Plan) -> (i64, usize) {
        let distance = plan
            .routes
            .iter()
            .map(|route| self.route_cost(route, |a, b| self.matrix.get(a, b)))
            .sum();
        (distance, plan.vehicles_used())
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Cheapest insertion. Returns `None` when the fleet runs out before every
    /// order is placed.
    fn construct(&self, customers: &[usize]) -> Option<Plan> {
        let vehicles = self.capacities.len();
        let mut plan = Plan::empty(vehicles);
        let mut open = vec![false; vehicles];
        let mut unrouted = customers.to_vec();

        while !unrouted.is_empty() {
            let mut best: Option<(i64, usize, usize, usize)> = None;
            for vehicle in (0..vehicles).filter(|&v| open[v]) {
                let route = &plan.routes[vehicle];
                for (k, &node) in unrouted.iter().enumerate() {
                    if plan.loads[vehicle] + self.demands[node] > self.capacities[vehicle] {
                        continue;
                    }
                    for pos in 0..=route.len() {
                        let (a, b) = self.gap(route, pos);
                        let delta = self.matrix.get(a, node) + self.matrix.get(node, b) - self.matrix.get(a, b);
                        if best.is_none_or(|(cost, ..)| delta < cost) {
                            best = Some((delta, k, vehicle, pos));
                        }
                    }
                }
            }

            match best {
                Some((_, k, vehicle, pos)) => {
                    let node = unrouted.remove(k);
                    plan.routes[vehicle].insert(pos, node);
                    plan.loads[vehicle] += self.demands[node];
                }
                None => {
                    // open the largest idle vehicle on the farthest order it can carry
                    let vehicle = (0..vehicles)
                        .filter(|&v| !open[v])
                        .max_by_key(|&v| (self.capacities[v], Reverse(v)))?;
                    let (k, &node) = unrouted
                        .iter()
                        .enumerate()
                        .filter(|&(_, &node)| self.demands[node] <= self.capacities[vehicle])
                        .max_by_key(|&(_, &node)| {
                            (
                                self.matrix.get(self.depot, node) + self.matrix.get(node, self.depot),
                                Reverse(node),
                            )
                        })?;
                    open[vehicle] = true;
                    plan.routes[vehicle].push(node);
                    plan.loads[vehicle] += self.demands[node];
                    unrouted.remove(k);
                }
            }
        }

        debug!(vehicles = plan.vehicles_used(), "cheapest insertion complete");
        Some(plan)
    }

    /// Best-fit-decreasing packing, retried with perturbed order until the
    /// deadline.
    fn pack(&self, customers: &[usize]) -> Option<Plan> {
        let mut vehicles: Vec<usize> = (0..self.capacities.len()).collect();
        vehicles.sort_by_key(|&v| (Reverse(self.capacities[v]), v));

        let mut order = customers.to_vec();
        order.sort_by_key(|&node| (Reverse(self.demands[node]), node));

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut attempt = 0usize;
        loop {
            if let Some(plan) = self.best_fit(&order, &vehicles) {
                debug!(attempt, "packing found a complete assignment");
                return Some(plan);
            }
            if self.expired() {
                debug!(attempt, "packing gave up at the deadline");
                return None;
            }
            attempt += 1;
            let mut keyed: Vec<(f64, usize)> = customers
                .iter()
                .map(|&node| (self.demands[node] as f64 * rng.gen_range(0.7..1.3), node))
                .collect();
            keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
            order = keyed.into_iter().map(|(_, node)| node).collect();
        }
    }

    fn best_fit(&self, order: &[usize], vehicles: &[usize]) -> Option<Plan> {
        let mut plan = Plan::empty(self.capacities.len());
        for &node in order {
            let vehicle = vehicles
                .iter()
                .copied()
                .filter(|&v| plan.loads[v] + self.demands[node] <= self.capacities[v])
                .min_by_key(|&v| self.capacities[v] - plan.loads[v] - self.demands[node])?;

            let route = &plan.routes[vehicle];
            let pos = (0..=route.len())
                .min_by_key(|&pos| {
                    let (a, b) = self.gap(route, pos);
                    self.matrix.get(a, node) + self.matrix.get(node, b) - self.matrix.get(a, b)
                })
                .unwrap_or(0);
            plan.routes[vehicle].insert(pos, node);
            plan.loads[vehicle] += self.demands[node];
        }
        Some(plan)
    }

    // ========================================================================
    // Guided Local Search
    // ========================================================================

    fn improve(&mut self, mut plan: Plan) -> Plan {
        self.lambda = 0;
        self.descend(&mut plan);

        let mut best = plan.clone();
        let mut best_key = self.key(&best);
        let arcs = plan.routes.iter().flatten().count() + plan.vehicles_used();
        self.lambda = ((self.penalty_factor * best_key.0 as f64 / arcs.max(1) as f64).round() as i64).max(1);
        debug!(distance = best_key.0, vehicles = best_key.1, lambda = self.lambda, "first local optimum");

        let mut idle = 0;
        let mut round = 0;
        while idle < self.max_idle_rounds && !self.expired() {
            round += 1;
            self.penalize(&plan);
            self.descend(&mut plan);

            let key = self.key(&plan);
            if key < best_key {
                debug!(round, distance = key.0, vehicles = key.1, "new best solution");
                best = plan.clone();
                best_key = key;
                idle = 0;
            } else {
                idle += 1;
            }
        }

        best
    }

    /// Applies improving moves until none is left or the budget runs out.
    fn descend(&self, plan: &mut Plan) {
        while !self.expired() {
            if !(self.relocate(plan) || self.exchange(plan) || self.two_opt(plan)) {
                break;
            }
        }
    }

    /// Increments the penalty of the arcs with maximum utility in `plan`.
    fn penalize(&mut self, plan: &Plan) {
        let n = self.matrix.dimension();
        let mut arcs = Vec::new();
        for route in plan.routes.iter().filter(|route| !route.is_empty()) {
            let mut prev = self.depot;
            for &node in route.iter().chain(std::iter::once(&self.depot)) {
                arcs.push((prev, node));
                prev = node;
            }
        }

        let utility = |&(a, b): &(usize, usize)| self.matrix.get(a, b) as f64 / (1 + self.penalties[a * n + b]) as f64;
        let max = arcs.iter().map(utility).fold(f64::NEG_INFINITY, f64::max);
        let selected: Vec<(usize, usize)> = arcs.iter().copied().filter(|arc| utility(arc) >= max).collect();

        for (a, b) in selected {
            self.penalties[a * n + b] += 1;
            if a != b {
                self.penalties[b * n + a] += 1;
            }
        }
    }

    /// Moves one order to another position, in its own route or another.
    fn relocate(&self, plan: &mut Plan) -> bool {
        let vehicles = plan.routes.len();
        // idle vehicles are interchangeable apart from capacity
        let spare = (0..vehicles)
            .filter(|&v| plan.routes[v].is_empty())
            .max_by_key(|&v| (self.capacities[v], Reverse(v)));

        for r in 0..vehicles {
            for i in 0..plan.routes[r].len() {
                if self.expired() {
                    return false;
                }
                let node = plan.routes[r][i];
                let demand = self.demands[node];
                let (p, n) = self.neighbors(&plan.routes[r], i);
                let removal = self.arc(p, n) - self.arc(p, node) - self.arc(node, n);

                for s in 0..vehicles {
                    if s == r {
                        let mut without = plan.routes[r].clone();
                        without.remove(i);
                        for pos in (0..=without.len()).filter(|&pos| pos != i) {
                            let (a, b) = self.gap(&without, pos);
                            let delta = removal + self.arc(a, node) + self.arc(node, b) - self.arc(a, b);
                            if delta < 0 {
                                without.insert(pos, node);
                                plan.routes[r] = without;
                                return true;
                            }
                        }
                        continue;
                    }

                    if plan.routes[s].is_empty() && Some(s) != spare {
                        continue;
                    }
                    if plan.loads[s] + demand > self.capacities[s] {
                        continue;
                    }
                    for pos in 0..=plan.routes[s].len() {
                        let (a, b) = self.gap(&plan.routes[s], pos);
                        let delta = removal + self.arc(a, node) + self.arc(node, b) - self.arc(a, b);
                        if delta < 0 {
                            plan.routes[r].remove(i);
                            plan.routes[s].insert(pos, node);
                            plan.loads[r] -= demand;
                            plan.loads[s] += demand;
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Swaps two orders between different routes.
    fn exchange(&self, plan: &mut Plan) -> bool {
        let vehicles = plan.routes.len();
        for r in 0..vehicles {
            for s in r + 1..vehicles {
                if self.expired() {
                    return false;
                }
                for i in 0..plan.routes[r].len() {
                    for j in 0..plan.routes[s].len() {
                        let u = plan.routes[r][i];
                        let v = plan.routes[s][j];
                        let (du, dv) = (self.demands[u], self.demands[v]);
                        if plan.loads[r] - du + dv > self.capacities[r] || plan.loads[s] - dv + du > self.capacities[s] {
                            continue;
                        }

                        let (pu, nu) = self.neighbors(&plan.routes[r], i);
                        let (pv, nv) = self.neighbors(&plan.routes[s], j);
                        let delta = self.arc(pu, v) + self.arc(v, nu) - self.arc(pu, u) - self.arc(u, nu)
                            + self.arc(pv, u)
                            + self.arc(u, nv)
                            - self.arc(pv, v)
                            - self.arc(v, nv);
                        if delta < 0 {
                            plan.routes[r][i] = v;
                            plan.routes[s][j] = u;
                            plan.loads[r] += dv - du;
                            plan.loads[s] += du - dv;
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Reverses a segment within one route.
    fn two_opt(&self, plan: &mut Plan) -> bool {
        for route in plan.routes.iter_mut() {
            if route.len() < 2 {
                continue;
            }
            if self.expired() {
                return false;
            }
            let current = self.route_cost(route, |a, b| self.arc(a, b));
            for i in 0..route.len() - 1 {
                for j in i + 1..route.len() {
                    let delta = if self.symmetric {
                        let (p, _) = self.neighbors(route, i);
                        let (_, n) = self.neighbors(route, j);
                        self.arc(p, route[j]) + self.arc(route[i], n) - self.arc(p, route[i]) - self.arc(route[j], n)
                    } else {
                        let mut candidate = route.clone();
                        candidate[i..=j].reverse();
                        self.route_cost(&candidate, |a, b| self.arc(a, b)) - current
                    };
                    if delta < 0 {
                        route[i..=j].reverse();
                        return true;
                    }
                }
            }
        }
        false
    }
}
