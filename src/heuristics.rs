//! Post-processing passes over solved routes.
//!
//! Each pass takes depot-bounded node sequences and returns revised ones.
//! 2-opt and split never change which orders a sequence carries; merge is the
//! only pass that re-checks capacity.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::matrix::DistanceMatrix;
use crate::solver::{Route, Solution};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// `"2opt"`, `"merge"` or `"split"`; any other name leaves routes untouched.
    pub name: String,
    /// Largest number of stops per sub-route produced by split.
    pub max_stops_per_route: usize,
    /// Pass limit for 2-opt.
    pub max_passes: usize,
    /// Merge only when it adds at most this much distance. `None` = any.
    pub max_added_distance: Option<i64>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            name: "2opt".to_string(),
            max_stops_per_route: 5,
            max_passes: 50,
            max_added_distance: None,
        }
    }
}

impl HeuristicConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heuristic {
    TwoOpt { max_passes: usize },
    Merge { max_added_distance: Option<i64> },
    Split { max_stops: usize },
    Inactive(String),
}

impl From<&HeuristicConfig> for Heuristic {
    fn from(config: &HeuristicConfig) -> Self {
        match config.name.to_ascii_lowercase().as_str() {
            "2opt" | "2-opt" | "two_opt" => Heuristic::TwoOpt {
                max_passes: config.max_passes,
            },
            "merge" => Heuristic::Merge {
                max_added_distance: config.max_added_distance,
            },
            "split" => Heuristic::Split {
                max_stops: config.max_stops_per_route,
            },
            _ => Heuristic::Inactive(config.name.clone()),
        }
    }
}

/// Node sequence served by `vehicle`, with the depot at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSequence {
    pub vehicle: usize,
    pub nodes: Vec<usize>,
}

impl RouteSequence {
    pub fn new(vehicle: usize, nodes: Vec<usize>) -> Self {
        Self { vehicle, nodes }
    }

    /// Orders carried, depot ends stripped.
    pub fn stops(&self) -> &[usize] {
        if self.nodes.len() < 2 {
            return &[];
        }
        &self.nodes[1..self.nodes.len() - 1]
    }

    pub fn load(&self, demands: &[i64]) -> i64 {
        self.stops().iter().map(|&node| demands[node]).sum()
    }
}

/// Context shared by every pass.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub matrix: &'a DistanceMatrix,
    pub demands: &'a [i64],
    pub capacities: &'a [i64],
    pub depot: usize,
}

pub fn sequences_of(solution: &Solution) -> Vec<RouteSequence> {
    solution
        .routes
        .iter()
        .map(|route| RouteSequence::new(route.vehicle, route.sequence(solution.depot)))
        .collect()
}

/// Rebuilds a solution from post-processed sequences, replacing the input routes.
pub fn rebuild(sequences: &[RouteSequence], context: &RouteContext<'_>) -> Solution {
    let routes = sequences
        .iter()
        .filter(|sequence| !sequence.stops().is_empty())
        .map(|sequence| Route::build(sequence.vehicle, sequence.stops(), context.depot, context.matrix, context.demands))
        .collect();
    Solution::from_routes(routes, context.depot)
}

/// Runs `heuristic` over `routes`.
pub fn apply(heuristic: &Heuristic, routes: Vec<RouteSequence>, context: &RouteContext<'_>) -> Vec<RouteSequence> {
    match heuristic {
        Heuristic::TwoOpt { max_passes } => routes
            .into_iter()
            .map(|route| RouteSequence {
                nodes: two_opt(&route.nodes, context.matrix, *max_passes),
                vehicle: route.vehicle,
            })
            .collect(),
        Heuristic::Merge { max_added_distance } => merge(routes, context, *max_added_distance),
        Heuristic::Split { max_stops } => routes
            .iter()
            .flat_map(|route| split(route, *max_stops, context.depot))
            .collect(),
        Heuristic::Inactive(name) => {
            warn!(heuristic = %name, "post-processing heuristic not recognized, routes left unchanged");
            routes
        }
    }
}

// ============================================================================
// 2-opt
// ============================================================================

/// Reverses inner segments of `route` while that strictly shortens it.
///
/// `route` includes both depot ends, which never move. Routes with two or
/// fewer stops are returned as-is.
pub fn two_opt(route: &[usize], matrix: &DistanceMatrix, max_passes: usize) -> Vec<usize> {
    let mut current = route.to_vec();
    if current.len() < 5 {
        return current;
    }

    let last = current.len() - 2;
    let mut best = matrix.route_distance(&current);
    for pass in 0..max_passes {
        let mut improved = false;
        for i in 1..last {
            for j in i + 1..=last {
                current[i..=j].reverse();
                let distance = matrix.route_distance(&current);
                if distance < best {
                    best = distance;
                    improved = true;
                } else {
                    current[i..=j].reverse();
                }
            }
        }
        if !improved {
            debug!(pass, distance = best, "2-opt converged");
            break;
        }
    }
    current
}

// ============================================================================
// Merge
// ============================================================================

/// Repeatedly joins the pair of routes whose union fits a single vehicle and
/// adds the least distance.
///
/// The merged route stays on one of the two source vehicles when either can
/// carry it, otherwise it moves to the smallest idle vehicle that can.
pub fn merge(
    mut routes: Vec<RouteSequence>,
    context: &RouteContext<'_>,
    max_added_distance: Option<i64>,
) -> Vec<RouteSequence> {
    while let Some((added, a, b, merged)) = best_merge(&routes, context) {
        if max_added_distance.is_some_and(|limit| added > limit) {
            break;
        }
        debug!(added, vehicle = merged.vehicle, "merging routes");
        routes[a] = merged;
        routes.remove(b);
    }
    routes
}

fn best_merge(routes: &[RouteSequence], context: &RouteContext<'_>) -> Option<(i64, usize, usize, RouteSequence)> {
    let mut best: Option<(i64, usize, usize, RouteSequence)> = None;
    let mut idle: Vec<usize> = (0..context.capacities.len())
        .filter(|&vehicle| routes.iter().all(|route| route.vehicle != vehicle))
        .collect();
    idle.sort_by_key(|&vehicle| context.capacities[vehicle]);

    for a in 0..routes.len() {
        for b in a + 1..routes.len() {
            let (first, second) = (&routes[a], &routes[b]);
            let combined = first.load(context.demands) + second.load(context.demands);
            let own = if context.capacities[first.vehicle] >= context.capacities[second.vehicle] {
                first.vehicle
            } else {
                second.vehicle
            };
            let vehicle = if combined <= context.capacities[own] {
                own
            } else {
                match idle.iter().find(|&&vehicle| combined <= context.capacities[vehicle]) {
                    Some(&vehicle) => vehicle,
                    None => continue,
                }
            };

            let before = context.matrix.route_distance(&first.nodes) + context.matrix.route_distance(&second.nodes);
            for (host, guest) in [(first, second), (second, first)] {
                let mut reversed = guest.stops().to_vec();
                reversed.reverse();
                for segment in [guest.stops().to_vec(), reversed] {
                    for gap in 1..host.nodes.len() {
                        let mut nodes = Vec::with_capacity(host.nodes.len() + segment.len());
                        nodes.extend_from_slice(&host.nodes[..gap]);
                        nodes.extend_from_slice(&segment);
                        nodes.extend_from_slice(&host.nodes[gap..]);

                        let added = context.matrix.route_distance(&nodes) - before;
                        if best.as_ref().is_none_or(|(cost, ..)| added < *cost) {
                            best = Some((added, a, b, RouteSequence::new(vehicle, nodes)));
                        }
                    }
                }
            }
        }
    }

    best
}

// ============================================================================
// Split
// ============================================================================

/// Chunks a route into depot-bounded sub-routes of at most `max_stops` stops,
/// preserving stop order.
pub fn split(route: &RouteSequence, max_stops: usize, depot: usize) -> Vec<RouteSequence> {
    let stops = route.stops();
    if stops.len() <= max_stops.max(1) {
        return vec![route.clone()];
    }
    stops
        .chunks(max_stops.max(1))
        .map(|chunk| {
            let mut nodes = Vec::with_capacity(chunk.len() + 2);
            nodes.push(depot);
            nodes.extend_from_slice(chunk);
            nodes.push(depot);
            RouteSequence::new(route.vehicle, nodes)
        })
        .collect()
}
