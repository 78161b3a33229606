//! Region clustering for orders without an explicit region label.
//!
//! K-means over raw (lat, lng) degrees. Euclidean distance on degrees is an
//! acceptable approximation at city scale. Used upstream of solving for load
//! balancing and reporting only.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::traits::Order;

/// Label given to points without coordinates.
pub const NO_COORDINATE: i32 = -1;

const DEFAULT_SEED: u64 = 42;
const MAX_ITERATIONS: usize = 300;
const TOLERANCE: f64 = 1e-10;

/// Assigns a cluster label to every point.
///
/// `target_clusters` is capped to the number of points with coordinates.
/// Labels are numbered by first appearance, so the first located point is
/// always in cluster 0.
pub fn cluster(points: &[Option<(f64, f64)>], target_clusters: usize) -> Vec<i32> {
    cluster_with_seed(points, target_clusters, DEFAULT_SEED)
}

pub fn cluster_with_seed(points: &[Option<(f64, f64)>], target_clusters: usize, seed: u64) -> Vec<i32> {
    let located: Vec<(usize, (f64, f64))> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.filter(|(lat, lng)| lat.is_finite() && lng.is_finite()).map(|p| (i, p)))
        .collect();

    let mut labels = vec![NO_COORDINATE; points.len()];
    if located.is_empty() {
        return labels;
    }
    if located.len() < points.len() {
        warn!(
            missing = points.len() - located.len(),
            "points without coordinates left unclustered"
        );
    }

    let k = target_clusters.clamp(1, located.len());
    let coords: Vec<(f64, f64)> = located.iter().map(|(_, p)| *p).collect();
    let mut rng = SmallRng::seed_from_u64(seed);
    let assignment = kmeans(&coords, k, &mut rng);

    // renumber by first appearance
    let mut renumber = vec![None; k];
    let mut next = 0;
    for (&(index, _), &cluster) in located.iter().zip(assignment.iter()) {
        let label = *renumber[cluster].get_or_insert_with(|| {
            next += 1;
            next - 1
        });
        labels[index] = label;
    }

    labels
}

/// Cluster labels for `orders`.
///
/// Orders with an explicit region keep it. The rest are clustered among
/// themselves, with computed labels shifted past the largest explicit one so
/// the two never collide. Unlocated orders without a region stay at `-1`.
pub fn region_labels<O: Order>(orders: &[O], target_clusters: usize) -> Vec<i32> {
    let offset = orders
        .iter()
        .filter_map(|order| order.region())
        .max()
        .map_or(0, |max| max.saturating_add(1).max(0));

    let unlabeled: Vec<usize> = (0..orders.len()).filter(|&i| orders[i].region().is_none()).collect();
    let points: Vec<Option<(f64, f64)>> = unlabeled.iter().map(|&i| orders[i].location()).collect();
    let computed = cluster(&points, target_clusters);

    let mut labels: Vec<i32> = orders.iter().map(|order| order.region().unwrap_or(NO_COORDINATE)).collect();
    for (&index, &label) in unlabeled.iter().zip(&computed) {
        labels[index] = if label == NO_COORDINATE { NO_COORDINATE } else { label + offset };
    }
    labels
}

fn kmeans(points: &[(f64, f64)], k: usize, rng: &mut SmallRng) -> Vec<usize> {
    let mut centroids = kmeans_plus_plus(points, k, rng);
    let mut assignment = vec![0; points.len()];

    for iteration in 0..MAX_ITERATIONS {
        for (i, point) in points.iter().enumerate() {
            assignment[i] = nearest(point, &centroids).0;
        }

        let mut sums = vec![(0.0, 0.0, 0usize); k];
        for (point, &c) in points.iter().zip(assignment.iter()) {
            sums[c].0 += point.0;
            sums[c].1 += point.1;
            sums[c].2 += 1;
        }

        let mut shift: f64 = 0.0;
        for (c, &(lat, lng, count)) in sums.iter().enumerate() {
            let updated = if count > 0 {
                (lat / count as f64, lng / count as f64)
            } else {
                // reseed an empty cluster at the point worst served by its centroid
                let (far, _) = points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (i, squared_distance(p, &centroids[assignment[i]])))
                    .fold((0, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
                points[far]
            };
            shift = shift.max(squared_distance(&centroids[c], &updated));
            centroids[c] = updated;
        }

        if shift <= TOLERANCE {
            debug!(iteration, k, "k-means converged");
            break;
        }
    }

    for (i, point) in points.iter().enumerate() {
        assignment[i] = nearest(point, &centroids).0;
    }
    assignment
}

fn kmeans_plus_plus(points: &[(f64, f64)], k: usize, rng: &mut SmallRng) -> Vec<(f64, f64)> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<f64> = points.iter().map(|p| nearest(p, &centroids).1).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // every remaining point coincides with a centroid
            centroids.push(points[centroids.len() % points.len()]);
            continue;
        }
        let mut target = rng.gen_range(0.0..total);
        let mut chosen = points.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        centroids.push(points[chosen]);
    }

    centroids
}

fn nearest(point: &(f64, f64), centroids: &[(f64, f64)]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

fn squared_distance(a: &(f64, f64), b: &(f64, f64)) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}
