//! Solver-ready distance matrix.
//!
//! The road-network collaborator hands over a materialized grid of floats
//! keyed by node order (node 0 = depot). Costs are truncated to integers here
//! so route costs accumulate without floating-point drift.

use crate::error::Diagnostic;

/// Largest accepted arc cost; route and solution totals stay within `i64`.
pub const MAX_ARC_COST: f64 = 1e12;

/// Dense n×n integer cost matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    data: Vec<i64>,
    size: usize,
}

impl DistanceMatrix {
    /// Converts raw rows into a matrix.
    ///
    /// Fails with [`Diagnostic::MalformedMatrix`] if the rows do not form a
    /// square grid or hold a negative, non-finite or oversized value.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, Diagnostic> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(Diagnostic::MalformedMatrix {
                    reason: format!("row {} has {} columns, expected {}", i, row.len(), size),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(Diagnostic::MalformedMatrix {
                        reason: format!("entry [{}][{}] is not a non-negative number: {}", i, j, value),
                    });
                }
                if value > MAX_ARC_COST {
                    return Err(Diagnostic::MalformedMatrix {
                        reason: format!("entry [{}][{}] exceeds the largest arc cost: {}", i, j, value),
                    });
                }
                data.push(value as i64);
            }
        }

        Ok(Self { data, size })
    }

    /// Builds a matrix by evaluating `cost` for every ordered pair.
    pub fn from_fn(size: usize, mut cost: impl FnMut(usize, usize) -> i64) -> Self {
        let mut data = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                data.push(cost(i, j));
            }
        }
        Self { data, size }
    }

    /// Cost of travelling from node `from` to node `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> i64 {
        assert!(
            from < self.size && to < self.size,
            "node index ({}, {}) out of range for {}x{} matrix",
            from,
            to,
            self.size,
            self.size
        );
        self.data[from * self.size + to]
    }

    /// Number of nodes (depot included).
    pub fn dimension(&self) -> usize {
        self.size
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (i + 1..self.size).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Total cost of visiting `route` in order (no implicit depot legs).
    pub fn route_distance(&self, route: &[usize]) -> i64 {
        route.windows(2).map(|arc| self.get(arc[0], arc[1])).sum()
    }
}
