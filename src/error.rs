//! Structured diagnostics returned instead of a solution.

use serde::Serialize;
use thiserror::Error;

/// Why a solve produced no solution.
///
/// Structural problems (`EmptyInput`, `MissingField`, `MalformedMatrix`) are
/// detected before solving. `InsufficientCapacity` is the cheap aggregate
/// check. `Infeasible` and `TimedOut` come out of the search itself and are
/// kept apart so callers can decide between adding capacity and adding time.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum Diagnostic {
    #[error("{entity} is empty or was not provided")]
    EmptyInput { entity: String },

    #[error("required fields missing from {entity}: {}", fields.join(", "))]
    MissingField { entity: String, fields: Vec<String> },

    #[error("malformed distance matrix: {reason}")]
    MalformedMatrix { reason: String },

    #[error("total demand ({total_demand}) exceeds total fleet capacity ({total_capacity})")]
    InsufficientCapacity {
        total_demand: i64,
        total_capacity: i64,
    },

    #[error("no feasible assignment: {reason}")]
    Infeasible { reason: String },

    #[error("time budget exhausted after {elapsed_ms} ms without a complete feasible assignment")]
    TimedOut { elapsed_ms: u64 },
}

impl Diagnostic {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::EmptyInput { .. } => "EmptyInput",
            Diagnostic::MissingField { .. } => "MissingField",
            Diagnostic::MalformedMatrix { .. } => "MalformedMatrix",
            Diagnostic::InsufficientCapacity { .. } => "InsufficientCapacity",
            Diagnostic::Infeasible { .. } => "Infeasible",
            Diagnostic::TimedOut { .. } => "TimedOut",
        }
    }

    /// True for problems fixed by supplying corrected input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Diagnostic::EmptyInput { .. }
                | Diagnostic::MissingField { .. }
                | Diagnostic::MalformedMatrix { .. }
        )
    }
}
