//! The solver-adapter boundary.
//!
//! A [`Solver`] consumes a read-only [`CanonicalModel`] and returns a
//! [`SolveResult`]. Infeasible and unbounded outcomes are ordinary result
//! values, not errors: "no feasible blend exists" is a legitimate answer
//! to a well-formed model, distinct from a modelling bug. The column
//! solution is only populated for optimal solves and must not be assumed
//! otherwise; dual values are optional and back-end dependent.

#[cfg(feature = "gurobi")]
pub mod gurobi;
#[cfg(feature = "microlp")]
pub mod microlp;

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use crate::lp::{CanonicalModel, Col, Row};

#[cfg(feature = "gurobi")]
pub use gurobi::GurobiSolver;
#[cfg(feature = "microlp")]
pub use microlp::MicrolpSolver;

/// Optimization direction, passed alongside the model so the same
/// canonical form can serve either sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// Outcome classification of one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The back end failed for reasons unrelated to the model's geometry.
    Error(String),
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::Unbounded => write!(f, "Unbounded"),
            SolveStatus::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// What a back end hands back.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    /// The objective value; populated for optimal solves.
    pub objective: Option<f64>,
    /// One value per column; populated for optimal solves.
    pub columns: Option<TiVec<Col, f64>>,
    /// One dual value per row, when the back end provides them.
    pub row_duals: Option<TiVec<Row, f64>>,
}

impl SolveResult {
    pub fn optimal(
        objective: f64,
        columns: TiVec<Col, f64>,
        row_duals: Option<TiVec<Row, f64>>,
    ) -> Self {
        SolveResult {
            status: SolveStatus::Optimal,
            objective: Some(objective),
            columns: Some(columns),
            row_duals,
        }
    }

    /// A result that carries only a status, e.g. infeasible or unbounded.
    pub fn without_solution(status: SolveStatus) -> Self {
        SolveResult {
            status,
            objective: None,
            columns: None,
            row_duals: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// A linear-programming back end. Implementations receive the canonical
/// form read-only and are free to be internally parallel; cancellation and
/// timeouts are their concern, not the compiler's.
pub trait Solver {
    fn solve(&mut self, model: &CanonicalModel, direction: Direction) -> SolveResult;
}
