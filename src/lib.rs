//! `blendlp` turns algebraic blending models (index sets, parameters and
//! symbolic equation families) into the canonical LP form a solver
//! consumes, and resolves solutions back to the model's own labels.
//!
//! The [`lp`] module is the compiler core; [`solver`] is the back-end
//! boundary (with `microlp` as the default back end and Gurobi behind the
//! `gurobi` feature); [`models::blend`] is the blending model itself.
//!
//! ```no_run
//! use blendlp::models::BlendProblem;
//! use blendlp::models::BlendModel;
//!
//! let problem = BlendProblem::from_json(std::fs::File::open("blend.json")?)?;
//! let model = BlendModel::new(&problem)?;
//! let canonical = model.compile()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod lp;
pub mod models;
pub mod report;
pub mod solver;

pub use lp::{CanonicalModel, Error, Model};
pub use report::SolutionReport;
pub use solver::{Direction, SolveResult, SolveStatus, Solver};
