use std::fmt;

use log::trace;
use serde::Serialize;

use crate::lp::{Bounds, CanonicalModel, Constraint, Error, LinearExpr, Model, Relation};
use crate::report::SolutionReport;
use crate::solver::{Direction, SolveResult, SolveStatus, Solver};

use super::sets_and_parameters::BlendProblem;

/// Compiles a [`BlendProblem`] into canonical LP form:
///
/// - one non-negative quantity variable per feed,
/// - an equality row pinning the total flow to the target amount,
/// - one minimum-content row per component,
/// - the purchase-cost objective.
///
/// All data flows through the model's parameter store, so a feed missing
/// from one of the input tables aborts compilation instead of entering the
/// matrix as a silent zero.
pub struct BlendModel {
    model: Model,
}

impl BlendModel {
    pub fn new(problem: &BlendProblem) -> Result<Self, Error> {
        trace!(
            "building blend model: {} feeds, {} components",
            problem.feeds.len(),
            problem.components.len()
        );

        let mut model = Model::new("blend");
        let feeds = model.define_set("feeds", problem.feeds.iter())?;
        let components = model.define_set("components", problem.components.iter())?;

        model.declare_param("cost", &[feeds])?;
        model.declare_param("content", &[feeds, components])?;
        model.declare_param("req_min", &[components])?;
        model.declare_param("total_blend", &[])?;

        for (feed, &cost) in &problem.costs {
            model.set_param("cost", &[feed.into()], cost)?;
        }
        for (feed, fractions) in &problem.content {
            for (component, &fraction) in fractions {
                model.set_param("content", &[feed.into(), component.into()], fraction)?;
            }
        }
        for (component, &fraction) in &problem.req_min {
            model.set_param("req_min", &[component.into()], fraction)?;
        }
        model.set_param("total_blend", &[], problem.total_blend)?;

        model.declare_vars("x", feeds, Bounds::non_negative())?;

        // sum(x) == total_blend
        model.equation("total_flow", Relation::Equal, |s| {
            let mut lhs = LinearExpr::new();
            for feed in s.set("feeds")?.labels() {
                lhs.add(s.var("x", feed)?, 1.0);
            }
            Ok(Constraint {
                lhs,
                rhs: s.scalar_param("total_blend")?,
            })
        })?;

        // sum(content[f, c] * x[f]) >= req_min[c] * total_blend, per component
        model.equation_over("min_content", components, Relation::GreaterEqual, |s, c| {
            let mut lhs = LinearExpr::new();
            for feed in s.set("feeds")?.labels() {
                lhs.add(
                    s.var("x", feed)?,
                    s.param("content", &[feed.clone(), c.clone()])?,
                );
            }
            Ok(Constraint {
                lhs,
                rhs: s.param("req_min", &[c.clone()])? * s.scalar_param("total_blend")?,
            })
        })?;

        // minimize sum(cost[f] * x[f])
        model.set_objective("total_cost", |s| {
            let mut expr = LinearExpr::new();
            for feed in s.set("feeds")?.labels() {
                expr.add(s.var("x", feed)?, s.param("cost", &[feed.clone()])?);
            }
            Ok(expr)
        });

        Ok(BlendModel { model })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Assemble the canonical form without solving.
    pub fn compile(&self) -> Result<CanonicalModel, Error> {
        self.model.compile()
    }

    /// Compile and hand the model to `solver`, minimizing total cost.
    pub fn solve(&self, solver: &mut dyn Solver) -> Result<BlendReport, Error> {
        let canonical = self.compile()?;
        let result = solver.solve(&canonical, Direction::Minimize);
        Ok(BlendReport::new(&self.model, &result))
    }
}

/// The blend decision, keyed by feed label.
#[derive(Debug, Clone, Serialize)]
pub struct BlendReport {
    pub status: SolveStatus,
    /// Total purchase cost; present for optimal solves.
    pub total_cost: Option<f64>,
    /// Quantity per feed, in feed declaration order; empty unless optimal.
    pub quantities: Vec<(String, f64)>,
}

impl BlendReport {
    fn new(model: &Model, result: &SolveResult) -> Self {
        let report = SolutionReport::new(model, result);
        let quantities = report
            .values
            .iter()
            .filter(|v| v.block == "x")
            .map(|v| {
                let feed = v.label.as_ref().map(ToString::to_string).unwrap_or_default();
                (feed, v.value)
            })
            .collect();

        BlendReport {
            status: report.status,
            total_cost: report.objective,
            quantities,
        }
    }

    pub fn quantity(&self, feed: &str) -> Option<f64> {
        self.quantities
            .iter()
            .find(|(name, _)| name == feed)
            .map(|&(_, q)| q)
    }
}

impl fmt::Display for BlendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        if let Some(cost) = self.total_cost {
            writeln!(f, "Minimum total cost: {:.2}", cost)?;
        }
        if !self.quantities.is_empty() {
            writeln!(f, "Feed quantities:")?;
            for (feed, quantity) in &self.quantities {
                writeln!(f, "  {}: {:.2} units", feed, quantity)?;
            }
        }
        Ok(())
    }
}
