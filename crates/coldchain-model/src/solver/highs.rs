//! HiGHS backend for the [`MipSolver`] trait.

use std::time::Instant;

use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::debug;

use coldchain_core::{PlanError, PlanResult};

use crate::model::{ModelSpec, RowSense};
use crate::solver::{MipSolver, SolveConfig, SolveOutcome, TerminationCondition};

/// Thin adapter over the HiGHS MIP solver.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl MipSolver for HighsSolver {
    fn id(&self) -> &str {
        "highs"
    }

    fn solve(&self, model: &ModelSpec, config: &SolveConfig) -> PlanResult<SolveOutcome> {
        let start = Instant::now();
        let n_vars = model.num_vars();

        // Objective coefficients, dense over the variable pool.
        let mut objective = vec![0.0; n_vars];
        for (var, coef) in model.objective().terms() {
            objective[var.index()] += coef;
        }

        let mut problem = RowProblem::default();
        let mut cols = Vec::with_capacity(n_vars);
        for (i, spec) in model.vars().iter().enumerate() {
            let col = match (spec.integer, spec.upper.is_finite()) {
                (true, true) => problem.add_integer_column(objective[i], spec.lower..=spec.upper),
                (true, false) => problem.add_integer_column(objective[i], spec.lower..),
                (false, true) => problem.add_column(objective[i], spec.lower..=spec.upper),
                (false, false) => problem.add_column(objective[i], spec.lower..),
            };
            cols.push(col);
        }

        for row in model.rows() {
            let rhs = row.rhs - row.expr.constant();
            let terms = row
                .expr
                .terms()
                .map(|(var, coef)| (cols[var.index()], coef));
            match row.sense {
                RowSense::Eq => problem.add_row(rhs..=rhs, terms),
                RowSense::Le => problem.add_row(..=rhs, terms),
                RowSense::Ge => problem.add_row(rhs.., terms),
            };
        }

        let mut solver_model = problem.optimise(Sense::Minimise);
        solver_model.set_option("time_limit", config.time_limit_seconds);
        solver_model.set_option("mip_rel_gap", config.mip_gap);
        solver_model.set_option("output_flag", config.verbose);

        let solved = solver_model.solve();
        let status = solved.status();
        let termination = match status {
            HighsModelStatus::Optimal => TerminationCondition::Optimal,
            HighsModelStatus::ReachedTimeLimit => TerminationCondition::TimeLimitReached,
            // An incumbent without an optimality proof.
            HighsModelStatus::ReachedIterationLimit => TerminationCondition::Feasible,
            HighsModelStatus::Infeasible => {
                return Err(PlanError::infeasible(
                    TerminationCondition::Infeasible.to_string(),
                ));
            }
            HighsModelStatus::Unbounded => {
                return Err(PlanError::solver(format!(
                    "model {}",
                    TerminationCondition::Unbounded
                )));
            }
            other => {
                return Err(PlanError::solver(format!(
                    "unusable solver status {:?}",
                    other
                )));
            }
        };

        let solution = solved.get_solution();
        let values = solution.columns().to_vec();
        if values.len() != n_vars {
            // A time-limit stop without any incumbent loaded.
            return Err(PlanError::solver(format!(
                "no incumbent loaded (status {:?})",
                status
            )));
        }

        let objective_value = model.objective().evaluate(&values);
        let mip_gap = match termination {
            TerminationCondition::Optimal => Some(0.0),
            _ => None,
        };
        let solve_seconds = start.elapsed().as_secs_f64();
        debug!(
            solver = self.id(),
            ?termination,
            objective = objective_value,
            seconds = solve_seconds,
            "solve finished"
        );

        Ok(SolveOutcome {
            termination,
            objective_value,
            values,
            mip_gap,
            solve_seconds,
        })
    }
}
