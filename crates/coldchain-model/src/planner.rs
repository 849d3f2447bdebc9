//! End-to-end solve orchestration.
//!
//! Wires prep -> index -> build -> solve -> extract -> validate -> FEFO.
//! Each call owns its model and variable pool; the dataset is borrowed
//! read-only, and nothing is shared across concurrent solves.

use tracing::info;

use coldchain_core::{PlanResult, PlanningInput};
use coldchain_schemas::{FefoLedger, PlanSolution};

use crate::builder::build_model;
use crate::extract::extract_solution;
use crate::fefo::allocate_batches;
use crate::index::PlanIndex;
use crate::prep::preprocess;
use crate::scale::ScaleFactor;
use crate::solver::{MipSolver, SolveConfig};

/// The pair of artefacts a solve hands to external collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub solution: PlanSolution,
    pub ledger: FefoLedger,
}

/// Solve a planning dataset to a validated result plus batch traces.
///
/// Infeasibility and solver failures surface as errors with their
/// termination condition; a time-limit stop with an incumbent comes back as
/// a normal outcome tagged `time_limit_reached`, and the caller decides
/// whether it suffices.
pub fn solve_plan(
    input: &PlanningInput,
    config: &SolveConfig,
    solver: &dyn MipSolver,
) -> PlanResult<PlanOutcome> {
    let prepared = preprocess(input)?;
    let index = PlanIndex::build(&prepared)?;
    let scale = ScaleFactor::new(config.scale_factor)?;
    let (model, vars) = build_model(&prepared, &index, &scale, config)?;
    info!(
        solver = solver.id(),
        vars = model.num_vars(),
        integers = model.num_integer_vars(),
        rows = model.num_rows(),
        "model handed to solver"
    );

    let outcome = solver.solve(&model, config)?;
    let solution = extract_solution(&prepared, &vars, &outcome, &scale)?;
    let ledger = allocate_batches(&prepared, &solution)?;
    info!(
        termination = %solution.termination,
        cost = solution.costs.total,
        fill = solution.metrics.fill_rate,
        "plan complete"
    );
    Ok(PlanOutcome { solution, ledger })
}
