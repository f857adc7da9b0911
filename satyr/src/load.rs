//! Loading a formula into the engine.
use log::info;
use partial_ref::{partial, PartialRef};

use crate::cnf::CnfFormula;
use crate::context::{
    set_var_count, AnalyzeConflictP, AssignmentP, ClauseDbP, Context, ImplGraphP, OccurListsP,
    SolverStateP, TmpDataP, TrailP, VariablesP,
};
use crate::lit::Lit;

/// Add an original clause to the clause database.
///
/// Duplicate literals are removed; the stored clause size reflects the
/// deduplicated clause. Tautological clauses (containing `x` and `-x`) are
/// kept: they become permanently subsumed as soon as either polarity is
/// assigned, and dropping them would shift the caller visible clause
/// numbering. An empty input clause makes the formula contradictory at the
/// root level.
pub fn load_clause(
    mut ctx: partial!(
        Context,
        mut ClauseDbP,
        mut OccurListsP,
        mut SolverStateP,
        mut TmpDataP,
        mut VariablesP,
    ),
    lits: &[Lit],
) {
    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);

    tmp.lits.clear();
    tmp.lits.extend_from_slice(lits);
    tmp.lits.sort_unstable();
    tmp.lits.dedup();

    let cid = ctx.part_mut(ClauseDbP).add_original(&tmp.lits);

    let mut prev_var = None;
    for &lit in tmp.lits.iter() {
        ctx.part_mut(OccurListsP).add(lit, cid);
        // Both polarities of a variable sort adjacently; a variable is
        // mentioned once per clause.
        if prev_var != Some(lit.var()) {
            ctx.part_mut(VariablesP).add_mention(lit.var(), cid);
            prev_var = Some(lit.var());
        }
    }

    if tmp.lits.is_empty() {
        ctx.part_mut(SolverStateP).unsat = true;
    }
}

/// Load a whole formula at construction time.
pub fn load_formula(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut OccurListsP,
        mut SolverStateP,
        mut TmpDataP,
        mut VariablesP,
        TrailP,
    ),
    formula: &CnfFormula,
) {
    debug_assert_eq!(ctx.part(TrailP).current_level(), 1);

    set_var_count(ctx.borrow(), formula.var_count());

    for clause in formula.iter() {
        load_clause(ctx.borrow(), clause);
    }

    info!(
        "formula with {} variables and {} clauses",
        formula.var_count(),
        formula.len()
    );
}
