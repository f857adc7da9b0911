//! Decision management and clause learning.
//!
//! This module sequences the engine operations: deciding a literal, running
//! unit resolution, and asserting a learned clause. The outer search loop and
//! the branching heuristic belong to the caller; every operation here runs to
//! completion and reports conflicts by value.
use log::debug;
use partial_ref::{partial, PartialRef};

use crate::analyze_conflict::analyze_conflict;
use crate::clause::{AssertingClause, ClauseId};
use crate::context::{
    AnalyzeConflictP, AssignmentP, ClauseDbP, Context, ImplGraphP, OccurListsP, SolverStateP,
    TrailP,
};
use crate::lit::Lit;
use crate::prop::{enqueue_forced, enqueue_unit_clauses, find_unit_lit, propagate, set_literal};

/// Decide a literal and propagate its consequences.
///
/// Opens a new decision level. On a conflict the asserting clause is
/// synthesized, stored as the engine's current assertion clause and returned;
/// the decision frame stays in place so the caller can walk back to the
/// clause's assertion level.
pub fn decide(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TrailP,
        OccurListsP,
    ),
    lit: Lit,
) -> Option<AssertingClause> {
    ctx.part_mut(TrailP).push_frame(lit);

    let mut conflict = set_literal(ctx.borrow(), lit);
    if conflict.is_none() {
        conflict = propagate(ctx.borrow());
    }

    conflict.map(|cid| handle_conflict(ctx.borrow(), cid))
}

/// Apply unit resolution at the current level.
///
/// This is the explicit hook for the initial resolution at level 1: all
/// natively unit clauses are enqueued and the closure of forced literals is
/// computed. Returns `false` when a contradiction is found; a contradiction
/// at the root level is unrecoverable and marks the whole formula
/// unsatisfiable.
pub fn unit_resolution(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TrailP,
        OccurListsP,
    ),
) -> bool {
    if ctx.part(SolverStateP).unsat {
        return false;
    }

    enqueue_unit_clauses(ctx.borrow());

    match propagate(ctx.borrow()) {
        None => true,
        Some(cid) => {
            handle_conflict(ctx.borrow(), cid);
            false
        }
    }
}

/// Add a learned clause to the database and propagate the unit it creates.
///
/// Must be called at the clause's assertion level. Returns a new asserting
/// clause when propagation runs into a secondary conflict.
pub fn assert_clause(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut OccurListsP,
        mut SolverStateP,
        mut TrailP,
    ),
    clause: AssertingClause,
) -> Option<AssertingClause> {
    debug_assert_eq!(clause.assertion_level(), ctx.part(TrailP).current_level());

    let assertion_level = clause.assertion_level();
    let lits = clause.into_lits();

    let cid = ctx.part_mut(ClauseDbP).add_learned(&lits, assertion_level);
    for &lit in lits.iter() {
        ctx.part_mut(OccurListsP).add(lit, cid);
    }

    // The clause is wired in under the current partial assignment, so its
    // counters start from the live truth values rather than from scratch.
    let mut free = 0;
    let mut subsumed_on = None;
    for &lit in lits.iter() {
        if ctx.part(AssignmentP).lit_is_unset(lit) {
            free += 1;
        } else if ctx.part(AssignmentP).lit_is_true(lit) && subsumed_on.is_none() {
            subsumed_on = Some(lit);
        }
    }
    ctx.part_mut(ClauseDbP).set_free_lits(cid, free);
    if let Some(lit) = subsumed_on {
        ctx.part_mut(ClauseDbP).set_subsumed_on(cid, lit);
    }

    ctx.part_mut(SolverStateP).clear_assertion_clause();

    let mut conflict = None;
    if subsumed_on.is_none() {
        match free {
            0 => conflict = Some(cid),
            1 => {
                if let Some(unit) = find_unit_lit(ctx.borrow(), cid) {
                    if ctx.part(ImplGraphP).reason(unit).is_none() {
                        enqueue_forced(ctx.borrow(), unit, cid);
                    }
                }
                conflict = propagate(ctx.borrow());
            }
            _ => {}
        }
    }

    conflict.map(|cid| handle_conflict(ctx.borrow(), cid))
}

/// Synthesize, store and report the asserting clause for a conflict.
fn handle_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut SolverStateP,
        AssignmentP,
        ClauseDbP,
        ImplGraphP,
        TrailP,
    ),
    conflict: ClauseId,
) -> AssertingClause {
    let clause = analyze_conflict(ctx.borrow(), conflict);

    debug!(
        "conflict at level {}: asserting clause of {} literals, assertion level {}",
        ctx.part(TrailP).current_level(),
        clause.lits().len(),
        clause.assertion_level(),
    );

    if ctx.part(TrailP).current_level() == 1 {
        // Nothing to backjump to: the formula is contradictory.
        ctx.part_mut(SolverStateP).unsat = true;
    }

    ctx.part_mut(SolverStateP).set_assertion_clause(clause.clone());

    clause
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use satyr_formula::{cnf_formula, lit, lits, var};

    use crate::clause::ClauseId;
    use crate::load::load_formula;
    use crate::test::check_invariants;
    use crate::undo::{undo_frame, undo_root_frame};

    #[test]
    fn propagation_chain_and_subsumption() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                1, 2;
                -1, 3;
                -2, -3;
            ],
        );

        assert_eq!(decide(ctx.borrow(), lit!(1)), None);

        assert_eq!(ctx.part(TrailP).current_level(), 2);
        assert_eq!(ctx.part(TrailP).top().units, vec![lit!(3), lit!(-2)]);

        {
            let db = ctx.part(ClauseDbP);
            assert_eq!(db.subsumed_on(ClauseId::from_dimacs(1)), Some(lit!(1)));
            assert_eq!(db.subsumed_on(ClauseId::from_dimacs(2)), Some(lit!(3)));
            assert_eq!(db.subsumed_on(ClauseId::from_dimacs(3)), Some(lit!(-2)));
        }

        for index in 1..=3isize {
            assert!(ctx
                .part(AssignmentP)
                .var_is_instantiated(var!(index)));
            assert_eq!(ctx.part(ImplGraphP).level(var!(index)), 2);
        }

        check_invariants(ctx.borrow());
    }

    #[test]
    fn undo_restores_the_previous_state() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                1, 2;
                -1, 3;
                -2, -3;
            ],
        );

        assert_eq!(decide(ctx.borrow(), lit!(1)), None);
        undo_frame(ctx.borrow());

        assert_eq!(ctx.part(TrailP).current_level(), 1);
        for index in 1..=3isize {
            assert!(!ctx.part(AssignmentP).var_is_instantiated(var!(index)));
        }
        for cid in ctx.part(ClauseDbP).ids().collect::<Vec<_>>() {
            assert_eq!(ctx.part(ClauseDbP).subsumed_on(cid), None);
            assert_eq!(ctx.part(ClauseDbP).free_lits(cid), 2);
        }

        check_invariants(ctx.borrow());

        // Re-deciding produces the identical implications.
        assert_eq!(decide(ctx.borrow(), lit!(1)), None);
        assert_eq!(ctx.part(TrailP).top().units, vec![lit!(3), lit!(-2)]);
    }

    #[test]
    fn initial_resolution_closes_over_derived_units() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                1, 2;
                -1, 3;
                -2, -3;
                -1;
            ],
        );

        assert!(unit_resolution(ctx.borrow()));

        assert_eq!(ctx.part(TrailP).current_level(), 1);
        assert_eq!(
            ctx.part(TrailP).top().units,
            vec![lit!(-1), lit!(2), lit!(-3)]
        );
        for index in 1..=3isize {
            assert_eq!(ctx.part(ImplGraphP).level(var!(index)), 1);
        }

        // Running the hook again is a no-op.
        assert!(unit_resolution(ctx.borrow()));
        assert_eq!(ctx.part(TrailP).top().units.len(), 3);

        check_invariants(ctx.borrow());

        undo_root_frame(ctx.borrow());
        for index in 1..=3isize {
            assert!(!ctx.part(AssignmentP).var_is_instantiated(var!(index)));
        }
        check_invariants(ctx.borrow());
    }

    #[test]
    fn root_conflict_learns_a_unit_clause() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                1, 2;
                -1, 2;
                -2;
            ],
        );

        assert!(!unit_resolution(ctx.borrow()));
        assert!(ctx.part(SolverStateP).unsat);

        {
            let clause = ctx.part(SolverStateP).assertion_clause().unwrap();
            assert_eq!(clause.lits(), &lits![2][..]);
            assert_eq!(clause.assertion_level(), 1);
        }

        check_invariants(ctx.borrow());
    }

    #[test]
    fn root_conflict_is_unrecoverable() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                1, 2;
                1, 3;
                -2, -3;
                -1;
            ],
        );

        assert!(!unit_resolution(ctx.borrow()));
        assert!(ctx.part(SolverStateP).unsat);
        assert!(ctx.part(SolverStateP).assertion_clause().is_some());

        // The failure is final: the hook keeps reporting it.
        assert!(!unit_resolution(ctx.borrow()));

        check_invariants(ctx.borrow());
    }

    #[test]
    fn uip_is_an_implied_literal() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                -1, 2;
                -2, 3;
                -2, -3;
            ],
        );

        // 1 forces 2, which forces both 3 and -3; every path from the
        // decision to the conflict runs through 2.
        let clause = decide(ctx.borrow(), lit!(1)).expect("expected a conflict");
        assert_eq!(clause.lits(), &lits![-2][..]);
        assert_eq!(clause.assertion_level(), 1);
        assert_eq!(
            ctx.part(SolverStateP).assertion_clause(),
            Some(&clause)
        );

        check_invariants(ctx.borrow());

        undo_frame(ctx.borrow());
        assert_eq!(ctx.part(TrailP).current_level(), 1);

        assert_eq!(assert_clause(ctx.borrow(), clause), None);
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(-2)));
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(-1)));
        assert_eq!(ctx.part(ClauseDbP).learned_count(), 1);

        check_invariants(ctx.borrow());

        // Learned clauses survive the undo of the root resolution and are
        // picked up again by the next initial resolution.
        undo_root_frame(ctx.borrow());
        assert!(ctx.part(AssignmentP).lit_is_unset(lit!(-2)));
        assert_eq!(ctx.part(ClauseDbP).learned_count(), 1);
        check_invariants(ctx.borrow());

        assert!(unit_resolution(ctx.borrow()));
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(-2)));
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(-1)));
        check_invariants(ctx.borrow());
    }

    #[test]
    fn conflict_learns_asserting_clause() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                -1, -2, 3;
                -1, -2, -3;
            ],
        );

        assert_eq!(decide(ctx.borrow(), lit!(1)), None);
        let clause = decide(ctx.borrow(), lit!(2)).expect("expected a conflict");

        assert_eq!(clause.lits(), &lits![-2, -1][..]);
        assert_eq!(clause.assertion_level(), 2);
        assert_eq!(ctx.part(TrailP).current_level(), 3);

        check_invariants(ctx.borrow());

        undo_frame(ctx.borrow());
        assert_eq!(ctx.part(TrailP).current_level(), 2);

        assert_eq!(assert_clause(ctx.borrow(), clause), None);
        assert!(ctx.part(AssignmentP).lit_is_false(lit!(2)));
        assert_eq!(ctx.part(ImplGraphP).level(var!(2)), 2);

        check_invariants(ctx.borrow());
    }

    #[test]
    fn assert_clause_secondary_conflict() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_formula(
            ctx.borrow(),
            &cnf_formula![
                -1, 2;
                -2, 3;
                -2, -3;
                1, 2;
            ],
        );

        let clause = decide(ctx.borrow(), lit!(1)).expect("expected a conflict");
        assert_eq!(clause.lits(), &lits![-2][..]);
        assert_eq!(clause.assertion_level(), 1);

        undo_frame(ctx.borrow());

        // Asserting -2 forces 1 and -1 at the root: the formula is
        // contradictory.
        let secondary = assert_clause(ctx.borrow(), clause).expect("expected a conflict");
        assert_eq!(secondary.lits(), &lits![2][..]);
        assert_eq!(secondary.assertion_level(), 1);
        assert!(ctx.part(SolverStateP).unsat);

        check_invariants(ctx.borrow());

        // Undo still cleanly dismantles the root frame, including the
        // enqueued literal the conflict cut off.
        undo_root_frame(ctx.borrow());
        for index in 1..=3isize {
            assert!(!ctx.part(AssignmentP).var_is_instantiated(var!(index)));
        }
        check_invariants(ctx.borrow());
    }
}
