//! Exact inverses of propagation.
//!
//! Undo walks a frame's implication list in reverse enqueue order, the
//! decision literal last. For each literal that was actually set it restores
//! the truth values and the per-clause counters; for literals a conflict left
//! enqueued but unset it only detaches the recorded reason. Implication-graph
//! edges are removed tail-first, which is the exact reverse of the order they
//! were pushed in, so the graph of the remaining levels is untouched.
use partial_ref::{partial, PartialRef};

use crate::context::{
    AssignmentP, ClauseDbP, Context, ImplGraphP, OccurListsP, SolverStateP, TrailP,
};
use crate::lit::Lit;

/// Undo a single assignment or enqueued forcing.
pub fn undo_set_literal(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        OccurListsP,
    ),
    lit: Lit,
) {
    let (occurs, mut ctx) = ctx.split_part(OccurListsP);

    if ctx.part(AssignmentP).lit_is_true(lit) {
        // Clauses of the opposite literal regain a free literal, unless they
        // are still subsumed by an assignment made earlier than this one.
        // This runs before the subsumption pass: a clause containing both
        // polarities must stay frozen here, exactly mirroring the set order.
        for &cid in occurs.occurs(!lit) {
            let db = ctx.part_mut(ClauseDbP);
            if !db.is_subsumed(cid) {
                db.inc_free_lits(cid);
            }
        }

        for &cid in occurs.occurs(lit) {
            let db = ctx.part_mut(ClauseDbP);
            if db.subsumed_on(cid) == Some(lit) {
                db.clear_subsumed(cid);
            }
        }

        ctx.part_mut(AssignmentP).clear_var(lit.var());
    }

    detach_reason(ctx.borrow(), lit);
}

/// Remove a literal's recorded reason and the graph edges it created.
fn detach_reason(
    mut ctx: partial!(Context, mut ImplGraphP, ClauseDbP),
    lit: Lit,
) {
    let reason = match ctx.part(ImplGraphP).reason(lit) {
        Some(reason) => reason,
        None => return,
    };

    let (db, mut ctx) = ctx.split_part(ClauseDbP);
    for &other in db.lits(reason) {
        if other != lit {
            let child = ctx.part_mut(ImplGraphP).pop_child(other.var());
            debug_assert_eq!(child, Some(lit));
        }
    }

    ctx.part_mut(ImplGraphP).set_reason(lit, None);
}

/// Undo the most recent decision frame.
///
/// Restores the state to the instant before the matched decision, clearing
/// any stored asserting clause. Must not be called on the root frame.
pub fn undo_frame(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TrailP,
        OccurListsP,
    ),
) {
    let frame = ctx.part_mut(TrailP).pop_frame();

    for &lit in frame.units.iter().rev() {
        undo_set_literal(ctx.borrow(), lit);
    }
    if let Some(decision) = frame.decision {
        undo_set_literal(ctx.borrow(), decision);
    }

    ctx.part_mut(SolverStateP).clear_assertion_clause();
}

/// Undo the initial resolution, dismantling the root frame's implications.
///
/// The root frame itself stays in place so the engine remains at level 1.
pub fn undo_root_frame(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TrailP,
        OccurListsP,
    ),
) {
    let units = ctx.part_mut(TrailP).take_root_units();

    for &lit in units.iter().rev() {
        undo_set_literal(ctx.borrow(), lit);
    }

    ctx.part_mut(SolverStateP).clear_assertion_clause();
}
