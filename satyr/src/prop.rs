//! Unit propagation.
//!
//! Propagation is counting based: every clause knows how many of its literals
//! are still unset (`free_lits`) and which literal subsumed it, and every
//! assignment updates the clauses of both polarities through the occurrence
//! lists. A clause whose count drops to one forces its single unset literal,
//! a clause whose count drops to zero is the conflict.
//!
//! The driver has three entry modes: the initial resolution at level 1 over
//! the natively unit clauses, propagation of a fresh decision, and
//! propagation of the unit created by asserting a learned clause. All three
//! feed the same per-frame work list.
pub mod assignment;
pub mod graph;
pub mod occurs;

pub use assignment::{Assignment, DecisionFrame, Trail};
pub use graph::ImplGraph;
pub use occurs::OccurLists;

use partial_ref::{partial, PartialRef};

use crate::clause::ClauseId;
use crate::context::{AssignmentP, ClauseDbP, Context, ImplGraphP, OccurListsP, TrailP};
use crate::lit::Lit;

/// Record a forced literal without setting it.
///
/// Stores the forcing clause as the literal's reason, appends the literal to
/// the current frame's implication list and adds the implication-graph edges
/// from the other literals of the forcing clause. The actual assignment
/// happens when the driver reaches the literal in the work list.
pub fn enqueue_forced(
    mut ctx: partial!(Context, mut ImplGraphP, mut TrailP, ClauseDbP),
    lit: Lit,
    reason: ClauseId,
) {
    debug_assert!(ctx.part(ImplGraphP).reason(lit).is_none());

    ctx.part_mut(ImplGraphP).set_reason(lit, Some(reason));
    ctx.part_mut(TrailP).enqueue(lit);

    let (db, mut ctx) = ctx.split_part(ClauseDbP);
    for &other in db.lits(reason) {
        if other != lit {
            ctx.part_mut(ImplGraphP).add_child(other.var(), lit);
        }
    }
}

/// Make a literal true and update every affected clause.
///
/// Clauses containing the literal become subsumed, clauses containing its
/// opposite lose a free literal. Clauses that become unit enqueue their
/// forced literal at the current decision level; a clause out of free
/// literals is a conflict. The scan always completes, so the bookkeeping for
/// this call is finished even when a conflict is reported.
pub fn set_literal(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut TrailP,
        OccurListsP,
    ),
    lit: Lit,
) -> Option<ClauseId> {
    let level = ctx.part(TrailP).current_level();
    ctx.part_mut(AssignmentP).assign_lit(lit);
    ctx.part_mut(ImplGraphP).set_level(lit.var(), level);

    let (occurs, mut ctx) = ctx.split_part(OccurListsP);

    for &cid in occurs.occurs(lit) {
        let db = ctx.part_mut(ClauseDbP);
        if !db.is_subsumed(cid) {
            db.set_subsumed_on(cid, lit);
        }
    }

    let mut conflict = None;

    for &cid in occurs.occurs(!lit) {
        if ctx.part(ClauseDbP).is_subsumed(cid) {
            continue;
        }
        match ctx.part_mut(ClauseDbP).dec_free_lits(cid) {
            1 => {
                if let Some(unit) = find_unit_lit(ctx.borrow(), cid) {
                    // An earlier clause forced this literal already; the
                    // first recorded reason stands.
                    if ctx.part(ImplGraphP).reason(unit).is_none() {
                        enqueue_forced(ctx.borrow(), unit, cid);
                    }
                }
            }
            0 => {
                if conflict.is_none() {
                    conflict = Some(cid);
                }
            }
            _ => {}
        }
    }

    conflict
}

/// The single unset literal of a unit clause.
pub fn find_unit_lit(ctx: partial!(Context, AssignmentP, ClauseDbP), cid: ClauseId) -> Option<Lit> {
    let assignment = ctx.part(AssignmentP);
    let unit = ctx
        .part(ClauseDbP)
        .lits(cid)
        .iter()
        .copied()
        .find(|&lit| assignment.lit_is_unset(lit));

    debug_assert!(unit.is_some(), "unit clause without an unset literal");
    unit
}

/// Work through the current frame's implication list.
///
/// Returns the first conflict, leaving any enqueued but unprocessed literals
/// in place as a valid work-list suffix for the undo machinery.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut TrailP,
        OccurListsP,
    ),
) -> Option<ClauseId> {
    while let Some(lit) = ctx.part_mut(TrailP).next_queued() {
        debug_assert!(ctx.part(AssignmentP).lit_is_unset(lit));
        if let Some(conflict) = set_literal(ctx.borrow(), lit) {
            return Some(conflict);
        }
    }
    None
}

/// Enqueue every clause that is unit on its own, for the initial resolution
/// at level 1.
///
/// This covers size-1 original clauses and learned clauses whose free count
/// is down to one. Clauses whose unit literal is already forced elsewhere are
/// skipped, which makes the initial resolution idempotent.
pub fn enqueue_unit_clauses(
    mut ctx: partial!(
        Context,
        mut ImplGraphP,
        mut TrailP,
        AssignmentP,
        ClauseDbP,
    ),
) {
    for cid in ctx.part(ClauseDbP).ids() {
        let db = ctx.part(ClauseDbP);
        if db.is_subsumed(cid) || db.free_lits(cid) != 1 {
            continue;
        }
        if let Some(unit) = find_unit_lit(ctx.borrow(), cid) {
            if ctx.part(ImplGraphP).reason(unit).is_none() {
                enqueue_forced(ctx.borrow(), unit, cid);
            }
        }
    }
}
