//! The implication graph.
//!
//! This is a DAG over the assigned literals. Sources are decisions and the
//! literals forced by size-1 clauses; every other assignment has incoming
//! edges from the falsified literals of its forcing clause. Forward edges are
//! kept explicitly in per-variable `children` lists so that conflict analysis
//! can search the graph from the decision towards the conflict.
use crate::clause::ClauseId;
use crate::lit::{Lit, LitIdx, Var};

/// The implication graph.
#[derive(Default)]
pub struct ImplGraph {
    /// Forcing clause per literal code.
    ///
    /// Indexed by literal, not variable: a conflict can leave both polarities
    /// of a variable enqueued with distinct forcing clauses, and the undo
    /// machinery has to detach each reason separately. `None` for decisions
    /// and unset literals.
    reasons: Vec<Option<ClauseId>>,
    /// Decision level per variable. Stale for uninstantiated variables.
    levels: Vec<LitIdx>,
    /// Forced literals whose forcing clause falsifies this variable.
    ///
    /// Only instantiated variables can own children. Entries are pushed in
    /// forcing order and popped tail-first on undo.
    children: Vec<Vec<Lit>>,
}

impl ImplGraph {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.reasons.resize(count * 2, None);
        self.levels.resize(count, 0);
        self.children.resize(count, vec![]);
    }

    /// The clause that forced a literal, `None` for decisions and unset
    /// literals.
    pub fn reason(&self, lit: Lit) -> Option<ClauseId> {
        self.reasons[lit.code()]
    }

    pub fn set_reason(&mut self, lit: Lit, reason: Option<ClauseId>) {
        self.reasons[lit.code()] = reason;
    }

    /// Decision level of an assigned variable. Stale if unassigned.
    pub fn level(&self, var: Var) -> usize {
        self.levels[var.index()] as usize
    }

    pub fn set_level(&mut self, var: Var, level: usize) {
        self.levels[var.index()] = level as LitIdx;
    }

    /// Implication-graph successors of a variable's assigned literal.
    pub fn children(&self, var: Var) -> &[Lit] {
        &self.children[var.index()]
    }

    pub fn add_child(&mut self, var: Var, child: Lit) {
        self.children[var.index()].push(child);
    }

    /// Remove the most recently added successor of a variable.
    ///
    /// Undo dismantles frames youngest-first, so the edge to remove is always
    /// at the tail.
    pub fn pop_child(&mut self, var: Var) -> Option<Lit> {
        self.children[var.index()].pop()
    }
}
