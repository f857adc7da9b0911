//! Per-literal occurrence lists.
//!
//! For every literal this records the original and learned clauses that
//! contain it. Assignments use these lists to find every affected clause:
//! the clauses of the newly true literal become subsumed, the clauses of its
//! opposite lose one free literal. Propagation is driven by exact counts
//! rather than watched literals, so the lists are complete, and nothing ever
//! needs to move between lists when the assignment changes.
use crate::clause::ClauseId;
use crate::lit::Lit;

/// Per-literal occurrence lists over all clauses.
#[derive(Default)]
pub struct OccurLists {
    lists: Vec<Vec<ClauseId>>,
}

impl OccurLists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.lists.resize(count * 2, vec![]);
    }

    /// Clauses containing the given literal, in insertion order.
    pub fn occurs(&self, lit: Lit) -> &[ClauseId] {
        &self.lists[lit.code()]
    }

    /// Record that a clause contains the given literal.
    pub fn add(&mut self, lit: Lit, cid: ClauseId) {
        self.lists[lit.code()].push(cid);
    }
}
