//! Data associated with variables.
use crate::clause::ClauseId;
use crate::lit::Var;

/// Per-variable side tables.
#[derive(Default)]
pub struct Variables {
    /// Original clauses mentioning the variable, in construction order. A
    /// clause containing both polarities appears once. Stable after
    /// construction: learned clauses are not recorded here.
    mentions: Vec<Vec<ClauseId>>,
    /// Uninterpreted flags reserved for the caller.
    marks: Vec<bool>,
}

impl Variables {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.mentions.resize(count, vec![]);
        self.marks.resize(count, false);
    }

    /// Record that an original clause mentions a variable.
    pub fn add_mention(&mut self, var: Var, cid: ClauseId) {
        self.mentions[var.index()].push(cid);
    }

    /// The original clauses mentioning a variable, in construction order.
    pub fn mentions(&self, var: Var) -> &[ClauseId] {
        &self.mentions[var.index()]
    }

    /// Number of original clauses mentioning a variable.
    pub fn num_mentioned(&self, var: Var) -> usize {
        self.mentions[var.index()].len()
    }

    /// Caller-reserved mark flag.
    pub fn marked(&self, var: Var) -> bool {
        self.marks[var.index()]
    }

    /// Set or clear the caller-reserved mark flag.
    pub fn set_marked(&mut self, var: Var, mark: bool) {
        self.marks[var.index()] = mark;
    }
}
