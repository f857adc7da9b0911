//! The embeddable SAT state.
//!
//! [`SatState`] owns the whole propositional state and maps the public
//! operations onto the engine internals. It is single threaded: every
//! operation runs to completion on the calling thread, and distinct states
//! are fully independent.
use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Error;
use partial_ref::{IntoPartialRefMut, PartialRef};

use crate::cdcl;
use crate::clause::{AssertingClause, ClauseId};
use crate::cnf::CnfFormula;
use crate::context::Context;
use crate::dimacs::DimacsParser;
use crate::lit::{Lit, Var};
use crate::load::load_formula;
use crate::state::StateError;
use crate::undo::{undo_frame, undo_root_frame};

/// CDCL propositional state: variables, literals, clauses and the decision
/// stack.
///
/// The state is constructed once from a clause set and then driven by a
/// caller-provided search or knowledge-compilation loop through
/// [`decide_literal`](SatState::decide_literal),
/// [`undo_decide_literal`](SatState::undo_decide_literal),
/// [`assert_clause`](SatState::assert_clause) and the unit resolution hooks.
/// Out-of-range lookups answer `None`; precondition violations answer a
/// [`StateError`]; conflicts are values, not errors.
pub struct SatState {
    ctx: Box<Context>,
}

impl SatState {
    /// Construct a state from a formula.
    pub fn from_formula(formula: &CnfFormula) -> SatState {
        let mut state = SatState {
            ctx: Box::new(Context::default()),
        };
        {
            let mut ctx = state.ctx.into_partial_ref_mut();
            load_formula(ctx.borrow(), formula);
        }
        state
    }

    /// Construct a state from DIMACS CNF input.
    ///
    /// This is the only I/O the engine performs; nothing is held open
    /// afterwards. Malformed input is rejected here.
    pub fn from_dimacs(input: impl io::Read) -> Result<SatState, Error> {
        let formula = DimacsParser::parse(input)?;
        Ok(SatState::from_formula(&formula))
    }

    /// Construct a state from a DIMACS CNF file.
    pub fn from_dimacs_file(path: impl AsRef<Path>) -> Result<SatState, Error> {
        SatState::from_dimacs(File::open(path)?)
    }

    /// Number of variables of the formula.
    pub fn var_count(&self) -> usize {
        self.ctx.assignment.assignment().len()
    }

    /// Number of original clauses of the formula.
    pub fn clause_count(&self) -> usize {
        self.ctx.clause_db.original_count()
    }

    /// Number of learned clauses added since construction.
    pub fn learned_clause_count(&self) -> usize {
        self.ctx.clause_db.learned_count()
    }

    /// Current decision level; level 1 means no decision is active.
    pub fn decision_level(&self) -> usize {
        self.ctx.trail.current_level()
    }

    /// Whether a root-level contradiction was found.
    pub fn unsat(&self) -> bool {
        self.ctx.solver_state.unsat
    }

    /// The clause synthesized at the most recent conflict.
    pub fn assertion_clause(&self) -> Option<&AssertingClause> {
        self.ctx.solver_state.assertion_clause()
    }

    fn valid_var(&self, var: Var) -> bool {
        var.index() < self.var_count()
    }

    fn check_lit(&self, lit: Lit) -> Result<(), StateError> {
        if self.valid_var(lit.var()) {
            Ok(())
        } else {
            Err(StateError::OutOfRange)
        }
    }

    /// The variable of a 1-based index.
    pub fn index_to_var(&self, index: usize) -> Option<Var> {
        if index >= 1 && index <= self.var_count() {
            Some(Var::from_dimacs(index as isize))
        } else {
            None
        }
    }

    /// The 1-based index of a variable.
    pub fn var_index(&self, var: Var) -> Option<usize> {
        if self.valid_var(var) {
            Some(var.to_dimacs() as usize)
        } else {
            None
        }
    }

    /// The literal of a signed 1-based index.
    pub fn index_to_literal(&self, index: isize) -> Option<Lit> {
        if index != 0 && (index.abs() as usize) <= self.var_count() {
            Some(Lit::from_dimacs(index))
        } else {
            None
        }
    }

    /// The variable of a literal.
    pub fn literal_var(&self, lit: Lit) -> Option<Var> {
        if self.valid_var(lit.var()) {
            Some(lit.var())
        } else {
            None
        }
    }

    /// The positive literal of a variable.
    pub fn pos_literal(&self, var: Var) -> Option<Lit> {
        if self.valid_var(var) {
            Some(var.positive())
        } else {
            None
        }
    }

    /// The negative literal of a variable.
    pub fn neg_literal(&self, var: Var) -> Option<Lit> {
        if self.valid_var(var) {
            Some(var.negative())
        } else {
            None
        }
    }

    /// The opposite literal of the same variable.
    pub fn opp(&self, lit: Lit) -> Option<Lit> {
        if self.valid_var(lit.var()) {
            Some(!lit)
        } else {
            None
        }
    }

    /// Whether a variable was fixed by a decision or by unit resolution.
    pub fn instantiated_var(&self, var: Var) -> Option<bool> {
        if self.valid_var(var) {
            Some(self.ctx.assignment.var_is_instantiated(var))
        } else {
            None
        }
    }

    /// Whether a literal is currently true, by decision or implication.
    pub fn implied_literal(&self, lit: Lit) -> Option<bool> {
        if self.valid_var(lit.var()) {
            Some(self.ctx.assignment.lit_is_true(lit))
        } else {
            None
        }
    }

    /// Whether all original clauses mentioning the variable are subsumed.
    pub fn irrelevant_var(&self, var: Var) -> Option<bool> {
        if self.valid_var(var) {
            Some(
                self.ctx
                    .variables
                    .mentions(var)
                    .iter()
                    .all(|&cid| self.ctx.clause_db.is_subsumed(cid)),
            )
        } else {
            None
        }
    }

    /// Number of original clauses mentioning a variable.
    pub fn var_occurrences(&self, var: Var) -> Option<usize> {
        if self.valid_var(var) {
            Some(self.ctx.variables.num_mentioned(var))
        } else {
            None
        }
    }

    /// The `index`-th original clause mentioning a variable, 0-based, in
    /// construction order.
    pub fn clause_of_var(&self, index: usize, var: Var) -> Option<ClauseId> {
        if self.valid_var(var) {
            self.ctx.variables.mentions(var).get(index).copied()
        } else {
            None
        }
    }

    /// The clause of a 1-based index; learned clauses extend the numbering.
    pub fn index_to_clause(&self, index: usize) -> Option<ClauseId> {
        if index >= 1 && index <= self.ctx.clause_db.count() {
            Some(ClauseId::from_dimacs(index))
        } else {
            None
        }
    }

    /// The 1-based index of a clause.
    pub fn clause_index(&self, cid: ClauseId) -> Option<usize> {
        if self.ctx.clause_db.contains(cid) {
            Some(cid.to_dimacs())
        } else {
            None
        }
    }

    /// The literals of a clause, duplicates removed.
    pub fn clause_lits(&self, cid: ClauseId) -> Option<&[Lit]> {
        if self.ctx.clause_db.contains(cid) {
            Some(self.ctx.clause_db.lits(cid))
        } else {
            None
        }
    }

    /// Number of literals of a clause.
    pub fn clause_len(&self, cid: ClauseId) -> Option<usize> {
        if self.ctx.clause_db.contains(cid) {
            Some(self.ctx.clause_db.len(cid))
        } else {
            None
        }
    }

    /// Whether a clause currently contains a true literal.
    pub fn subsumed_clause(&self, cid: ClauseId) -> Option<bool> {
        if self.ctx.clause_db.contains(cid) {
            Some(self.ctx.clause_db.is_subsumed(cid))
        } else {
            None
        }
    }

    /// Decide a literal and run unit resolution.
    ///
    /// The literal must be unset. Opens a new decision level; returns the
    /// asserting clause when propagation finds a conflict, `None` otherwise.
    /// After a conflict the decision stays in place until the caller walks
    /// back to the asserting clause's assertion level.
    pub fn decide_literal(&mut self, lit: Lit) -> Result<Option<AssertingClause>, StateError> {
        self.check_lit(lit)?;
        if self.ctx.solver_state.unsat {
            return Err(StateError::Unsat);
        }
        if self.ctx.assignment.var_is_instantiated(lit.var()) {
            return Err(StateError::AlreadyAssigned(lit));
        }

        let mut ctx = self.ctx.into_partial_ref_mut();
        Ok(cdcl::decide(ctx.borrow(), lit))
    }

    /// Undo the most recent decision and all assignments it implied.
    ///
    /// The state afterwards is observationally identical to the instant
    /// before the matched [`decide_literal`](SatState::decide_literal).
    pub fn undo_decide_literal(&mut self) -> Result<(), StateError> {
        if self.decision_level() <= 1 {
            return Err(StateError::NoDecision);
        }

        let mut ctx = self.ctx.into_partial_ref_mut();
        undo_frame(ctx.borrow());
        Ok(())
    }

    /// Apply unit resolution at level 1, before any decision.
    ///
    /// Forces the literals of all natively unit clauses and computes the
    /// closure. Returns `false` on a contradiction, which at the root level
    /// is final: the formula is unsatisfiable.
    pub fn unit_resolution(&mut self) -> bool {
        let mut ctx = self.ctx.into_partial_ref_mut();
        cdcl::unit_resolution(ctx.borrow())
    }

    /// Undo the initial unit resolution.
    ///
    /// All decisions must have been undone already.
    pub fn undo_unit_resolution(&mut self) -> Result<(), StateError> {
        if self.decision_level() != 1 {
            return Err(StateError::PendingDecisions);
        }

        let mut ctx = self.ctx.into_partial_ref_mut();
        undo_root_frame(ctx.borrow());
        Ok(())
    }

    /// Whether the engine is at the clause's assertion level.
    pub fn at_assertion_level(&self, clause: &AssertingClause) -> bool {
        clause.assertion_level() == self.decision_level()
    }

    /// Add an asserting clause to the learned set and run unit resolution.
    ///
    /// The clause must have been produced by this state's conflict analysis
    /// and the engine must be at its assertion level. Ownership transfers
    /// into the state. Returns a fresh asserting clause when the propagation
    /// of the asserted literal runs into another conflict.
    pub fn assert_clause(
        &mut self,
        clause: AssertingClause,
    ) -> Result<Option<AssertingClause>, StateError> {
        if self.ctx.solver_state.unsat {
            return Err(StateError::Unsat);
        }
        for &lit in clause.lits() {
            self.check_lit(lit)?;
        }
        if !self.at_assertion_level(&clause) {
            return Err(StateError::NotAtAssertionLevel {
                assertion_level: clause.assertion_level(),
                current_level: self.decision_level(),
            });
        }

        let mut ctx = self.ctx.into_partial_ref_mut();
        Ok(cdcl::assert_clause(ctx.borrow(), clause))
    }

    /// Weight of a literal for model counting; constant 1 in this engine.
    pub fn literal_weight(&self, _lit: Lit) -> f64 {
        1.0
    }

    /// Caller-reserved mark flag of a variable.
    pub fn marked_var(&self, var: Var) -> Option<bool> {
        if self.valid_var(var) {
            Some(self.ctx.variables.marked(var))
        } else {
            None
        }
    }

    /// Set the caller-reserved mark flag of a variable.
    pub fn mark_var(&mut self, var: Var) -> Result<(), StateError> {
        if self.valid_var(var) {
            self.ctx.variables.set_marked(var, true);
            Ok(())
        } else {
            Err(StateError::OutOfRange)
        }
    }

    /// Clear the caller-reserved mark flag of a variable.
    pub fn unmark_var(&mut self, var: Var) -> Result<(), StateError> {
        if self.valid_var(var) {
            self.ctx.variables.set_marked(var, false);
            Ok(())
        } else {
            Err(StateError::OutOfRange)
        }
    }

    /// Caller-reserved mark flag of a clause.
    pub fn marked_clause(&self, cid: ClauseId) -> Option<bool> {
        if self.ctx.clause_db.contains(cid) {
            Some(self.ctx.clause_db.marked(cid))
        } else {
            None
        }
    }

    /// Set the caller-reserved mark flag of a clause.
    pub fn mark_clause(&mut self, cid: ClauseId) -> Result<(), StateError> {
        if self.ctx.clause_db.contains(cid) {
            self.ctx.clause_db.set_marked(cid, true);
            Ok(())
        } else {
            Err(StateError::OutOfRange)
        }
    }

    /// Clear the caller-reserved mark flag of a clause.
    pub fn unmark_clause(&mut self, cid: ClauseId) -> Result<(), StateError> {
        if self.ctx.clause_db.contains(cid) {
            self.ctx.clause_db.set_marked(cid, false);
            Ok(())
        } else {
            Err(StateError::OutOfRange)
        }
    }
}
