//! A CDCL propositional state engine, embeddable by a knowledge-compiler
//! front-end.
//!
//! The library maintains the propositional state (variables, literals,
//! clauses, decision stack), runs counting-based unit propagation with
//! subsumption bookkeeping, synthesizes 1-UIP asserting clauses from
//! conflicts and undoes decisions exactly. It deliberately contains no
//! branching heuristic and no search loop; the caller drives the engine
//! through [`SatState`].
pub mod cnf;
pub mod dimacs;
pub mod lit;

mod analyze_conflict;
mod cdcl;
mod clause;
mod context;
mod load;
mod prop;
mod solver;
mod state;
mod tmp;
mod undo;
mod variables;


pub use clause::{AssertingClause, ClauseId};
pub use cnf::CnfFormula;
pub use lit::{Lit, Var};
pub use solver::SatState;
pub use state::StateError;
