//! Central engine data structure.
//!
//! This module defines the `Context` data structure which holds all data used
//! by the engine. It also contains the global notification function invoked
//! when the variable count is established.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use crate::analyze_conflict::AnalyzeConflict;
use crate::clause::ClauseDb;
use crate::prop::{Assignment, ImplGraph, OccurLists, Trail};
use crate::state::SolverState;
use crate::tmp::TmpData;
use crate::variables::Variables;

/// Part declarations for the [`Context`] struct.
pub mod parts {
    use super::*;

    part!(pub AnalyzeConflictP: AnalyzeConflict);
    part!(pub AssignmentP: Assignment);
    part!(pub ClauseDbP: ClauseDb);
    part!(pub ImplGraphP: ImplGraph);
    part!(pub OccurListsP: OccurLists);
    part!(pub SolverStateP: SolverState);
    part!(pub TmpDataP: TmpData);
    part!(pub TrailP: Trail);
    part!(pub VariablesP: Variables);
}

pub use parts::*;

/// Central engine data structure.
///
/// This struct contains all data kept by the engine. Functions operating on
/// multiple fields take partial references provided by the `partial_ref`
/// crate, which documents the data dependencies of each routine and keeps the
/// borrow checker happy without passing many individual references around.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part(AnalyzeConflictP)]
    pub analyze_conflict: AnalyzeConflict,
    #[part(AssignmentP)]
    pub assignment: Assignment,
    #[part(ClauseDbP)]
    pub clause_db: ClauseDb,
    #[part(ImplGraphP)]
    pub impl_graph: ImplGraph,
    #[part(OccurListsP)]
    pub occur_lists: OccurLists,
    #[part(SolverStateP)]
    pub solver_state: SolverState,
    #[part(TmpDataP)]
    pub tmp_data: TmpData,
    #[part(TrailP)]
    pub trail: Trail,
    #[part(VariablesP)]
    pub variables: Variables,
}

/// Update structures for a new variable count.
///
/// The variable count is fixed at construction; there is no incremental
/// variable addition afterwards.
pub fn set_var_count(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ImplGraphP,
        mut OccurListsP,
        mut VariablesP,
    ),
    count: usize,
) {
    ctx.part_mut(AnalyzeConflictP).set_var_count(count);
    ctx.part_mut(AssignmentP).set_var_count(count);
    ctx.part_mut(ImplGraphP).set_var_count(count);
    ctx.part_mut(OccurListsP).set_var_count(count);
    ctx.part_mut(VariablesP).set_var_count(count);
}
