//! Synthesizes an asserting clause from a conflict.
//!
//! The analysis walks the implication graph of the conflicting decision
//! level: it collects every current-level vertex from which the falsified
//! clause is reachable, locates the first unique implication point by
//! dominator search, and resolves the conflict clause down to a clause that
//! asserts the negation of the 1-UIP at its assertion level.
use std::cmp::max;

use partial_ref::{partial, PartialRef};

use crate::clause::{AssertingClause, ClauseId};
use crate::context::{AnalyzeConflictP, AssignmentP, ClauseDbP, Context, ImplGraphP, TrailP};
use crate::lit::{Lit, Var};
use crate::prop::ImplGraph;

/// Temporaries for conflict analysis.
///
/// Every per-variable flag is false outside a single [`analyze_conflict`]
/// call.
#[derive(Default)]
pub struct AnalyzeConflict {
    /// Current-level vertices that reach the conflict, in discovery order,
    /// stored in asserted polarity (i.e. as currently true literals).
    graph: Vec<Lit>,
    /// How many `graph` entries come from the conflict clause itself.
    conflict_count: usize,
    /// Per variable: its asserted literal is in the conflict clause.
    in_conflict: Vec<bool>,
    /// Per variable: its asserted literal was collected into `graph`.
    in_graph: Vec<bool>,
    /// Per variable: excluded from the dominator search, marking the UIP
    /// candidate under test.
    dfs_ignore: Vec<bool>,
    /// Per variable: visited by the currently running graph traversal.
    visited: Vec<bool>,
    /// Per variable: already added to the synthesized clause.
    in_clause: Vec<bool>,
    /// Variables with a lasting flag set, cleaned when analysis finishes.
    to_clean: Vec<Var>,
    /// Variables with `visited` set, cleaned after each traversal.
    visited_clean: Vec<Var>,
    /// Traversal stack.
    stack: Vec<Lit>,
}

impl AnalyzeConflict {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.in_conflict.resize(count, false);
        self.in_graph.resize(count, false);
        self.dfs_ignore.resize(count, false);
        self.visited.resize(count, false);
        self.in_clause.resize(count, false);
    }
}

/// Compute the 1-UIP asserting clause for a conflict at the current level.
///
/// The returned clause has the asserted literal (the negation of the UIP) in
/// position 0 and carries its assertion level: the largest decision level
/// strictly below the current one among its literals, or 1 for a unit
/// clause.
pub fn analyze_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        AssignmentP,
        ClauseDbP,
        ImplGraphP,
        TrailP,
    ),
    conflict: ClauseId,
) -> AssertingClause {
    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);
    let level = ctx.part(TrailP).current_level();

    analyze.graph.clear();
    analyze.conflict_count = 0;

    // The search source plays the decision literal's role: the decision for
    // decision frames, the first initial forcing for the root frame.
    let source = {
        let frame = ctx.part(TrailP).top();
        match frame.decision {
            Some(decision) => decision,
            None => frame.units[0],
        }
    };

    // Current-level literals of the conflict clause, in asserted polarity.
    for &lit in ctx.part(ClauseDbP).lits(conflict) {
        let var = lit.var();
        if ctx.part(AssignmentP).var_is_instantiated(var)
            && ctx.part(ImplGraphP).level(var) == level
            && !analyze.in_graph[var.index()]
        {
            analyze.in_graph[var.index()] = true;
            analyze.in_conflict[var.index()] = true;
            analyze.to_clean.push(var);
            analyze.graph.push(!lit);
            analyze.conflict_count += 1;
        }
    }

    // Expand backwards through the forcing clauses, collecting every
    // current-level vertex the conflict is reachable from.
    let mut next = 0;
    while next < analyze.graph.len() {
        let lit = analyze.graph[next];
        next += 1;

        let reason = match ctx.part(ImplGraphP).reason(lit) {
            Some(reason) => reason,
            None => continue,
        };

        for &other in ctx.part(ClauseDbP).lits(reason) {
            if other == lit {
                continue;
            }
            let var = other.var();
            if ctx.part(AssignmentP).var_is_instantiated(var)
                && ctx.part(ImplGraphP).level(var) == level
                && !analyze.in_graph[var.index()]
            {
                analyze.in_graph[var.index()] = true;
                analyze.to_clean.push(var);
                analyze.graph.push(!other);
            }
        }
    }

    let uip = if analyze.conflict_count == 1 {
        // The conflict clause has a single current-level literal; it
        // dominates trivially.
        analyze.graph[0]
    } else {
        find_uip(analyze, ctx.part(ImplGraphP), source)
    };

    // Resolve: conflict-clause literals below the current level, the negated
    // UIP, and the below-level literals from the forcing clauses of the
    // UIP's descendants on the conflict side.
    let mut clause = vec![!uip];

    for &lit in ctx.part(ClauseDbP).lits(conflict) {
        let var = lit.var();
        if ctx.part(AssignmentP).var_is_instantiated(var)
            && ctx.part(ImplGraphP).level(var) < level
            && !analyze.in_clause[var.index()]
        {
            analyze.in_clause[var.index()] = true;
            analyze.to_clean.push(var);
            clause.push(lit);
        }
    }

    analyze.stack.clear();
    for &child in ctx.part(ImplGraphP).children(uip.var()) {
        analyze.stack.push(child);
    }

    while let Some(lit) = analyze.stack.pop() {
        let var = lit.var();
        if !analyze.in_graph[var.index()] || analyze.visited[var.index()] {
            continue;
        }
        analyze.visited[var.index()] = true;
        analyze.visited_clean.push(var);

        // A conflict can leave a forcing for the opposite polarity of an
        // assigned variable enqueued; resolution always follows the reason of
        // the polarity that was actually set.
        let asserted = match ctx.part(AssignmentP).var_value(var) {
            Some(value) => var.lit(value),
            None => continue,
        };

        if let Some(reason) = ctx.part(ImplGraphP).reason(asserted) {
            for &other in ctx.part(ClauseDbP).lits(reason) {
                if other == asserted {
                    continue;
                }
                let other_var = other.var();
                if ctx.part(ImplGraphP).level(other_var) < level
                    && !analyze.in_clause[other_var.index()]
                {
                    analyze.in_clause[other_var.index()] = true;
                    analyze.to_clean.push(other_var);
                    clause.push(other);
                }
            }
        }

        for &child in ctx.part(ImplGraphP).children(var) {
            analyze.stack.push(child);
        }
    }

    for &var in analyze.visited_clean.iter() {
        analyze.visited[var.index()] = false;
    }
    analyze.visited_clean.clear();

    let mut assertion_level = 1;
    for &lit in clause[1..].iter() {
        assertion_level = max(assertion_level, ctx.part(ImplGraphP).level(lit.var()));
    }

    for &var in analyze.to_clean.iter() {
        analyze.in_conflict[var.index()] = false;
        analyze.in_graph[var.index()] = false;
        analyze.in_clause[var.index()] = false;
    }
    analyze.to_clean.clear();

    AssertingClause::new(clause, assertion_level)
}

/// Dominator search for the first unique implication point.
///
/// Walks the collected vertices in discovery order, which visits dominators
/// nearest to the conflict first. A candidate is the UIP when hiding it cuts
/// every path from the source to a conflict-clause vertex; the source itself
/// counts as reached when it appears in the conflict clause. Falls back to
/// the source when no candidate qualifies.
fn find_uip(analyze: &mut AnalyzeConflict, graph: &ImplGraph, source: Lit) -> Lit {
    let mut uip = source;

    for index in 0..analyze.graph.len() {
        let candidate = analyze.graph[index];
        if candidate == source {
            continue;
        }

        analyze.dfs_ignore[candidate.var().index()] = true;
        let reached = reaches_conflict(analyze, graph, source);
        analyze.dfs_ignore[candidate.var().index()] = false;

        if !reached {
            uip = candidate;
            break;
        }
    }

    uip
}

/// Whether a conflict-clause vertex is reachable from `source` through the
/// implication graph, skipping ignored vertices.
fn reaches_conflict(analyze: &mut AnalyzeConflict, graph: &ImplGraph, source: Lit) -> bool {
    analyze.stack.clear();
    analyze.stack.push(source);

    let mut reached = false;

    while let Some(lit) = analyze.stack.pop() {
        let var = lit.var();
        if analyze.dfs_ignore[var.index()] || analyze.visited[var.index()] {
            continue;
        }
        analyze.visited[var.index()] = true;
        analyze.visited_clean.push(var);

        if analyze.in_conflict[var.index()] {
            reached = true;
            break;
        }

        for &child in graph.children(var) {
            analyze.stack.push(child);
        }
    }

    for &var in analyze.visited_clean.iter() {
        analyze.visited[var.index()] = false;
    }
    analyze.visited_clean.clear();

    reached
}
