//! End-to-end tests of the public `SatState` surface.
use std::io::{Seek, SeekFrom, Write};

use proptest::prelude::*;

use satyr_formula::test::satisfiable_formula;
use satyr_formula::{cnf_formula, lit, lits, var};

use satyr::{AssertingClause, SatState, StateError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Everything about a state the public API can observe.
#[derive(PartialEq, Eq, Debug, Clone)]
struct Snapshot {
    values: Vec<Option<bool>>,
    subsumed: Vec<bool>,
    decision_level: usize,
    learned: usize,
}

fn snapshot(state: &SatState) -> Snapshot {
    let values = (1..=state.var_count())
        .map(|index| {
            let lit = state.index_to_literal(index as isize).unwrap();
            match (
                state.implied_literal(lit).unwrap(),
                state.implied_literal(!lit).unwrap(),
            ) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            }
        })
        .collect();

    let total = state.clause_count() + state.learned_clause_count();
    let subsumed = (1..=total)
        .map(|index| {
            let cid = state.index_to_clause(index).unwrap();
            state.subsumed_clause(cid).unwrap()
        })
        .collect();

    Snapshot {
        values,
        subsumed,
        decision_level: state.decision_level(),
        learned: state.learned_clause_count(),
    }
}

/// Decide the variables in index order until everything is assigned or a
/// conflict is hit, then undo all decisions. Returns the recorded outcomes
/// and the snapshot at the deepest point.
fn run_decisions(state: &mut SatState) -> (Vec<Option<AssertingClause>>, Snapshot) {
    let mut outcomes = vec![];

    for index in 1..=state.var_count() {
        let var = state.index_to_var(index).unwrap();
        if state.instantiated_var(var).unwrap() {
            continue;
        }
        let outcome = state.decide_literal(var.positive()).unwrap();
        let stop = outcome.is_some();
        outcomes.push(outcome);
        if stop {
            break;
        }
    }

    let deepest = snapshot(state);

    while state.decision_level() > 1 {
        state.undo_decide_literal().unwrap();
    }

    (outcomes, deepest)
}

#[test]
fn decide_implies_and_subsumes() {
    init_logging();

    let mut state = SatState::from_formula(&cnf_formula![
        1, 2;
        -1, 3;
        -2, -3;
    ]);

    assert_eq!(state.decide_literal(lit!(1)), Ok(None));

    assert_eq!(state.decision_level(), 2);
    for index in 1..=3 {
        assert_eq!(state.instantiated_var(var!(index)), Some(true));
    }
    assert_eq!(state.implied_literal(lit!(1)), Some(true));
    assert_eq!(state.implied_literal(lit!(3)), Some(true));
    assert_eq!(state.implied_literal(lit!(-2)), Some(true));
    assert_eq!(state.implied_literal(lit!(2)), Some(false));

    for index in 1..=3 {
        let cid = state.index_to_clause(index as usize).unwrap();
        assert_eq!(state.subsumed_clause(cid), Some(true));
        assert_eq!(state.irrelevant_var(var!(index)), Some(true));
    }
}

#[test]
fn undo_restores_construction_state() {
    init_logging();

    let mut state = SatState::from_formula(&cnf_formula![
        1, 2;
        -1, 3;
        -2, -3;
    ]);

    let baseline = snapshot(&state);

    assert_eq!(state.decide_literal(lit!(1)), Ok(None));
    state.undo_decide_literal().unwrap();

    assert_eq!(snapshot(&state), baseline);
    assert_eq!(state.assertion_clause(), None);
}

#[test]
fn size_one_clause_fixes_at_level_one() {
    init_logging();

    let mut state = SatState::from_formula(&cnf_formula![
        5;
        1, 2;
    ]);

    let baseline = snapshot(&state);

    assert!(state.unit_resolution());
    assert_eq!(state.decision_level(), 1);
    assert_eq!(state.implied_literal(lit!(5)), Some(true));
    assert_eq!(state.instantiated_var(var!(1)), Some(false));

    state.undo_unit_resolution().unwrap();
    assert_eq!(snapshot(&state), baseline);
}

#[test]
fn deciding_the_last_free_variable_is_conflict_free() {
    init_logging();

    let mut state = SatState::from_formula(&cnf_formula![
        1, 2;
        -1, 3;
    ]);

    assert_eq!(state.decide_literal(lit!(1)), Ok(None));
    assert_eq!(state.implied_literal(lit!(3)), Some(true));

    // Variable 2 is the only unset one left and both its polarities keep the
    // assignment satisfying.
    assert_eq!(state.decide_literal(lit!(2)), Ok(None));
    assert_eq!(state.decision_level(), 3);
    for index in 1..=3 {
        assert_eq!(state.instantiated_var(var!(index)), Some(true));
    }
}

#[test]
fn duplicate_literals_do_not_change_behaviour() {
    init_logging();

    let mut plain = SatState::from_formula(&cnf_formula![
        1, 2;
        -1, 3;
        -2, -3;
    ]);
    let mut doubled = SatState::from_formula(&cnf_formula![
        1, 2, 2, 1;
        -1, 3, -1;
        -2, -3, -3;
    ]);

    // The stored clauses reflect the deduplicated input.
    for index in 1..=3 {
        let plain_cid = plain.index_to_clause(index).unwrap();
        let doubled_cid = doubled.index_to_clause(index).unwrap();
        assert_eq!(
            plain.clause_len(plain_cid),
            doubled.clause_len(doubled_cid)
        );
    }

    assert_eq!(plain.decide_literal(lit!(1)), Ok(None));
    assert_eq!(doubled.decide_literal(lit!(1)), Ok(None));
    assert_eq!(snapshot(&plain), snapshot(&doubled));
}

#[test]
fn root_conflict_synthesizes_a_unit_clause() {
    init_logging();

    let mut state = SatState::from_formula(&cnf_formula![
        1, 2;
        -1, 2;
        -2;
    ]);

    assert!(!state.unit_resolution());
    assert!(state.unsat());

    let clause = state.assertion_clause().unwrap();
    assert_eq!(clause.lits(), &lits![2][..]);
    assert_eq!(clause.assertion_level(), 1);

    assert_eq!(state.decide_literal(lit!(1)), Err(StateError::Unsat));
}

#[test]
fn top_level_contradiction_is_reported_as_unrecoverable() {
    init_logging();

    let mut state = SatState::from_formula(&cnf_formula![
        1, 2;
        1, 3;
        -2, -3;
        -1;
    ]);

    assert!(!state.unit_resolution());
    assert!(state.unsat());
    assert!(!state.unit_resolution());
}

#[test]
fn learn_assert_backjump_cycle() {
    init_logging();

    let mut state = SatState::from_formula(&cnf_formula![
        -1, 2;
        -2, 3;
        -2, -3;
    ]);

    let clause = state.decide_literal(lit!(1)).unwrap().unwrap();
    assert_eq!(clause.lits(), &lits![-2][..]);
    assert!(!state.at_assertion_level(&clause));

    // Asserting away from the assertion level is refused and harmless.
    let err = state.assert_clause(clause.clone()).unwrap_err();
    assert_eq!(
        err,
        StateError::NotAtAssertionLevel {
            assertion_level: 1,
            current_level: 2,
        }
    );

    state.undo_decide_literal().unwrap();
    assert!(state.at_assertion_level(&clause));
    assert_eq!(state.assert_clause(clause), Ok(None));

    assert_eq!(state.learned_clause_count(), 1);
    assert_eq!(state.implied_literal(lit!(-2)), Some(true));
    assert_eq!(state.implied_literal(lit!(-1)), Some(true));
    assert_eq!(state.decision_level(), 1);
}

#[test]
fn construction_from_a_dimacs_file() {
    init_logging();

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"c knowledge compiler input\np cnf 3 3\n1 2 0\n-1 3 0\n-2 -3 0\n")
        .unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let mut state = SatState::from_dimacs(file).unwrap();
    assert_eq!(state.var_count(), 3);
    assert_eq!(state.clause_count(), 3);
    assert_eq!(state.decide_literal(lit!(1)), Ok(None));
}

#[test]
fn malformed_dimacs_is_rejected_at_construction() {
    init_logging();

    assert!(SatState::from_dimacs(&b"p cnf 2 1\n1 garbage 0\n"[..]).is_err());
    assert!(SatState::from_dimacs_file("/nonexistent/input.cnf").is_err());
}

proptest! {
    /// Any conflict-free decision prefix fully unwinds to the construction
    /// state, and replaying it is deterministic.
    #[test]
    fn decisions_round_trip(formula in satisfiable_formula(2..8usize, 1..20usize, 0.1..0.9, 0.3..0.7)) {
        let mut state = SatState::from_formula(&formula);

        prop_assert!(state.unit_resolution());
        let baseline = snapshot(&state);

        let (first_outcomes, first_deepest) = run_decisions(&mut state);
        prop_assert_eq!(snapshot(&state), baseline.clone());

        let (second_outcomes, second_deepest) = run_decisions(&mut state);
        prop_assert_eq!(first_outcomes, second_outcomes);
        prop_assert_eq!(first_deepest, second_deepest);
        prop_assert_eq!(snapshot(&state), baseline);
    }

    /// Conflicts, learned clauses and undo keep the engine deterministic on
    /// arbitrary formulas as well.
    #[test]
    fn conflicting_decisions_round_trip(
        formula in satyr_formula::cnf::strategy::cnf_formula(1..8usize, 1..30, 1..4),
    ) {
        let mut state = SatState::from_formula(&formula);

        if !state.unit_resolution() {
            prop_assert!(state.unsat());
            return Ok(());
        }
        let baseline = snapshot(&state);

        let (first_outcomes, first_deepest) = run_decisions(&mut state);
        prop_assert_eq!(snapshot(&state), baseline.clone());

        let (second_outcomes, second_deepest) = run_decisions(&mut state);
        prop_assert_eq!(first_outcomes, second_outcomes);
        prop_assert_eq!(first_deepest, second_deepest);
        prop_assert_eq!(snapshot(&state), baseline);
    }
}
