//! Transaction-State Gate: quorum arithmetic, owner-count limit, and the
//! guaranteed clear-on-exit behavior from the evaluator's perspective.

use ruletree_engine::TransactionGate;

#[test]
fn quorum_arithmetic_with_unequal_weights() {
    let mut gate = TransactionGate::new();
    gate.add_owner("whale", 5).unwrap();
    gate.add_owner("minnow", 1).unwrap();
    gate.set_min_score(5).unwrap();

    assert!(!gate.is_confirmed());
    gate.confirm("minnow").unwrap();
    assert_eq!(gate.current_score(), 1);
    assert!(!gate.is_confirmed());

    gate.confirm("whale").unwrap();
    assert_eq!(gate.current_score(), 6);
    assert!(gate.is_confirmed());
}

#[test]
fn revoke_drops_only_that_owner() {
    let mut gate = TransactionGate::new();
    gate.add_owner("a", 1).unwrap();
    gate.add_owner("b", 1).unwrap();
    gate.set_min_score(2).unwrap();
    gate.confirm("a").unwrap();
    gate.confirm("b").unwrap();
    assert!(gate.is_confirmed());

    gate.revoke("a").unwrap();
    assert!(!gate.is_confirmed());
    assert_eq!(gate.current_score(), 1);
}

#[test]
fn owner_count_is_capped_at_250() {
    let mut gate = TransactionGate::new();
    for i in 0..250 {
        gate.add_owner(format!("o{i}"), 1).unwrap();
    }
    assert!(gate.add_owner("o250", 1).is_err());

    gate.remove_owner("o0").unwrap();
    assert!(gate.add_owner("o250", 1).is_ok());
}

#[test]
fn default_min_score_recomputes_as_owners_change() {
    let mut gate = TransactionGate::new();
    gate.add_owner("a", 1).unwrap();
    gate.add_owner("b", 1).unwrap();
    assert_eq!(gate.min_score(), 1);

    gate.add_owner("c", 1).unwrap();
    gate.add_owner("d", 1).unwrap();
    assert_eq!(gate.min_score(), 2);

    gate.remove_owner("d").unwrap();
    assert_eq!(gate.min_score(), 1);
}

#[test]
fn explicit_min_score_survives_owner_churn() {
    let mut gate = TransactionGate::new();
    gate.add_owner("a", 1).unwrap();
    gate.set_min_score(10).unwrap();
    gate.add_owner("b", 1).unwrap();
    gate.add_owner("c", 1).unwrap();
    assert_eq!(gate.min_score(), 10);
}

#[test]
fn single_owner_gate_has_zero_default_min_score() {
    // floor(1/2) = 0, so a single-owner gate is confirmed even with no
    // explicit confirmations: the quorum is trivially met.
    let mut gate = TransactionGate::new();
    gate.add_owner("solo", 1).unwrap();
    assert_eq!(gate.min_score(), 0);
    assert!(gate.is_confirmed());
}

#[test]
fn revoke_all_is_idempotent_and_score_drops_to_zero() {
    let mut gate = TransactionGate::new();
    gate.add_owner("a", 3).unwrap();
    gate.add_owner("b", 4).unwrap();
    gate.confirm("a").unwrap();
    gate.confirm("b").unwrap();
    assert_eq!(gate.current_score(), 7);

    gate.revoke_all();
    gate.revoke_all();
    assert_eq!(gate.current_score(), 0);
}
