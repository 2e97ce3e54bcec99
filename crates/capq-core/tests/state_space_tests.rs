//! State space construction tests

use capq_core::{build_states, CapqError, MachinePool, StateId, StateSpace};

#[test]
fn test_state_count_is_power_set_minus_empty() {
    let cases: &[(&[&str], &[u32])] = &[
        (&["M1"], &[1]),
        (&["M1"], &[3]),
        (&["M1", "M2"], &[1, 1]),
        (&["M1", "M2"], &[2, 3]),
        (&["M1", "M2", "M3", "M4"], &[1, 2, 1, 2]),
    ];

    for &(names, max_units) in cases {
        let space = build_states(names, max_units).unwrap();
        let n: u32 = max_units.iter().sum();
        assert_eq!(space.len(), (1usize << n) - 1, "pool {names:?} {max_units:?}");

        let ids: Vec<StateId> = space.ids().collect();
        let expected: Vec<StateId> = (1..=space.len()).map(StateId).collect();
        assert_eq!(ids, expected);
    }
}

#[test]
fn test_generation_order_follows_binary_counter() {
    // Units: [M1, M2, M2]. State k selects unit i when bit i of k is set.
    let space = build_states(&["M1", "M2"], &[1, 2]).unwrap();

    let expected = [
        (1, 0),
        (0, 1),
        (1, 1),
        (0, 1),
        (1, 1),
        (0, 2),
        (1, 2),
    ];
    for (state, (m1, m2)) in space.states().iter().zip(expected) {
        assert_eq!(state.configuration.count(0), m1, "state {}", state.id);
        assert_eq!(state.configuration.count(1), m2, "state {}", state.id);
        assert_eq!(state.capacity, m1 + 2 * m2);
    }
}

#[test]
fn test_capacity_cached_on_state() {
    let space = build_states(&["M1", "M2", "M3"], &[2, 2, 1]).unwrap();
    for state in space.states() {
        assert_eq!(state.capacity, state.configuration.capacity());
    }
}

#[test]
fn test_explicit_weights() {
    let pool = MachinePool::with_weights(&["small", "large"], &[1, 1], &[4, 16]).unwrap();
    let space = StateSpace::build(pool).unwrap();

    let capacities: Vec<u32> = space.states().iter().map(|s| s.capacity).collect();
    assert_eq!(capacities, vec![4, 16, 20]);
}

#[test]
fn test_duplicate_names_are_distinct_kinds() {
    let space = build_states(&["M", "M"], &[1, 1]).unwrap();
    let capacities: Vec<u32> = space.states().iter().map(|s| s.capacity).collect();
    assert_eq!(capacities, vec![1, 2, 3]);
}

#[test]
fn test_invalid_spec_builds_nothing() {
    assert!(matches!(
        build_states(&["M1", "M2", "M3"], &[1, 1]),
        Err(CapqError::InvalidSpec(_))
    ));
    assert!(matches!(
        build_states(&["M1"], &[0]),
        Err(CapqError::InvalidSpec(_))
    ));
}

#[test]
fn test_state_space_serialization() {
    let space = build_states(&["M1", "M2"], &[1, 1]).unwrap();
    let json = serde_json::to_value(&space).unwrap();

    assert_eq!(json["states"].as_array().unwrap().len(), 3);
    assert_eq!(json["states"][2]["id"], 3);
    assert_eq!(json["states"][2]["capacity"], 3);
}
