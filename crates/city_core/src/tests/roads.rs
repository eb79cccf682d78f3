use super::*;

#[test]
fn fourth_road_of_a_square_is_rejected() {
    let content = test_content();
    let mut state = test_state(&content);
    place(&mut state, &content, BuildingKind::Road, 4, 4).unwrap();
    place(&mut state, &content, BuildingKind::Road, 5, 4).unwrap();
    place(&mut state, &content, BuildingKind::Road, 4, 5).unwrap();

    let err = place(&mut state, &content, BuildingKind::Road, 5, 5).unwrap_err();
    assert_eq!(err, ActionError::RoadBlockRuleViolation);
    assert_eq!(state.buildings.len(), 3);
}

#[test]
fn l_shape_rejects_the_missing_corner_from_any_side() {
    let content = test_content();
    for (a, b, c, candidate) in [
        ((4, 4), (5, 4), (4, 5), (5, 5)),
        ((5, 4), (4, 5), (5, 5), (4, 4)),
        ((4, 4), (4, 5), (5, 5), (5, 4)),
        ((4, 4), (5, 4), (5, 5), (4, 5)),
    ] {
        let mut state = test_state(&content);
        for (x, z) in [a, b, c] {
            place(&mut state, &content, BuildingKind::Road, x, z).unwrap();
        }
        let err = place(&mut state, &content, BuildingKind::Road, candidate.0, candidate.1)
            .unwrap_err();
        assert_eq!(
            err,
            ActionError::RoadBlockRuleViolation,
            "candidate {candidate:?}"
        );
    }
}

#[test]
fn unrelated_road_elsewhere_is_unaffected() {
    let content = test_content();
    let mut state = test_state(&content);
    place(&mut state, &content, BuildingKind::Road, 4, 4).unwrap();
    place(&mut state, &content, BuildingKind::Road, 5, 4).unwrap();
    place(&mut state, &content, BuildingKind::Road, 4, 5).unwrap();

    assert!(place(&mut state, &content, BuildingKind::Road, 10, 10).is_ok());
    assert!(place(&mut state, &content, BuildingKind::Road, 11, 10).is_ok());
}

#[test]
fn non_road_corner_does_not_trip_the_rule() {
    let content = test_content();
    let mut state = test_state(&content);
    place(&mut state, &content, BuildingKind::Road, 4, 4).unwrap();
    place(&mut state, &content, BuildingKind::Road, 5, 4).unwrap();
    place(&mut state, &content, BuildingKind::Park, 4, 5).unwrap();

    // Only two of the other three corners are roads.
    assert!(place(&mut state, &content, BuildingKind::Road, 5, 5).is_ok());
}

#[test]
fn long_straight_roads_are_fine() {
    let content = test_content();
    let mut state = test_state(&content);
    for x in 0..12 {
        assert!(place(&mut state, &content, BuildingKind::Road, x, 0).is_ok());
    }
    for z in 1..12 {
        assert!(place(&mut state, &content, BuildingKind::Road, 0, z).is_ok());
    }
}
