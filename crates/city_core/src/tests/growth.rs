use super::*;

/// Supplied city with 150 residential capacity and 100 commercial jobs so
/// the growth gates and the job ceiling are both open.
fn growing_city(content: &CityContent) -> GameState {
    let mut state = state_with_utilities(content);
    for i in 0..3 {
        spawn_building(&mut state, BuildingKind::Residential, i, 0);
    }
    for i in 0..5 {
        spawn_building(&mut state, BuildingKind::Commercial, i, 1);
    }
    state
}

#[test]
fn high_happiness_tier_grows_seven_from_one_hundred() {
    let mut content = test_content();
    // Push derived happiness above the 0.06 tier: 85 baseline plus direct
    // effects lands at 90 with this layout.
    content.constants.initial_happiness = 85;
    let mut state = growing_city(&content);
    let mut rng = make_rng();
    state.stats.population = 100;

    tick(&mut state, &content, &mut rng, EventLevel::Normal);

    // floor(100 * 0.06 + 1) + floor(150 * 0.005) = 7 + 0.
    assert_eq!(state.stats.population, 107);
}

#[test]
fn middle_happiness_tier_grows_five() {
    let content = test_content();
    let mut state = growing_city(&content);
    let mut rng = make_rng();
    state.stats.population = 100;

    tick(&mut state, &content, &mut rng, EventLevel::Normal);

    // Derived happiness lands in the 0.04 tier: floor(100 * 0.04 + 1) = 5.
    assert!(state.stats.happiness > 60 && state.stats.happiness <= 80);
    assert_eq!(state.stats.population, 105);
}

#[test]
fn missing_water_gates_growth_and_drives_departure() {
    let content = test_content();
    let mut state = test_state(&content);
    let mut rng = make_rng();
    spawn_building(&mut state, BuildingKind::PowerPlant, 20, 20);
    for i in 0..3 {
        spawn_building(&mut state, BuildingKind::Residential, i, 0);
    }
    state.stats.population = 100;

    tick(&mut state, &content, &mut rng, EventLevel::Normal);

    // No growth; departure = floor(100 * 0.08 + 1) = 9.
    assert_eq!(state.stats.population, 91);
}

#[test]
fn departure_takes_the_worst_factor_not_the_sum() {
    let content = test_content();
    let mut state = test_state(&content);
    let mut rng = make_rng();
    for i in 0..3 {
        // Burning homes: capacity still counts, safety collapses, and with
        // no water tower the 0.08 water factor dominates the 0.07 safety one.
        let id = spawn_building(&mut state, BuildingKind::Residential, i, 0);
        let b = state.buildings.get_mut(&id).unwrap();
        b.on_fire = true;
        b.fire_health = MAX_FIRE_HEALTH - 1;
    }
    state.stats.population = 100;

    tick(&mut state, &content, &mut rng, EventLevel::Normal);

    // max(0.08, 0.07, ...) applied once: 100 - floor(100 * 0.08 + 1) = 91.
    assert_eq!(state.stats.population, 91);
}

#[test]
fn job_ceiling_soft_caps_inflow() {
    let content = test_content();
    let mut state = state_with_utilities(&content);
    let mut rng = make_rng();
    for i in 0..3 {
        spawn_building(&mut state, BuildingKind::Residential, i, 0);
    }
    // No jobs at all: inflow overshoots 1.25 * 0 immediately.
    state.stats.population = 0;

    tick(&mut state, &content, &mut rng, EventLevel::Normal);
    // First settler slips in: floor((1 - 0) / 2) = 0 claws nothing back yet.
    assert_eq!(state.stats.population, 1);

    for _ in 0..10 {
        tick(&mut state, &content, &mut rng, EventLevel::Normal);
    }
    // From there every further arrival is clawed back by the ceiling.
    assert_eq!(state.stats.population, 1);
}

#[test]
fn population_clamps_to_residential_capacity() {
    let content = test_content();
    let mut state = growing_city(&content);
    let mut rng = make_rng();
    // Extra jobs so the job ceiling stays out of the way of the cap.
    spawn_building(&mut state, BuildingKind::Commercial, 5, 1);
    spawn_building(&mut state, BuildingKind::Commercial, 6, 1);
    state.stats.population = 149;

    tick(&mut state, &content, &mut rng, EventLevel::Normal);
    assert_eq!(state.stats.population, 150);

    tick(&mut state, &content, &mut rng, EventLevel::Normal);
    assert_eq!(state.stats.population, 150, "never past capacity");
}

#[test]
fn funds_settle_tax_tourism_and_maintenance() {
    let content = test_content();
    let mut state = test_state(&content);
    let mut rng = make_rng();
    spawn_building(&mut state, BuildingKind::Road, 0, 0);
    state.stats.population = 50;
    state.stats.tourists = 10;
    state.stats.funds = 1000;

    let events = tick(&mut state, &content, &mut rng, EventLevel::Normal);

    // Income 50*25 + 10*20 = 1450, expense 3.
    assert_eq!(state.stats.funds, 1000 + 1447);
    assert!(events.iter().any(|e| matches!(
        &e.event,
        Event::MonthlyReport {
            income: 1450,
            expense: 3,
            net: 1447
        }
    )));
}

#[test]
fn month_advances_and_history_appends() {
    let content = test_content();
    let mut state = test_state(&content);
    let mut rng = make_rng();

    for expected in 2..=5 {
        tick(&mut state, &content, &mut rng, EventLevel::Normal);
        assert_eq!(state.stats.month, expected);
    }
    assert_eq!(state.history.len(), 4);
    assert_eq!(state.history.back().unwrap().month, 5);
}

#[test]
fn history_evicts_oldest_past_capacity() {
    let mut content = test_content();
    content.constants.history_capacity = 5;
    let mut state = test_state(&content);
    let mut rng = make_rng();

    for _ in 0..8 {
        tick(&mut state, &content, &mut rng, EventLevel::Normal);
    }
    assert_eq!(state.history.len(), 5);
    assert_eq!(state.history.front().unwrap().month, 5);
    assert_eq!(state.history.back().unwrap().month, 9);
}

#[test]
fn planner_cooldown_counts_down_with_the_months() {
    let content = test_content();
    let mut state = test_state(&content);
    let mut rng = make_rng();
    state.planner.cooldown_months = 3;

    tick(&mut state, &content, &mut rng, EventLevel::Normal);
    assert_eq!(state.planner.cooldown_months, 2);
    for _ in 0..5 {
        tick(&mut state, &content, &mut rng, EventLevel::Normal);
    }
    assert_eq!(state.planner.cooldown_months, 0, "saturates at zero");
}

#[test]
fn debug_level_reports_population_flow() {
    let content = test_content();
    let mut state = growing_city(&content);
    let mut rng = make_rng();
    state.stats.population = 100;

    let events = tick(&mut state, &content, &mut rng, EventLevel::Debug);
    assert!(events
        .iter()
        .any(|e| matches!(&e.event, Event::PopulationFlow { .. })));

    let events = tick(&mut state, &content, &mut rng, EventLevel::Normal);
    assert!(!events
        .iter()
        .any(|e| matches!(&e.event, Event::PopulationFlow { .. })));
}

#[test]
fn destroyed_selection_clears_on_tick() {
    let content = test_content();
    let mut state = test_state(&content);
    let mut rng = make_rng();
    let id = spawn_building(&mut state, BuildingKind::Residential, 0, 0);
    select_building(&mut state, Some(&id)).unwrap();
    {
        let b = state.buildings.get_mut(&id).unwrap();
        b.on_fire = true;
        b.fire_health = 1;
    }

    tick(&mut state, &content, &mut rng, EventLevel::Normal);
    assert!(state.buildings[&id].is_derelict());
    assert!(state.selected.is_none());
}
