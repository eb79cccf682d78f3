use city_core::BuildingKind;
use city_world::{default_content, validate_content};

#[test]
fn stock_content_passes_validation() {
    let content = default_content(); // validates internally, should not panic
    validate_content(&content);
}

#[test]
#[should_panic(expected = "expected exactly 1")]
fn duplicate_catalog_entry_panics() {
    let mut content = default_content();
    let dup = content.building(BuildingKind::Park).clone();
    content.buildings.push(dup);
    validate_content(&content);
}

#[test]
#[should_panic(expected = "expected exactly 1")]
fn missing_catalog_entry_panics() {
    let mut content = default_content();
    content.buildings.retain(|d| d.kind != BuildingKind::Road);
    validate_content(&content);
}

#[test]
#[should_panic(expected = "must not be free")]
fn free_upgrade_tier_panics() {
    let mut content = default_content();
    let residential = content
        .buildings
        .iter_mut()
        .find(|d| d.kind == BuildingKind::Residential)
        .unwrap();
    residential.upgrades[0].cost = 0;
    validate_content(&content);
}

#[test]
#[should_panic(expected = "empty display name")]
fn unnamed_building_panics() {
    let mut content = default_content();
    let road = content
        .buildings
        .iter_mut()
        .find(|d| d.kind == BuildingKind::Road)
        .unwrap();
    road.name.clear();
    validate_content(&content);
}

#[test]
#[should_panic(expected = "covers fires but services none")]
fn fire_station_with_no_concurrency_panics() {
    let mut content = default_content();
    let station = content
        .buildings
        .iter_mut()
        .find(|d| d.kind == BuildingKind::FireStation)
        .unwrap();
    station.base.max_active_fires = 0;
    validate_content(&content);
}
