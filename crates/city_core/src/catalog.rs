//! Building catalog: static per-kind attributes, upgrade tiers, and the
//! effective-properties resolver.
//!
//! Tier patches are absolute replacements, not deltas: a `Some` value in a
//! patch becomes the new value for that attribute, a `None` leaves the
//! running value from the previous tier untouched.

use serde::{Deserialize, Serialize};

use crate::types::BASE_BUILDING_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Residential,
    Commercial,
    Industrial,
    Road,
    Park,
    PowerPlant,
    WaterTower,
    FireStation,
    Hospital,
    School,
    University,
    WasteManagement,
    Landmark,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 13] = [
        BuildingKind::Residential,
        BuildingKind::Commercial,
        BuildingKind::Industrial,
        BuildingKind::Road,
        BuildingKind::Park,
        BuildingKind::PowerPlant,
        BuildingKind::WaterTower,
        BuildingKind::FireStation,
        BuildingKind::Hospital,
        BuildingKind::School,
        BuildingKind::University,
        BuildingKind::WasteManagement,
        BuildingKind::Landmark,
    ];
}

/// The resolved attribute set for a building at some level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingProps {
    pub maintenance_cost: i64,
    pub height: f32,
    pub power_capacity: u32,
    pub power_demand: u32,
    pub water_capacity: u32,
    pub water_demand: u32,
    pub residential_capacity: u32,
    pub jobs: u32,
    pub happiness_effect: i32,
    pub pollution_output: u32,
    pub pollution_reduction: u32,
    pub appeal_points: u32,
    pub patient_capacity: u32,
    pub health_service_radius: f32,
    pub student_capacity: u32,
    pub education_points: u32,
    pub education_radius: f32,
    pub fire_fighting_power: i32,
    pub fire_coverage_radius: f32,
    pub max_active_fires: u32,
}

impl Default for BuildingProps {
    fn default() -> Self {
        Self {
            maintenance_cost: 0,
            height: 0.0,
            power_capacity: 0,
            power_demand: 0,
            water_capacity: 0,
            water_demand: 0,
            residential_capacity: 0,
            jobs: 0,
            happiness_effect: 0,
            pollution_output: 0,
            pollution_reduction: 0,
            appeal_points: 0,
            patient_capacity: 0,
            health_service_radius: 0.0,
            student_capacity: 0,
            education_points: 0,
            education_radius: 0.0,
            fire_fighting_power: 0,
            fire_coverage_radius: 0.0,
            max_active_fires: 0,
        }
    }
}

/// Attribute patch carried by an upgrade tier. `None` keys are unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropsPatch {
    pub maintenance_cost: Option<i64>,
    pub height: Option<f32>,
    pub power_capacity: Option<u32>,
    pub power_demand: Option<u32>,
    pub water_capacity: Option<u32>,
    pub water_demand: Option<u32>,
    pub residential_capacity: Option<u32>,
    pub jobs: Option<u32>,
    pub happiness_effect: Option<i32>,
    pub pollution_output: Option<u32>,
    pub pollution_reduction: Option<u32>,
    pub appeal_points: Option<u32>,
    pub patient_capacity: Option<u32>,
    pub student_capacity: Option<u32>,
    pub education_points: Option<u32>,
}

impl PropsPatch {
    pub fn apply(&self, props: &mut BuildingProps) {
        if let Some(v) = self.maintenance_cost {
            props.maintenance_cost = v;
        }
        if let Some(v) = self.height {
            props.height = v;
        }
        if let Some(v) = self.power_capacity {
            props.power_capacity = v;
        }
        if let Some(v) = self.power_demand {
            props.power_demand = v;
        }
        if let Some(v) = self.water_capacity {
            props.water_capacity = v;
        }
        if let Some(v) = self.water_demand {
            props.water_demand = v;
        }
        if let Some(v) = self.residential_capacity {
            props.residential_capacity = v;
        }
        if let Some(v) = self.jobs {
            props.jobs = v;
        }
        if let Some(v) = self.happiness_effect {
            props.happiness_effect = v;
        }
        if let Some(v) = self.pollution_output {
            props.pollution_output = v;
        }
        if let Some(v) = self.pollution_reduction {
            props.pollution_reduction = v;
        }
        if let Some(v) = self.appeal_points {
            props.appeal_points = v;
        }
        if let Some(v) = self.patient_capacity {
            props.patient_capacity = v;
        }
        if let Some(v) = self.student_capacity {
            props.student_capacity = v;
        }
        if let Some(v) = self.education_points {
            props.education_points = v;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeTier {
    pub name: String,
    pub cost: i64,
    pub patch: PropsPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDef {
    pub kind: BuildingKind,
    pub name: String,
    pub cost: i64,
    /// Render tint, 0xRRGGBB. Opaque to the simulation.
    pub color: u32,
    pub flammable: bool,
    pub base: BuildingProps,
    pub upgrades: Vec<UpgradeTier>,
}

impl BuildingDef {
    /// Highest reachable level: base level plus one per tier.
    pub fn max_level(&self) -> u32 {
        BASE_BUILDING_LEVEL + self.upgrades.len() as u32
    }

    /// Tier applied by the next upgrade from `level`, if any remains.
    pub fn next_upgrade(&self, level: u32) -> Option<&UpgradeTier> {
        self.upgrades
            .get(level.saturating_sub(BASE_BUILDING_LEVEL) as usize)
    }
}

/// Resolves the effective attribute set for a building at `level`: the base
/// props with every tier patch up to `level - 1` folded over them, in order.
///
/// Pure and O(level). Callers iterating large collections each tick should
/// resolve once per building, not once per attribute read.
pub fn effective_props(def: &BuildingDef, level: u32) -> BuildingProps {
    let mut props = def.base;
    let applied = level.saturating_sub(BASE_BUILDING_LEVEL) as usize;
    for tier in def.upgrades.iter().take(applied) {
        tier.patch.apply(&mut props);
    }
    props
}

// ---------------------------------------------------------------------------
// Content root
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityContent {
    pub content_version: String,
    pub buildings: Vec<BuildingDef>,
    pub constants: Constants,
}

impl CityContent {
    /// Catalog lookup. Content validation guarantees one def per kind.
    pub fn building(&self, kind: BuildingKind) -> &BuildingDef {
        self.buildings
            .iter()
            .find(|d| d.kind == kind)
            .unwrap_or_else(|| panic!("catalog entry missing for {kind:?}"))
    }
}

/// Every tunable of the simulation, loadable as `constants.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    pub grid_size: i32,
    pub initial_funds: i64,
    pub initial_happiness: i32,
    pub initial_health_level: i32,
    pub initial_safety_level: i32,
    pub initial_education_level: i32,
    pub initial_pollution_level: i32,
    pub initial_appeal: i32,
    pub tax_per_capita: i64,
    pub tourist_income: i64,
    pub unemployment_threshold: f64,
    pub low_funds_threshold: i64,
    pub deep_debt_threshold: i64,
    /// Negative: added to happiness when water demand exceeds capacity.
    pub no_water_happiness_penalty: i32,
    pub fire_start_chance: f64,
    pub fire_spread_chance: f64,
    pub fire_damage_rate: i32,
    pub health_penalty_threshold: i32,
    pub safety_penalty_threshold: i32,
    pub education_penalty_threshold: i32,
    /// Fraction of the population that demands schooling.
    pub education_demand_ratio: f64,
    /// Net pollution units that map to pollution level 100.
    pub pollution_units_for_max_level: u32,
    pub pollution_happiness_factor: f64,
    pub pollution_health_impact_threshold: i32,
    pub pollution_health_penalty_factor: f64,
    /// Raw appeal units that map to appeal 100.
    pub appeal_units_for_max_level: u32,
    pub pollution_appeal_penalty_factor: f64,
    pub derelict_appeal_penalty: i32,
    pub happiness_appeal_bonus_factor: f64,
    pub education_appeal_bonus_factor: f64,
    pub commercial_jobs_per_tourist: u32,
    pub history_capacity: usize,
    pub planner_cooldown_months: u32,
    pub planner_min_funds_to_act: i64,
    pub planner_max_actions_per_turn: usize,
    pub planner_candidate_cell_limit: usize,
}

/// The stock game content. Drivers may override it from JSON; tests tweak
/// individual fields.
#[allow(clippy::too_many_lines)]
pub fn default_content() -> CityContent {
    CityContent {
        content_version: "city-1".to_string(),
        buildings: vec![
            BuildingDef {
                kind: BuildingKind::Residential,
                name: "Residential".to_string(),
                cost: 300,
                color: 0x0022_c55e,
                flammable: true,
                base: BuildingProps {
                    maintenance_cost: 10,
                    height: 15.0,
                    residential_capacity: 50,
                    power_demand: 5,
                    water_demand: 3,
                    happiness_effect: 1,
                    ..BuildingProps::default()
                },
                upgrades: vec![
                    UpgradeTier {
                        name: "Residential II".to_string(),
                        cost: 450,
                        patch: PropsPatch {
                            residential_capacity: Some(75),
                            maintenance_cost: Some(15),
                            power_demand: Some(7),
                            water_demand: Some(5),
                            height: Some(20.0),
                            ..PropsPatch::default()
                        },
                    },
                    UpgradeTier {
                        name: "Residential III".to_string(),
                        cost: 700,
                        patch: PropsPatch {
                            residential_capacity: Some(100),
                            maintenance_cost: Some(22),
                            power_demand: Some(10),
                            water_demand: Some(7),
                            height: Some(25.0),
                            ..PropsPatch::default()
                        },
                    },
                ],
            },
            BuildingDef {
                kind: BuildingKind::Commercial,
                name: "Commercial".to_string(),
                cost: 400,
                color: 0x003b_82f6,
                flammable: true,
                base: BuildingProps {
                    maintenance_cost: 25,
                    height: 20.0,
                    jobs: 20,
                    power_demand: 10,
                    water_demand: 5,
                    happiness_effect: 1,
                    ..BuildingProps::default()
                },
                upgrades: vec![UpgradeTier {
                    name: "Commercial II".to_string(),
                    cost: 600,
                    patch: PropsPatch {
                        jobs: Some(30),
                        maintenance_cost: Some(38),
                        power_demand: Some(15),
                        water_demand: Some(8),
                        height: Some(25.0),
                        ..PropsPatch::default()
                    },
                }],
            },
            BuildingDef {
                kind: BuildingKind::Industrial,
                name: "Industrial".to_string(),
                cost: 550,
                color: 0x00f5_9e0b,
                flammable: true,
                base: BuildingProps {
                    maintenance_cost: 40,
                    height: 25.0,
                    jobs: 30,
                    power_demand: 20,
                    water_demand: 10,
                    happiness_effect: -4,
                    pollution_output: 5,
                    ..BuildingProps::default()
                },
                upgrades: vec![UpgradeTier {
                    name: "Industrial II".to_string(),
                    cost: 850,
                    patch: PropsPatch {
                        jobs: Some(45),
                        maintenance_cost: Some(60),
                        power_demand: Some(30),
                        water_demand: Some(15),
                        happiness_effect: Some(-5),
                        height: Some(30.0),
                        pollution_output: Some(8),
                        ..PropsPatch::default()
                    },
                }],
            },
            BuildingDef {
                kind: BuildingKind::Road,
                name: "Road".to_string(),
                cost: 30,
                color: 0x006b_7280,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 3,
                    height: 0.5,
                    ..BuildingProps::default()
                },
                upgrades: vec![],
            },
            BuildingDef {
                kind: BuildingKind::Park,
                name: "Park".to_string(),
                cost: 180,
                color: 0x0084_cc16,
                flammable: true,
                base: BuildingProps {
                    maintenance_cost: 5,
                    height: 2.0,
                    happiness_effect: 5,
                    power_demand: 1,
                    water_demand: 2,
                    pollution_reduction: 1,
                    appeal_points: 3,
                    ..BuildingProps::default()
                },
                upgrades: vec![UpgradeTier {
                    name: "Park II".to_string(),
                    cost: 270,
                    patch: PropsPatch {
                        happiness_effect: Some(8),
                        maintenance_cost: Some(8),
                        height: Some(3.0),
                        pollution_reduction: Some(2),
                        appeal_points: Some(5),
                        ..PropsPatch::default()
                    },
                }],
            },
            BuildingDef {
                kind: BuildingKind::PowerPlant,
                name: "Power Plant".to_string(),
                cost: 1100,
                color: 0x00ef_4444,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 75,
                    height: 30.0,
                    power_capacity: 100,
                    water_demand: 10,
                    happiness_effect: -2,
                    pollution_output: 8,
                    ..BuildingProps::default()
                },
                upgrades: vec![UpgradeTier {
                    name: "Power Plant II".to_string(),
                    cost: 1700,
                    patch: PropsPatch {
                        power_capacity: Some(150),
                        maintenance_cost: Some(110),
                        water_demand: Some(15),
                        happiness_effect: Some(-3),
                        height: Some(35.0),
                        pollution_output: Some(12),
                        ..PropsPatch::default()
                    },
                }],
            },
            BuildingDef {
                kind: BuildingKind::WaterTower,
                name: "Water Tower".to_string(),
                cost: 700,
                color: 0x000e_a5e9,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 30,
                    height: 28.0,
                    water_capacity: 80,
                    power_demand: 10,
                    ..BuildingProps::default()
                },
                upgrades: vec![],
            },
            BuildingDef {
                kind: BuildingKind::FireStation,
                name: "Fire Station".to_string(),
                cost: 1400,
                color: 0x00dc_2626,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 100,
                    height: 22.0,
                    power_demand: 15,
                    water_demand: 5,
                    fire_fighting_power: 5,
                    fire_coverage_radius: 5.0,
                    max_active_fires: 1,
                    ..BuildingProps::default()
                },
                upgrades: vec![],
            },
            BuildingDef {
                kind: BuildingKind::Hospital,
                name: "Hospital".to_string(),
                cost: 1700,
                color: 0x004a_de80,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 125,
                    height: 26.0,
                    power_demand: 20,
                    water_demand: 10,
                    patient_capacity: 200,
                    health_service_radius: 7.0,
                    ..BuildingProps::default()
                },
                upgrades: vec![],
            },
            BuildingDef {
                kind: BuildingKind::School,
                name: "School".to_string(),
                cost: 1000,
                color: 0x00fa_cc15,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 60,
                    height: 18.0,
                    power_demand: 10,
                    water_demand: 8,
                    student_capacity: 150,
                    education_points: 20,
                    education_radius: 6.0,
                    happiness_effect: 2,
                    ..BuildingProps::default()
                },
                upgrades: vec![UpgradeTier {
                    name: "School II".to_string(),
                    cost: 1400,
                    patch: PropsPatch {
                        student_capacity: Some(220),
                        maintenance_cost: Some(90),
                        education_points: Some(30),
                        height: Some(20.0),
                        happiness_effect: Some(3),
                        ..PropsPatch::default()
                    },
                }],
            },
            BuildingDef {
                kind: BuildingKind::University,
                name: "University".to_string(),
                cost: 2500,
                color: 0x008b_5cf6,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 175,
                    height: 32.0,
                    power_demand: 30,
                    water_demand: 15,
                    student_capacity: 500,
                    education_points: 60,
                    education_radius: 10.0,
                    happiness_effect: 4,
                    ..BuildingProps::default()
                },
                upgrades: vec![UpgradeTier {
                    name: "University II".to_string(),
                    cost: 3400,
                    patch: PropsPatch {
                        student_capacity: Some(750),
                        maintenance_cost: Some(250),
                        education_points: Some(90),
                        height: Some(36.0),
                        happiness_effect: Some(6),
                        ..PropsPatch::default()
                    },
                }],
            },
            BuildingDef {
                kind: BuildingKind::WasteManagement,
                name: "Waste Management".to_string(),
                cost: 1200,
                color: 0x004f_d1c5,
                flammable: true,
                base: BuildingProps {
                    maintenance_cost: 90,
                    height: 20.0,
                    power_demand: 12,
                    water_demand: 4,
                    pollution_reduction: 20,
                    happiness_effect: -1,
                    ..BuildingProps::default()
                },
                upgrades: vec![],
            },
            BuildingDef {
                kind: BuildingKind::Landmark,
                name: "Landmark".to_string(),
                cost: 2800,
                color: 0x00a0_aec0,
                flammable: false,
                base: BuildingProps {
                    maintenance_cost: 100,
                    height: 26.0,
                    power_demand: 5,
                    water_demand: 3,
                    happiness_effect: 2,
                    appeal_points: 25,
                    ..BuildingProps::default()
                },
                upgrades: vec![],
            },
        ],
        constants: Constants {
            grid_size: 24,
            initial_funds: 50_000,
            initial_happiness: 65,
            initial_health_level: 85,
            initial_safety_level: 100,
            initial_education_level: 55,
            initial_pollution_level: 0,
            initial_appeal: 10,
            tax_per_capita: 25,
            tourist_income: 20,
            unemployment_threshold: 0.1,
            low_funds_threshold: 0,
            deep_debt_threshold: -10_000,
            no_water_happiness_penalty: -5,
            fire_start_chance: 0.000_05,
            fire_spread_chance: 0.1,
            fire_damage_rate: 2,
            health_penalty_threshold: 35,
            safety_penalty_threshold: 55,
            education_penalty_threshold: 25,
            education_demand_ratio: 0.3,
            pollution_units_for_max_level: 100,
            pollution_happiness_factor: 0.05,
            pollution_health_impact_threshold: 50,
            pollution_health_penalty_factor: 0.05,
            appeal_units_for_max_level: 200,
            pollution_appeal_penalty_factor: 0.35,
            derelict_appeal_penalty: 3,
            happiness_appeal_bonus_factor: 0.1,
            education_appeal_bonus_factor: 0.15,
            commercial_jobs_per_tourist: 4,
            history_capacity: 240,
            planner_cooldown_months: 3,
            planner_min_funds_to_act: 100,
            planner_max_actions_per_turn: 3,
            planner_candidate_cell_limit: 40,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
