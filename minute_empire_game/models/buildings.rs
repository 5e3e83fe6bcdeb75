use minute_empire_types::buildings::BuildingKind;
use minute_empire_types::common::Resources;

const COST_GROWTH: f64 = 1.5;

/// Base warehouse/granary-free storage per resource.
pub const BASE_STORAGE_CAPACITY: f64 = 1000.0;
/// Capacity gained per warehouse (or granary, for food) level.
pub const STORAGE_BONUS_PER_LEVEL: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct BuildingData {
    pub creation_cost: Resources,
    pub creation_minutes: u32,
    pub upgrade_base_cost: Resources,
    pub upgrade_base_minutes: u32,
    /// Per-level growth of upgrade durations. The granary runs slower.
    pub time_scale: f64,
    /// Uniform production bonus contributed per level.
    pub production_bonus_per_level: f64,
}

pub fn get_building_data(kind: BuildingKind) -> &'static BuildingData {
    match kind {
        BuildingKind::CityCenter => &CITY_CENTER,
        BuildingKind::Warehouse => &WAREHOUSE,
        BuildingKind::Granary => &GRANARY,
        BuildingKind::Wall => &WALL,
        BuildingKind::RallyPoint => &RALLY_POINT,
        BuildingKind::Barracks => &BARRACKS,
        BuildingKind::Archery => &ARCHERY,
        BuildingKind::Stable => &STABLE,
        BuildingKind::HideSpot => &HIDE_SPOT,
    }
}

pub fn creation_cost(kind: BuildingKind) -> Resources {
    get_building_data(kind).creation_cost
}

pub fn creation_minutes(kind: BuildingKind) -> u32 {
    get_building_data(kind).creation_minutes
}

/// Cost to upgrade a building currently at `level`.
pub fn upgrade_cost(kind: BuildingKind, level: u8) -> Resources {
    let data = get_building_data(kind);
    (data.upgrade_base_cost * COST_GROWTH.powi(level as i32)).floor()
}

/// Duration of an upgrade from `level` to `level + 1`, in minutes.
pub fn upgrade_minutes(kind: BuildingKind, level: u8) -> u32 {
    let data = get_building_data(kind);
    (data.upgrade_base_minutes as f64 * data.time_scale.powi(level as i32)).floor() as u32
}

/// Production bonus a level-`level` building contributes, uniform across all
/// four resources.
pub fn production_bonus(kind: BuildingKind, level: u8) -> f64 {
    get_building_data(kind).production_bonus_per_level * level as f64
}

/// Whether creating, leveling or removing this building changes any village
/// production rate or storage capacity. Tasks on such buildings must be
/// applied mid-integration by the resource accrual engine.
pub fn affects_production(kind: BuildingKind) -> bool {
    matches!(
        kind,
        BuildingKind::CityCenter | BuildingKind::Warehouse | BuildingKind::Granary
    )
}

static CITY_CENTER: BuildingData = BuildingData {
    creation_cost: Resources::new(150.0, 180.0, 100.0, 0.0),
    creation_minutes: 30,
    upgrade_base_cost: Resources::new(200.0, 240.0, 140.0, 0.0),
    upgrade_base_minutes: 30,
    time_scale: 1.2,
    production_bonus_per_level: 0.05,
};

static WAREHOUSE: BuildingData = BuildingData {
    creation_cost: Resources::new(70.0, 90.0, 50.0, 0.0),
    creation_minutes: 20,
    upgrade_base_cost: Resources::new(100.0, 120.0, 70.0, 0.0),
    upgrade_base_minutes: 20,
    time_scale: 1.2,
    production_bonus_per_level: 0.03,
};

static GRANARY: BuildingData = BuildingData {
    creation_cost: Resources::new(60.0, 75.0, 40.0, 0.0),
    creation_minutes: 20,
    upgrade_base_cost: Resources::new(80.0, 100.0, 60.0, 0.0),
    upgrade_base_minutes: 20,
    time_scale: 1.24,
    production_bonus_per_level: 0.03,
};

static WALL: BuildingData = BuildingData {
    creation_cost: Resources::new(30.0, 200.0, 80.0, 0.0),
    creation_minutes: 15,
    upgrade_base_cost: Resources::new(50.0, 250.0, 100.0, 0.0),
    upgrade_base_minutes: 15,
    time_scale: 1.2,
    production_bonus_per_level: 0.0,
};

static RALLY_POINT: BuildingData = BuildingData {
    creation_cost: Resources::new(100.0, 50.0, 30.0, 0.0),
    creation_minutes: 10,
    upgrade_base_cost: Resources::new(150.0, 70.0, 40.0, 0.0),
    upgrade_base_minutes: 10,
    time_scale: 1.2,
    production_bonus_per_level: 0.0,
};

static BARRACKS: BuildingData = BuildingData {
    creation_cost: Resources::new(130.0, 120.0, 80.0, 0.0),
    creation_minutes: 25,
    upgrade_base_cost: Resources::new(180.0, 150.0, 100.0, 0.0),
    upgrade_base_minutes: 25,
    time_scale: 1.2,
    production_bonus_per_level: 0.0,
};

static ARCHERY: BuildingData = BuildingData {
    creation_cost: Resources::new(170.0, 100.0, 100.0, 0.0),
    creation_minutes: 25,
    upgrade_base_cost: Resources::new(220.0, 120.0, 140.0, 0.0),
    upgrade_base_minutes: 25,
    time_scale: 1.2,
    production_bonus_per_level: 0.0,
};

static STABLE: BuildingData = BuildingData {
    creation_cost: Resources::new(150.0, 150.0, 150.0, 0.0),
    creation_minutes: 30,
    upgrade_base_cost: Resources::new(200.0, 180.0, 200.0, 0.0),
    upgrade_base_minutes: 30,
    time_scale: 1.2,
    production_bonus_per_level: 0.0,
};

static HIDE_SPOT: BuildingData = BuildingData {
    creation_cost: Resources::new(70.0, 120.0, 60.0, 0.0),
    creation_minutes: 15,
    upgrade_base_cost: Resources::new(100.0, 150.0, 80.0, 0.0),
    upgrade_base_minutes: 15,
    time_scale: 1.2,
    production_bonus_per_level: 0.0,
};
