use minute_empire_types::buildings::FieldKind;
use minute_empire_types::common::Resources;

/// Per-level growth of a field's hourly output.
const PRODUCTION_GROWTH: f64 = 1.2;
/// Per-level growth of upgrade costs.
const COST_GROWTH: f64 = 1.5;
/// Per-level growth of upgrade durations.
const TIME_GROWTH: f64 = 1.42;

#[derive(Debug, Clone)]
pub struct FieldData {
    pub creation_cost: Resources,
    pub creation_minutes: u32,
    pub upgrade_base_cost: Resources,
    pub upgrade_base_minutes: u32,
    /// Hourly output of a level-0 blueprint; actual output scales by level.
    pub base_rate: f64,
}

pub fn get_field_data(kind: FieldKind) -> &'static FieldData {
    match kind {
        FieldKind::Wood => &WOOD,
        FieldKind::Stone => &STONE,
        FieldKind::Iron => &IRON,
        FieldKind::Food => &FOOD,
    }
}

pub fn creation_cost(kind: FieldKind) -> Resources {
    get_field_data(kind).creation_cost
}

pub fn creation_minutes(kind: FieldKind) -> u32 {
    get_field_data(kind).creation_minutes
}

/// Cost to upgrade a field currently at `level`.
pub fn upgrade_cost(kind: FieldKind, level: u8) -> Resources {
    let data = get_field_data(kind);
    (data.upgrade_base_cost * COST_GROWTH.powi(level as i32)).floor()
}

/// Duration of an upgrade from `level` to `level + 1`, in minutes.
pub fn upgrade_minutes(kind: FieldKind, level: u8) -> u32 {
    let data = get_field_data(kind);
    (data.upgrade_base_minutes as f64 * TIME_GROWTH.powi(level as i32)).floor() as u32
}

/// Hourly production of a level-`level` field under the given cumulative
/// building bonus.
pub fn production_per_hour(kind: FieldKind, level: u8, bonus: f64) -> f64 {
    let data = get_field_data(kind);
    data.base_rate * PRODUCTION_GROWTH.powi(level as i32) * (1.0 + bonus)
}

static WOOD: FieldData = FieldData {
    creation_cost: Resources::new(40.0, 50.0, 25.0, 0.0),
    creation_minutes: 10,
    upgrade_base_cost: Resources::new(50.0, 60.0, 30.0, 0.0),
    upgrade_base_minutes: 10,
    base_rate: 30.0,
};

static STONE: FieldData = FieldData {
    creation_cost: Resources::new(50.0, 40.0, 30.0, 0.0),
    creation_minutes: 12,
    upgrade_base_cost: Resources::new(60.0, 50.0, 40.0, 0.0),
    upgrade_base_minutes: 12,
    base_rate: 24.0,
};

static IRON: FieldData = FieldData {
    creation_cost: Resources::new(60.0, 70.0, 40.0, 0.0),
    creation_minutes: 15,
    upgrade_base_cost: Resources::new(70.0, 80.0, 50.0, 0.0),
    upgrade_base_minutes: 15,
    base_rate: 18.0,
};

static FOOD: FieldData = FieldData {
    creation_cost: Resources::new(30.0, 30.0, 15.0, 0.0),
    creation_minutes: 8,
    upgrade_base_cost: Resources::new(40.0, 40.0, 20.0, 0.0),
    upgrade_base_minutes: 8,
    base_rate: 36.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_one_wood_rate() {
        // 30 * 1.2^1 = 36/h with no building bonus
        assert_eq!(production_per_hour(FieldKind::Wood, 1, 0.0), 36.0);
    }

    #[test]
    fn test_bonus_multiplies_rate() {
        let plain = production_per_hour(FieldKind::Food, 2, 0.0);
        let boosted = production_per_hour(FieldKind::Food, 2, 0.10);
        assert!((boosted - plain * 1.10).abs() < 1e-9);
    }

    #[test]
    fn test_upgrade_cost_growth() {
        let l0 = upgrade_cost(FieldKind::Wood, 0);
        assert_eq!(l0, Resources::new(50.0, 60.0, 30.0, 0.0));

        let l2 = upgrade_cost(FieldKind::Wood, 2);
        // floor(50 * 2.25), floor(60 * 2.25), floor(30 * 2.25)
        assert_eq!(l2, Resources::new(112.0, 135.0, 67.0, 0.0));
    }

    #[test]
    fn test_upgrade_time_growth() {
        assert_eq!(upgrade_minutes(FieldKind::Stone, 0), 12);
        // floor(12 * 1.42^2) = floor(24.19...)
        assert_eq!(upgrade_minutes(FieldKind::Stone, 2), 24);
    }
}
