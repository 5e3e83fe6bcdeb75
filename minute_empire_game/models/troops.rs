use minute_empire_types::common::Resources;
use minute_empire_types::map::Location;
use minute_empire_types::tasks::ActionKind;
use minute_empire_types::troops::{Troop, TroopKind};

#[derive(Debug, Clone, Copy)]
pub struct TroopStats {
    pub atk: f64,
    pub def: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct BackpackCapacity {
    /// Cap for each single resource.
    pub per_resource: f64,
    /// Cap shared across all four resources.
    pub total: f64,
}

#[derive(Debug, Clone)]
struct TroopData {
    training_cost: Resources,
    training_minutes_per_unit: u32,
    stats: TroopStats,
    backpack_per_resource: f64,
    backpack_total: f64,
}

fn get_troop_data(kind: TroopKind) -> &'static TroopData {
    match kind {
        TroopKind::Militia => &MILITIA,
        TroopKind::Archer => &ARCHER,
        TroopKind::LightCavalry => &LIGHT_CAVALRY,
        TroopKind::Pikeman => &PIKEMAN,
    }
}

pub fn stats(kind: TroopKind) -> TroopStats {
    get_troop_data(kind).stats
}

pub fn training_cost(kind: TroopKind, quantity: u32) -> Resources {
    get_troop_data(kind).training_cost * quantity as f64
}

pub fn training_minutes(kind: TroopKind, quantity: u32) -> u32 {
    get_troop_data(kind).training_minutes_per_unit * quantity
}

pub fn backpack_capacity(kind: TroopKind, quantity: u32) -> BackpackCapacity {
    let data = get_troop_data(kind);
    BackpackCapacity {
        per_resource: data.backpack_per_resource * quantity as f64,
        total: data.backpack_total * quantity as f64,
    }
}

/// Remaining carrying room of a troop, given what it already holds.
pub fn remaining_capacity(troop: &Troop) -> (Resources, f64) {
    let capacity = backpack_capacity(troop.kind, troop.quantity);
    let mut per_resource = Resources::ZERO;
    for kind in minute_empire_types::common::ResourceKind::ALL {
        per_resource.set(
            kind,
            (capacity.per_resource - troop.backpack.get(kind)).max(0.0),
        );
    }
    let total = (capacity.total - troop.backpack.total()).max(0.0);
    (per_resource, total)
}

fn orthogonal(from: Location) -> Vec<Location> {
    let Location { x, y } = from;
    vec![
        Location::new(x, y + 1),
        Location::new(x, y - 1),
        Location::new(x + 1, y),
        Location::new(x - 1, y),
    ]
}

fn diagonal(from: Location) -> Vec<Location> {
    let Location { x, y } = from;
    vec![
        Location::new(x + 1, y + 1),
        Location::new(x + 1, y - 1),
        Location::new(x - 1, y + 1),
        Location::new(x - 1, y - 1),
    ]
}

fn knight_moves(from: Location) -> Vec<Location> {
    let Location { x, y } = from;
    vec![
        Location::new(x + 2, y + 1),
        Location::new(x + 2, y - 1),
        Location::new(x - 2, y + 1),
        Location::new(x - 2, y - 1),
        Location::new(x + 1, y + 2),
        Location::new(x - 1, y + 2),
        Location::new(x + 1, y - 2),
        Location::new(x - 1, y - 2),
    ]
}

/// Tiles a troop of the given kind may move to from `from`.
pub fn valid_move_spots(kind: TroopKind, from: Location) -> Vec<Location> {
    match kind {
        TroopKind::Militia => {
            let mut spots = orthogonal(from);
            spots.extend(diagonal(from));
            spots
        }
        TroopKind::Archer => orthogonal(from),
        TroopKind::LightCavalry => knight_moves(from),
        TroopKind::Pikeman => {
            let mut spots = orthogonal(from);
            spots.extend(diagonal(from));
            spots.extend(knight_moves(from));
            spots
        }
    }
}

/// Tiles a troop of the given kind may attack from `from`.
pub fn valid_attack_spots(kind: TroopKind, from: Location) -> Vec<Location> {
    match kind {
        // melee types strike only where they stand
        TroopKind::Militia | TroopKind::LightCavalry => vec![from],
        TroopKind::Archer => {
            let mut spots = orthogonal(from);
            spots.extend(diagonal(from));
            spots
        }
        TroopKind::Pikeman => {
            let mut spots = vec![from];
            spots.extend(knight_moves(from));
            spots
        }
    }
}

pub fn can_move_to(kind: TroopKind, from: Location, to: Location) -> bool {
    valid_move_spots(kind, from).contains(&to)
}

pub fn can_attack(kind: TroopKind, from: Location, to: Location) -> bool {
    valid_attack_spots(kind, from).contains(&to)
}

/// Travel time of an action over the Manhattan distance between the
/// endpoints. Attacks take twice as long as moves.
pub fn travel_minutes(action: ActionKind, from: Location, to: Location) -> u32 {
    let distance = from.distance(&to);
    match action {
        ActionKind::Move => distance,
        ActionKind::Attack => distance * 2,
    }
}

static MILITIA: TroopData = TroopData {
    training_cost: Resources::new(50.0, 30.0, 20.0, 10.0),
    training_minutes_per_unit: 1,
    stats: TroopStats { atk: 1.0, def: 1.0 },
    backpack_per_resource: 50.0,
    backpack_total: 100.0,
};

static ARCHER: TroopData = TroopData {
    training_cost: Resources::new(70.0, 40.0, 30.0, 20.0),
    training_minutes_per_unit: 1,
    stats: TroopStats { atk: 1.0, def: 0.5 },
    backpack_per_resource: 30.0,
    backpack_total: 60.0,
};

static LIGHT_CAVALRY: TroopData = TroopData {
    training_cost: Resources::new(100.0, 60.0, 50.0, 30.0),
    training_minutes_per_unit: 1,
    stats: TroopStats { atk: 1.0, def: 1.0 },
    backpack_per_resource: 100.0,
    backpack_total: 250.0,
};

static PIKEMAN: TroopData = TroopData {
    training_cost: Resources::new(80.0, 50.0, 40.0, 25.0),
    training_minutes_per_unit: 1,
    stats: TroopStats { atk: 1.0, def: 2.0 },
    backpack_per_resource: 70.0,
    backpack_total: 150.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_militia_moves_to_eight_neighbours() {
        let spots = valid_move_spots(TroopKind::Militia, Location::new(0, 0));
        assert_eq!(spots.len(), 8);
        assert!(spots.contains(&Location::new(1, 1)));
        assert!(!spots.contains(&Location::new(0, 0)));
        assert!(!spots.contains(&Location::new(2, 0)));
    }

    #[test]
    fn test_archer_moves_orthogonally_attacks_around() {
        let moves = valid_move_spots(TroopKind::Archer, Location::new(3, 3));
        assert_eq!(moves.len(), 4);
        assert!(!moves.contains(&Location::new(4, 4)));

        let attacks = valid_attack_spots(TroopKind::Archer, Location::new(3, 3));
        assert_eq!(attacks.len(), 8);
        assert!(attacks.contains(&Location::new(4, 4)));
        assert!(!attacks.contains(&Location::new(3, 3)));
    }

    #[test]
    fn test_cavalry_moves_like_a_knight() {
        let moves = valid_move_spots(TroopKind::LightCavalry, Location::new(0, 0));
        assert_eq!(moves.len(), 8);
        assert!(moves.contains(&Location::new(2, 1)));
        assert!(!moves.contains(&Location::new(1, 1)));

        let attacks = valid_attack_spots(TroopKind::LightCavalry, Location::new(0, 0));
        assert_eq!(attacks, vec![Location::new(0, 0)]);
    }

    #[test]
    fn test_pikeman_reach() {
        let moves = valid_move_spots(TroopKind::Pikeman, Location::new(0, 0));
        assert_eq!(moves.len(), 16);

        let attacks = valid_attack_spots(TroopKind::Pikeman, Location::new(0, 0));
        assert_eq!(attacks.len(), 9);
        assert!(attacks.contains(&Location::new(0, 0)));
        assert!(attacks.contains(&Location::new(-1, 2)));
        assert!(!attacks.contains(&Location::new(1, 0)));
    }

    #[test]
    fn test_training_cost_scales_with_quantity() {
        let cost = training_cost(TroopKind::Militia, 10);
        assert_eq!(cost, Resources::new(500.0, 300.0, 200.0, 100.0));
        assert_eq!(training_minutes(TroopKind::Pikeman, 7), 7);
    }

    #[test]
    fn test_travel_minutes() {
        let from = Location::new(0, 0);
        let to = Location::new(2, -1);
        assert_eq!(travel_minutes(ActionKind::Move, from, to), 3);
        assert_eq!(travel_minutes(ActionKind::Attack, from, to), 6);
    }

    #[test]
    fn test_backpack_capacity_scales() {
        let capacity = backpack_capacity(TroopKind::LightCavalry, 4);
        assert_eq!(capacity.per_resource, 400.0);
        assert_eq!(capacity.total, 1000.0);
    }
}
