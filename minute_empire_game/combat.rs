use minute_empire_types::common::{DocId, ResourceKind, Resources};
use minute_empire_types::map::Location;
use minute_empire_types::tasks::ActionKind;
use minute_empire_types::troops::{Troop, TroopKind};

use crate::models::troops::{self, remaining_capacity};

/// Loss fraction beyond which a side is annihilated outright.
pub const ALL_DEAD_THRESHOLD: f64 = 0.85;
/// Loss fraction below which a side takes no casualties at all.
pub const ALL_ALIVE_THRESHOLD: f64 = 0.15;
/// Exponent that magnifies strength imbalances.
pub const SNOWBALL: f64 = 1.5;
/// Attacker power reduction when the defenders fight on their owner's tile.
pub const ATTACKER_DISCOUNT: f64 = 0.3;

const EPSILON: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct CombatReport {
    pub attacker_loss: f64,
    pub defender_loss: f64,
    pub attacker_all_dead: bool,
    pub all_defenders_defeated: bool,
    /// Attacker with post-combat quantity and backpack; `None` if wiped out.
    pub attacker_after: Option<Troop>,
    /// Surviving defenders with post-combat quantities and backpacks.
    pub defenders_after: Vec<Troop>,
    pub fallen_defender_ids: Vec<DocId>,
    pub captured_by_attacker: Resources,
    pub captured_by_defenders: Resources,
}

fn median3(a: f64, b: f64, c: f64) -> f64 {
    let mut values = [a, b, c];
    values.sort_by(|x, y| x.total_cmp(y));
    values[1]
}

fn snowball_ratio(offense: f64, defense: f64) -> f64 {
    if defense > 0.0 {
        (offense / defense).powf(SNOWBALL)
    } else {
        0.0
    }
}

/// Resolves combat between one attacker and the troops holding the target
/// tile. Pure: the caller persists the returned quantities/backpacks,
/// deletes the fallen, and decides about movement and stealing.
pub fn resolve_combat(
    attacker: &Troop,
    defenders: &[Troop],
    action: ActionKind,
    start: Location,
    target: Location,
    defender_home_bonus: bool,
) -> CombatReport {
    let attacker_stats = troops::stats(attacker.kind);
    let mut attacker_atk = attacker.quantity as f64 * attacker_stats.atk;
    let mut attacker_def = attacker.quantity as f64 * attacker_stats.def;

    let mut defender_atk: f64 = defenders
        .iter()
        .map(|d| d.quantity as f64 * troops::stats(d.kind).atk)
        .sum();
    let defender_def: f64 = defenders
        .iter()
        .map(|d| d.quantity as f64 * troops::stats(d.kind).def)
        .sum();

    // Ranged immunity. An archer firing from range takes no return fire; a
    // pikeman striking any tile other than its own does the same.
    if action == ActionKind::Attack {
        match attacker.kind {
            TroopKind::Archer if troops::can_attack(TroopKind::Archer, start, target) => {
                defender_atk = 0.0;
            }
            TroopKind::Pikeman
                if troops::can_attack(TroopKind::Pikeman, start, target) && target != start =>
            {
                defender_atk = 0.0;
            }
            _ => {}
        }
    }

    // Defending archers cannot fire on their own tile.
    for defender in defenders {
        if defender.kind == TroopKind::Archer && defender.location == target {
            defender_atk -= defender.quantity as f64 * troops::stats(TroopKind::Archer).atk;
        }
    }
    defender_atk = defender_atk.max(0.0);

    if defender_home_bonus {
        attacker_atk *= 1.0 - ATTACKER_DISCOUNT;
        attacker_def *= 1.0 - ATTACKER_DISCOUNT;
    }

    let attacker_ratio = snowball_ratio(attacker_atk, defender_def);
    let defender_ratio = snowball_ratio(defender_atk, attacker_def);

    let mut attacker_loss = median3(0.0, defender_ratio, 1.0);
    let mut defender_loss = median3(0.0, attacker_ratio, 1.0);

    if attacker_loss > ALL_DEAD_THRESHOLD {
        attacker_loss = 1.0;
    } else if attacker_loss < ALL_ALIVE_THRESHOLD {
        attacker_loss = 0.0;
    }
    if defender_loss > ALL_DEAD_THRESHOLD {
        defender_loss = 1.0;
    } else if defender_loss < ALL_ALIVE_THRESHOLD {
        defender_loss = 0.0;
    }

    // Casualties round down; a stack at quantity zero is gone.
    let attacker_lost = (attacker.quantity as f64 * attacker_loss).floor() as u32;
    let attacker_quantity = attacker.quantity - attacker_lost;
    let attacker_all_dead = attacker_quantity == 0;
    let attacker_loss_ratio = if attacker.quantity > 0 {
        attacker_lost as f64 / attacker.quantity as f64
    } else {
        1.0
    };

    // Pools of resources dropped by the fallen, computed from the pre-combat
    // backpacks. Survivors keep the proportional remainder.
    let attacker_pool = attacker.backpack * attacker_loss_ratio;
    let mut attacker_after = if attacker_all_dead {
        None
    } else {
        let mut survivor = attacker.clone();
        survivor.quantity = attacker_quantity;
        survivor.backpack = attacker.backpack * (1.0 - attacker_loss_ratio);
        Some(survivor)
    };

    let mut defender_pool = Resources::ZERO;
    let mut defenders_after = Vec::new();
    let mut fallen_defender_ids = Vec::new();
    for defender in defenders {
        let lost = (defender.quantity as f64 * defender_loss).floor() as u32;
        let quantity = defender.quantity - lost;
        let loss_ratio = if defender.quantity > 0 {
            lost as f64 / defender.quantity as f64
        } else {
            1.0
        };
        defender_pool = defender_pool + defender.backpack * loss_ratio;

        if quantity == 0 {
            fallen_defender_ids.push(defender.id.clone());
        } else {
            let mut survivor = defender.clone();
            survivor.quantity = quantity;
            survivor.backpack = defender.backpack * (1.0 - loss_ratio);
            defenders_after.push(survivor);
        }
    }
    let all_defenders_defeated = defenders_after.is_empty();

    let captured_by_defenders = if !attacker_pool.is_empty() && !defenders_after.is_empty() {
        distribute_to_defenders(&attacker_pool, &mut defenders_after)
    } else {
        Resources::ZERO
    };

    let captured_by_attacker = match attacker_after.as_mut() {
        Some(survivor) if !defender_pool.is_empty() => {
            distribute_to_attacker(&defender_pool, survivor)
        }
        _ => Resources::ZERO,
    };

    CombatReport {
        attacker_loss,
        defender_loss,
        attacker_all_dead,
        all_defenders_defeated,
        attacker_after,
        defenders_after,
        fallen_defender_ids,
        captured_by_attacker,
        captured_by_defenders,
    }
}

/// Hands the fallen defenders' pool to the surviving attacker, bounded by its
/// per-resource and total remaining capacity. Overflow is lost.
fn distribute_to_attacker(pool: &Resources, attacker: &mut Troop) -> Resources {
    let (per_resource, mut total_remaining) = remaining_capacity(attacker);
    let mut captured = Resources::ZERO;
    for kind in ResourceKind::ALL {
        let amount = pool.get(kind);
        if amount <= 0.0 {
            continue;
        }
        let take = amount.min(per_resource.get(kind)).min(total_remaining);
        if take > 0.0 {
            attacker.backpack.add(kind, take);
            captured.set(kind, take);
            total_remaining -= take;
        }
    }
    captured
}

/// Spreads the fallen attacker's pool across surviving defenders in
/// proportion to their remaining per-resource capacity.
fn distribute_to_defenders(pool: &Resources, defenders: &mut [Troop]) -> Resources {
    let mut captured = Resources::ZERO;
    let mut total_remaining: Vec<f64> = defenders
        .iter()
        .map(|d| remaining_capacity(d).1)
        .collect();

    for kind in ResourceKind::ALL {
        let amount = pool.get(kind);
        if amount <= 0.0 {
            continue;
        }

        let rooms: Vec<f64> = defenders
            .iter()
            .enumerate()
            .map(|(i, d)| remaining_capacity(d).0.get(kind).min(total_remaining[i]))
            .collect();
        let total_room: f64 = rooms.iter().sum();
        if total_room <= 0.0 {
            continue;
        }

        for (i, defender) in defenders.iter_mut().enumerate() {
            if rooms[i] <= 0.0 {
                continue;
            }
            let share = amount * (rooms[i] / total_room);
            let take = share.min(rooms[i]);
            if take > 0.0 {
                defender.backpack.add(kind, take);
                total_remaining[i] -= take;
                captured.add(kind, take);
            }
        }
    }
    captured
}

/// Plans the theft of village resources by a troop standing on an undefended
/// enemy village: repeated proportional passes until the backpack is full or
/// the village is dry. Returns whole-unit amounts per resource; the caller
/// debits the village first and credits the troop second.
pub fn plan_steal(troop: &Troop, village_resources: &Resources) -> Resources {
    let (per_resource, mut total_remaining) = remaining_capacity(troop);
    let mut stolen = Resources::ZERO;

    loop {
        if total_remaining <= EPSILON {
            break;
        }
        let mut available = Resources::ZERO;
        for kind in ResourceKind::ALL {
            let room = per_resource.get(kind) - stolen.get(kind);
            if room <= EPSILON {
                continue;
            }
            let left = village_resources.get(kind) - stolen.get(kind);
            if left > EPSILON {
                available.set(kind, left);
            }
        }
        let total_available = available.total();
        if total_available <= EPSILON {
            break;
        }

        let mut made_progress = false;
        for kind in ResourceKind::ALL {
            if available.get(kind) <= 0.0 {
                continue;
            }
            let room = per_resource.get(kind) - stolen.get(kind);
            let take = (total_remaining * available.get(kind) / total_available)
                .min(room)
                .min(available.get(kind));
            if take > EPSILON {
                stolen.add(kind, take);
                total_remaining -= take;
                made_progress = true;
            }
        }
        if !made_progress {
            break;
        }
    }

    // whole units only, never more than the village actually holds
    let mut rounded = Resources::ZERO;
    for kind in ResourceKind::ALL {
        let amount = stolen
            .get(kind)
            .floor()
            .min(village_resources.get(kind).floor());
        rounded.set(kind, amount.max(0.0));
    }
    rounded
}
