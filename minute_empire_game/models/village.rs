use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use minute_empire_types::buildings::{BuildingKind, FieldKind};
use minute_empire_types::common::{DocId, ResourceKind, Resources};
use minute_empire_types::errors::GameError;
use minute_empire_types::map::Location;
use minute_empire_types::tasks::{ConstructionTask, TaskKind, TroopTrainingTask};
use minute_empire_types::troops::TroopKind;

use super::buildings::{
    self, BASE_STORAGE_CAPACITY, STORAGE_BONUS_PER_LEVEL, affects_production,
};
use super::{fields, troops};

pub const MAX_FIELDS: usize = 20;
pub const MAX_CONSTRUCTIONS: usize = 25;
pub const LAST_FIELD_SLOT: u8 = 19;
pub const LAST_CONSTRUCTION_SLOT: u8 = 24;
/// Reserved slot addressing the single wall entity in commands.
pub const WALL_SLOT: u8 = 25;

/// Starter stock granted to a freshly founded village.
const STARTING_RESOURCES: Resources = Resources::new(200.0, 200.0, 200.0, 200.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Construction {
    #[serde(rename = "type")]
    pub kind: BuildingKind,
    pub level: u8,
    pub slot: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceField {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub level: u8,
    pub slot: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub wall: Wall,
    pub constructions: Vec<Construction>,
}

/// What a call to [`Village::advance_to`] did: ids of rate-affecting tasks it
/// applied mid-integration, and ids of tasks whose apply-side failed (they are
/// marked processed and skipped; the caller logs them).
#[derive(Debug, Default)]
pub struct AdvanceOutcome {
    pub applied: Vec<DocId>,
    pub skipped: Vec<DocId>,
}

/// The authoritative state unit: an owned, located village with embedded
/// fields, city constructions and pending task lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Village {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub name: String,
    pub owner_id: DocId,
    pub location: Location,
    pub resources: Resources,
    pub resource_fields: Vec<ResourceField>,
    pub city: City,
    pub construction_tasks: Vec<ConstructionTask>,
    #[serde(default)]
    pub troop_training_tasks: Vec<TroopTrainingTask>,
    pub res_update_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Village {
    /// Founds a new village: level-1 wall, level-1 city center, one starter
    /// field of each kind, and a small initial stock.
    pub fn new(name: String, owner_id: DocId, location: Location, now: DateTime<Utc>) -> Self {
        let starter_fields = [
            FieldKind::Wood,
            FieldKind::Stone,
            FieldKind::Iron,
            FieldKind::Food,
        ]
        .iter()
        .enumerate()
        .map(|(slot, &kind)| ResourceField {
            kind,
            level: 1,
            slot: slot as u8,
        })
        .collect();

        Self {
            id: DocId::new(),
            name,
            owner_id,
            location,
            resources: STARTING_RESOURCES,
            resource_fields: starter_fields,
            city: City {
                wall: Wall { level: 1 },
                constructions: vec![Construction {
                    kind: BuildingKind::CityCenter,
                    level: 1,
                    slot: 1,
                }],
            },
            construction_tasks: vec![],
            troop_training_tasks: vec![],
            res_update_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_building(&self, slot: u8) -> Option<&Construction> {
        self.city.constructions.iter().find(|c| c.slot == slot)
    }

    pub fn get_field(&self, slot: u8) -> Option<&ResourceField> {
        self.resource_fields.iter().find(|f| f.slot == slot)
    }

    /// Highest level among constructions of the given kind; 0 if absent.
    pub fn building_level(&self, kind: BuildingKind) -> u8 {
        self.city
            .constructions
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.level)
            .max()
            .unwrap_or(0)
    }

    /// Cumulative production bonus from all bonus-granting constructions,
    /// uniform across the four resources.
    pub fn production_bonus(&self) -> f64 {
        self.city
            .constructions
            .iter()
            .map(|c| buildings::production_bonus(c.kind, c.level))
            .sum()
    }

    /// Hourly production rate of one resource.
    pub fn resource_rate(&self, kind: ResourceKind) -> f64 {
        let bonus = self.production_bonus();
        let field_kind = match kind {
            ResourceKind::Wood => FieldKind::Wood,
            ResourceKind::Stone => FieldKind::Stone,
            ResourceKind::Iron => FieldKind::Iron,
            ResourceKind::Food => FieldKind::Food,
        };
        self.resource_fields
            .iter()
            .filter(|f| f.kind == field_kind)
            .map(|f| fields::production_per_hour(f.kind, f.level, bonus))
            .sum()
    }

    pub fn resource_rates(&self) -> Resources {
        Resources::new(
            self.resource_rate(ResourceKind::Wood),
            self.resource_rate(ResourceKind::Stone),
            self.resource_rate(ResourceKind::Iron),
            self.resource_rate(ResourceKind::Food),
        )
    }

    /// Storage cap for one resource. Food is bounded by the granary, the
    /// other three by the warehouse; no building means base capacity only.
    pub fn storage_capacity(&self, kind: ResourceKind) -> f64 {
        let level = match kind {
            ResourceKind::Food => self.building_level(BuildingKind::Granary),
            _ => self.building_level(BuildingKind::Warehouse),
        };
        BASE_STORAGE_CAPACITY * (1.0 + STORAGE_BONUS_PER_LEVEL * level as f64)
    }

    pub fn has_enough_resources(&self, cost: &Resources) -> bool {
        self.resources.covers(cost)
    }

    pub fn deduct_resources(&mut self, cost: &Resources) -> Result<(), GameError> {
        if !self.has_enough_resources(cost) {
            return Err(GameError::NotEnoughResources);
        }
        for kind in ResourceKind::ALL {
            self.resources.add(kind, -cost.get(kind));
        }
        Ok(())
    }

    /// Stores resources, clamping each at its storage capacity. Returns what
    /// actually fit; the overflow is gone.
    pub fn store_resources(&mut self, amounts: &Resources) -> Resources {
        let mut deposited = Resources::ZERO;
        for kind in ResourceKind::ALL {
            let amount = amounts.get(kind);
            if amount <= 0.0 {
                continue;
            }
            let room = (self.storage_capacity(kind) - self.resources.get(kind)).max(0.0);
            let fit = amount.min(room);
            if fit > 0.0 {
                self.resources.add(kind, fit);
                deposited.set(kind, fit);
            }
        }
        deposited
    }

    pub fn pending_construction_tasks(&self) -> impl Iterator<Item = &ConstructionTask> {
        self.construction_tasks.iter().filter(|t| !t.processed)
    }

    pub fn pending_training_tasks(&self) -> impl Iterator<Item = &TroopTrainingTask> {
        self.troop_training_tasks.iter().filter(|t| !t.processed)
    }

    fn has_pending_task_on_slot(&self, slot: u8) -> bool {
        self.pending_construction_tasks().any(|t| t.slot == slot)
    }

    /// Σ levels of everything built, plus target levels of queued upgrades on
    /// targets that already exist.
    pub fn total_population(&self) -> u32 {
        let built: u32 = self
            .city
            .constructions
            .iter()
            .map(|c| c.level as u32)
            .sum::<u32>()
            + self.city.wall.level as u32
            + self
                .resource_fields
                .iter()
                .map(|f| f.level as u32)
                .sum::<u32>();

        let queued_upgrades: u32 = self
            .pending_construction_tasks()
            .filter(|t| match t.task_type {
                TaskKind::UpgradeField => self.get_field(t.slot).is_some(),
                TaskKind::UpgradeBuilding => {
                    t.slot == WALL_SLOT || self.get_building(t.slot).is_some()
                }
                _ => false,
            })
            .map(|t| t.level as u32)
            .sum();

        built + queued_upgrades
    }

    /// Population currently committed to queued work.
    pub fn working_population(&self) -> u32 {
        let construction: u32 = self
            .pending_construction_tasks()
            .map(|t| t.level as u32)
            .sum();
        let training: u32 = self.pending_training_tasks().map(|t| t.quantity).sum();
        construction + training
    }

    pub fn spare_population(&self) -> u32 {
        self.total_population()
            .saturating_sub(self.working_population())
    }

    fn ensure_spare_population(&self, required: u32) -> Result<(), GameError> {
        let available = self.spare_population();
        if available < required {
            return Err(GameError::InsufficientPopulation {
                required,
                available,
            });
        }
        Ok(())
    }

    fn push_construction_task(
        &mut self,
        task_type: TaskKind,
        target_type: String,
        slot: u8,
        level: u8,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> ConstructionTask {
        let task = ConstructionTask {
            id: DocId::new(),
            task_type,
            target_type,
            slot,
            level,
            started_at: now,
            completion_time: now + Duration::minutes(duration_minutes as i64),
            processed: false,
        };
        self.construction_tasks.push(task.clone());
        self.updated_at = now;
        task
    }

    /// Validates and enqueues a field creation; deducts its cost.
    pub fn init_field_construction(
        &mut self,
        kind: FieldKind,
        slot: u8,
        now: DateTime<Utc>,
    ) -> Result<ConstructionTask, GameError> {
        if slot > LAST_FIELD_SLOT {
            return Err(GameError::SlotOutOfRange {
                slot,
                max: LAST_FIELD_SLOT,
            });
        }
        if self.get_field(slot).is_some() {
            return Err(GameError::SlotOccupied { slot });
        }
        if self.has_pending_task_on_slot(slot) {
            return Err(GameError::SlotHasPendingTask { slot });
        }
        if self.resource_fields.len() >= MAX_FIELDS {
            return Err(GameError::FieldLimitReached(MAX_FIELDS));
        }

        let required = required_city_center_level(slot);
        let current = self.building_level(BuildingKind::CityCenter);
        if current < required {
            return Err(GameError::CityCenterTooLow {
                slot,
                required,
                current,
            });
        }

        let cost = fields::creation_cost(kind);
        if !self.has_enough_resources(&cost) {
            return Err(GameError::NotEnoughResources);
        }
        self.ensure_spare_population(1)?;

        self.deduct_resources(&cost)?;
        Ok(self.push_construction_task(
            TaskKind::CreateField,
            kind.to_string(),
            slot,
            1,
            fields::creation_minutes(kind),
            now,
        ))
    }

    /// Validates and enqueues a field upgrade; deducts its cost.
    pub fn init_field_upgrade(
        &mut self,
        slot: u8,
        now: DateTime<Utc>,
    ) -> Result<ConstructionTask, GameError> {
        let field = self
            .get_field(slot)
            .ok_or(GameError::EmptySlot { slot })?
            .clone();
        if self.has_pending_task_on_slot(slot) {
            return Err(GameError::SlotHasPendingTask { slot });
        }

        let cost = fields::upgrade_cost(field.kind, field.level);
        if !self.has_enough_resources(&cost) {
            return Err(GameError::NotEnoughResources);
        }
        let target_level = field.level + 1;
        self.ensure_spare_population((target_level as u32).pow(2))?;

        self.deduct_resources(&cost)?;
        Ok(self.push_construction_task(
            TaskKind::UpgradeField,
            field.kind.to_string(),
            slot,
            target_level,
            fields::upgrade_minutes(field.kind, field.level),
            now,
        ))
    }

    /// Validates and enqueues a field demolition; dismantling costs as much
    /// as the next upgrade would.
    pub fn init_field_destruction(
        &mut self,
        slot: u8,
        now: DateTime<Utc>,
    ) -> Result<ConstructionTask, GameError> {
        let field = self
            .get_field(slot)
            .ok_or(GameError::EmptySlot { slot })?
            .clone();
        if self.has_pending_task_on_slot(slot) {
            return Err(GameError::SlotHasPendingTask { slot });
        }

        let cost = fields::upgrade_cost(field.kind, field.level);
        self.deduct_resources(&cost)?;

        let minutes = if field.level <= 1 {
            fields::creation_minutes(field.kind)
        } else {
            fields::upgrade_minutes(field.kind, field.level)
        };
        Ok(self.push_construction_task(
            TaskKind::DestroyField,
            field.kind.to_string(),
            slot,
            field.level,
            minutes,
            now,
        ))
    }

    /// Validates and enqueues a building creation; deducts its cost.
    pub fn init_building_construction(
        &mut self,
        kind: BuildingKind,
        slot: u8,
        now: DateTime<Utc>,
    ) -> Result<ConstructionTask, GameError> {
        if kind == BuildingKind::Wall {
            return Err(GameError::WallIsPermanent);
        }
        if slot > LAST_CONSTRUCTION_SLOT {
            return Err(GameError::SlotOutOfRange {
                slot,
                max: LAST_CONSTRUCTION_SLOT,
            });
        }
        if self.get_building(slot).is_some() {
            return Err(GameError::SlotOccupied { slot });
        }
        if self.has_pending_task_on_slot(slot) {
            return Err(GameError::SlotHasPendingTask { slot });
        }
        if self.city.constructions.len() >= MAX_CONSTRUCTIONS {
            return Err(GameError::ConstructionLimitReached(MAX_CONSTRUCTIONS));
        }

        let cost = buildings::creation_cost(kind);
        if !self.has_enough_resources(&cost) {
            return Err(GameError::NotEnoughResources);
        }
        self.ensure_spare_population(1)?;

        self.deduct_resources(&cost)?;
        Ok(self.push_construction_task(
            TaskKind::CreateBuilding,
            kind.to_string(),
            slot,
            1,
            buildings::creation_minutes(kind),
            now,
        ))
    }

    /// Validates and enqueues a building upgrade; deducts its cost. The wall
    /// is addressed through its reserved slot.
    pub fn init_building_upgrade(
        &mut self,
        slot: u8,
        now: DateTime<Utc>,
    ) -> Result<ConstructionTask, GameError> {
        let (kind, level) = if slot == WALL_SLOT {
            (BuildingKind::Wall, self.city.wall.level)
        } else {
            let building = self.get_building(slot).ok_or(GameError::EmptySlot { slot })?;
            (building.kind, building.level)
        };
        if self.has_pending_task_on_slot(slot) {
            return Err(GameError::SlotHasPendingTask { slot });
        }

        let cost = buildings::upgrade_cost(kind, level);
        if !self.has_enough_resources(&cost) {
            return Err(GameError::NotEnoughResources);
        }
        let target_level = level + 1;
        self.ensure_spare_population((target_level as u32).pow(2))?;

        self.deduct_resources(&cost)?;
        Ok(self.push_construction_task(
            TaskKind::UpgradeBuilding,
            kind.to_string(),
            slot,
            target_level,
            buildings::upgrade_minutes(kind, level),
            now,
        ))
    }

    /// Validates and enqueues a building demolition. The wall can only be
    /// upgraded, never torn down.
    pub fn init_building_destruction(
        &mut self,
        slot: u8,
        now: DateTime<Utc>,
    ) -> Result<ConstructionTask, GameError> {
        if slot == WALL_SLOT {
            return Err(GameError::WallIsPermanent);
        }
        let building = self
            .get_building(slot)
            .ok_or(GameError::EmptySlot { slot })?
            .clone();
        if self.has_pending_task_on_slot(slot) {
            return Err(GameError::SlotHasPendingTask { slot });
        }

        let cost = buildings::upgrade_cost(building.kind, building.level);
        self.deduct_resources(&cost)?;

        let minutes = if building.level <= 1 {
            buildings::creation_minutes(building.kind)
        } else {
            buildings::upgrade_minutes(building.kind, building.level)
        };
        Ok(self.push_construction_task(
            TaskKind::DestroyBuilding,
            building.kind.to_string(),
            slot,
            building.level,
            minutes,
            now,
        ))
    }

    /// Validates and enqueues troop training; deducts its cost.
    pub fn init_troop_training(
        &mut self,
        kind: TroopKind,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<TroopTrainingTask, GameError> {
        if quantity == 0 {
            return Err(GameError::InvalidTrainingQuantity);
        }
        if self
            .pending_training_tasks()
            .any(|t| t.troop_type == kind.to_string())
        {
            return Err(GameError::TrainingAlreadyQueued(kind));
        }

        let cost = troops::training_cost(kind, quantity);
        if !self.has_enough_resources(&cost) {
            return Err(GameError::NotEnoughResources);
        }
        self.ensure_spare_population(quantity)?;

        self.deduct_resources(&cost)?;
        let task = TroopTrainingTask {
            id: DocId::new(),
            troop_type: kind.to_string(),
            quantity,
            started_at: now,
            completion_time: now
                + Duration::minutes(troops::training_minutes(kind, quantity) as i64),
            processed: false,
        };
        self.troop_training_tasks.push(task.clone());
        self.updated_at = now;
        Ok(task)
    }

    /// Marks a training task processed and hands back its details, or `None`
    /// if it is unknown or already processed.
    pub fn take_training_task(&mut self, task_id: &DocId) -> Option<TroopTrainingTask> {
        let task = self
            .troop_training_tasks
            .iter_mut()
            .find(|t| &t.id == task_id && !t.processed)?;
        task.processed = true;
        Some(task.clone())
    }

    /// Applies a construction task's mutation and marks it processed.
    /// Idempotent: an already-processed task is a no-op. A task whose slot
    /// state contradicts it is still marked processed and surfaces the error
    /// for the caller to log.
    pub fn apply_construction_task(&mut self, task_id: &DocId) -> Result<(), GameError> {
        let Some(idx) = self.construction_tasks.iter().position(|t| &t.id == task_id) else {
            return Err(GameError::UnknownTargetType(task_id.to_string()));
        };
        if self.construction_tasks[idx].processed {
            return Ok(());
        }
        self.construction_tasks[idx].processed = true;
        let task = self.construction_tasks[idx].clone();
        self.apply_task_mutation(&task)
    }

    fn apply_task_mutation(&mut self, task: &ConstructionTask) -> Result<(), GameError> {
        match task.task_type {
            TaskKind::CreateField => {
                let kind: FieldKind = task
                    .target_type
                    .parse()
                    .map_err(|_| GameError::UnknownTargetType(task.target_type.clone()))?;
                if self.get_field(task.slot).is_some() {
                    return Err(GameError::SlotOccupied { slot: task.slot });
                }
                self.resource_fields.push(ResourceField {
                    kind,
                    level: 1,
                    slot: task.slot,
                });
                Ok(())
            }
            TaskKind::UpgradeField => {
                let field = self
                    .resource_fields
                    .iter_mut()
                    .find(|f| f.slot == task.slot)
                    .ok_or(GameError::EmptySlot { slot: task.slot })?;
                field.level = task.level;
                Ok(())
            }
            TaskKind::DestroyField => {
                if self.get_field(task.slot).is_none() {
                    return Err(GameError::EmptySlot { slot: task.slot });
                }
                self.resource_fields.retain(|f| f.slot != task.slot);
                Ok(())
            }
            TaskKind::CreateBuilding => {
                let kind: BuildingKind = task
                    .target_type
                    .parse()
                    .map_err(|_| GameError::UnknownTargetType(task.target_type.clone()))?;
                if self.get_building(task.slot).is_some() {
                    return Err(GameError::SlotOccupied { slot: task.slot });
                }
                self.city.constructions.push(Construction {
                    kind,
                    level: 1,
                    slot: task.slot,
                });
                Ok(())
            }
            TaskKind::UpgradeBuilding => {
                if task.slot == WALL_SLOT {
                    self.city.wall.level = task.level;
                    return Ok(());
                }
                let building = self
                    .city
                    .constructions
                    .iter_mut()
                    .find(|c| c.slot == task.slot)
                    .ok_or(GameError::EmptySlot { slot: task.slot })?;
                building.level = task.level;
                Ok(())
            }
            TaskKind::DestroyBuilding => {
                if self.get_building(task.slot).is_none() {
                    return Err(GameError::EmptySlot { slot: task.slot });
                }
                self.city.constructions.retain(|c| c.slot != task.slot);
                Ok(())
            }
        }
    }

    fn task_affects_production(task: &ConstructionTask) -> bool {
        if task.task_type.targets_field() {
            return true;
        }
        task.target_type
            .parse::<BuildingKind>()
            .map(affects_production)
            .unwrap_or(false)
    }

    /// Advances `resources` from `res_update_at` to `target`, integrating the
    /// piecewise-constant production rate segment by segment. Rate- or
    /// capacity-changing tasks completing inside the window are applied in
    /// chronological order at their own completion instants, so the result
    /// is independent of how often this is called.
    pub fn advance_to(&mut self, target: DateTime<Utc>) -> Result<AdvanceOutcome, GameError> {
        if target < self.res_update_at {
            return Err(GameError::ResourceClockRegression {
                last_update: self.res_update_at,
                target,
            });
        }

        let mut outcome = AdvanceOutcome::default();
        let mut cursor = self.res_update_at;

        let mut due: Vec<(DateTime<Utc>, DateTime<Utc>, DocId)> = self
            .construction_tasks
            .iter()
            .filter(|t| {
                !t.processed
                    && Self::task_affects_production(t)
                    && t.completion_time > cursor
                    && t.completion_time <= target
            })
            .map(|t| (t.completion_time, t.started_at, t.id.clone()))
            .collect();
        due.sort_by(|a, b| a.cmp(b));

        for (completion_time, _, task_id) in due {
            self.integrate_segment(cursor, completion_time);
            match self.apply_construction_task(&task_id) {
                Ok(()) => outcome.applied.push(task_id),
                Err(_) => outcome.skipped.push(task_id),
            }
            cursor = completion_time;
        }

        self.integrate_segment(cursor, target);
        self.res_update_at = target;
        self.updated_at = target;
        Ok(outcome)
    }

    fn integrate_segment(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) {
        let elapsed_hours = (to - from).num_milliseconds() as f64 / 3_600_000.0;
        if elapsed_hours <= 0.0 {
            return;
        }
        let rates = self.resource_rates();
        for kind in ResourceKind::ALL {
            let current = self.resources.get(kind);
            let capacity = self.storage_capacity(kind);
            if current >= capacity {
                continue;
            }
            let produced = rates.get(kind) * elapsed_hours;
            self.resources.set(kind, (current + produced).min(capacity));
        }
    }
}

/// Minimum city-center level gating each field slot.
pub fn required_city_center_level(slot: u8) -> u8 {
    match slot {
        0..=7 => 1,
        11..=13 => 3,
        17..=19 => 5,
        8..=10 => 7,
        14..=16 => 9,
        _ => u8::MAX,
    }
}
