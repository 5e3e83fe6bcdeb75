use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Document id: 24 lowercase hex characters, the native id format of the
/// backing document store.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        let mut hex = String::with_capacity(24);
        for b in &bytes[..12] {
            hex.push_str(&format!("{:02x}", b));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(s.to_lowercase()))
        } else {
            Err(AppError::MalformedId(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Wood,
    Stone,
    Iron,
    Food,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Iron,
        ResourceKind::Food,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Iron => "iron",
            ResourceKind::Food => "food",
        };
        f.write_str(name)
    }
}

/// A quantity of each of the four resources. Used both for village stocks
/// (real-valued, accrued continuously) and for costs/backpacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub wood: f64,
    pub stone: f64,
    pub iron: f64,
    pub food: f64,
}

impl Resources {
    pub const ZERO: Resources = Resources {
        wood: 0.0,
        stone: 0.0,
        iron: 0.0,
        food: 0.0,
    };

    pub const fn new(wood: f64, stone: f64, iron: f64, food: f64) -> Self {
        Self {
            wood,
            stone,
            iron,
            food,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Iron => self.iron,
            ResourceKind::Food => self.food,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, amount: f64) {
        match kind {
            ResourceKind::Wood => self.wood = amount,
            ResourceKind::Stone => self.stone = amount,
            ResourceKind::Iron => self.iron = amount,
            ResourceKind::Food => self.food = amount,
        }
    }

    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        self.set(kind, self.get(kind) + amount);
    }

    pub fn total(&self) -> f64 {
        self.wood + self.stone + self.iron + self.food
    }

    pub fn covers(&self, cost: &Resources) -> bool {
        ResourceKind::ALL.iter().all(|&k| self.get(k) >= cost.get(k))
    }

    pub fn floor(&self) -> Resources {
        Resources {
            wood: self.wood.floor(),
            stone: self.stone.floor(),
            iron: self.iron.floor(),
            food: self.food.floor(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|&k| self.get(k) <= 0.0)
    }
}

impl core::ops::Mul<f64> for Resources {
    type Output = Resources;

    fn mul(self, rhs: f64) -> Self::Output {
        Resources {
            wood: self.wood * rhs,
            stone: self.stone * rhs,
            iron: self.iron * rhs,
            food: self.food * rhs,
        }
    }
}

impl core::ops::Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Self::Output {
        Resources {
            wood: self.wood + rhs.wood,
            stone: self.stone + rhs.stone,
            iron: self.iron + rhs.iron,
            food: self.food + rhs.food,
        }
    }
}

/// User document. Owned by the auth collaborator; the core reads it only to
/// attach `family_name` and `color` to map output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub username: String,
    pub password_hash: String,
    pub family_name: String,
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_roundtrip() {
        let id = DocId::new();
        assert_eq!(id.as_str().len(), 24);
        let parsed: DocId = id.as_str().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_doc_id_rejects_garbage() {
        assert!("not-an-id".parse::<DocId>().is_err());
        assert!("ffff".parse::<DocId>().is_err());
        assert!("zzzzzzzzzzzzzzzzzzzzzzzz".parse::<DocId>().is_err());
    }

    #[test]
    fn test_resources_total_and_covers() {
        let stock = Resources::new(100.0, 200.0, 300.0, 400.0);
        assert_eq!(stock.total(), 1000.0);
        assert!(stock.covers(&Resources::new(100.0, 0.0, 0.0, 400.0)));
        assert!(!stock.covers(&Resources::new(101.0, 0.0, 0.0, 0.0)));
    }
}
