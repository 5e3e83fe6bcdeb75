use minute_empire_types::buildings::{BuildingKind, FieldKind};
use minute_empire_types::common::DocId;
use minute_empire_types::errors::AppError;
use minute_empire_types::map::Location;
use minute_empire_types::troops::TroopKind;

/// A parsed player command. The text grammar is the only way players reach
/// the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateField { kind: FieldKind, slot: u8 },
    CreateBuilding { kind: BuildingKind, slot: u8 },
    UpgradeField { slot: u8 },
    UpgradeBuilding { slot: u8 },
    DestroyField { slot: u8 },
    DestroyBuilding { slot: u8 },
    Train { kind: TroopKind, quantity: u32 },
    Move { troop_id: DocId, target: Location },
    Attack { troop_id: DocId, target: Location },
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::InvalidCommand(message.into())
}

fn parse_slot(token: Option<&&str>) -> Result<u8, AppError> {
    token
        .and_then(|t| t.parse::<u8>().ok())
        .ok_or_else(|| invalid("Invalid slot number"))
}

impl Command {
    /// Parses a command line. Case-insensitive, whitespace-split, permissive
    /// about `x,y` versus `x y` coordinates.
    pub fn parse(input: &str) -> Result<Command, AppError> {
        let lowered = input.to_lowercase();
        let parts: Vec<&str> = lowered.split_whitespace().collect();

        if parts.len() < 2 {
            return Err(invalid("Invalid command format"));
        }

        match parts[0] {
            "train" => {
                if parts.len() < 3 {
                    return Err(invalid("Invalid train command format. Use: train <quantity> <troop_type>"));
                }
                let quantity = parts[1]
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("Invalid troop quantity: {}", parts[1])))?;
                let kind = parts[2]
                    .parse::<TroopKind>()
                    .map_err(|_| invalid(format!("Invalid troop type: {}", parts[2])))?;
                Ok(Command::Train { kind, quantity })
            }
            "create" => {
                let in_index = parts
                    .iter()
                    .position(|&p| p == "in")
                    .ok_or_else(|| invalid("Missing 'in' keyword"))?;
                if in_index < 3 {
                    return Err(invalid("Invalid create command format"));
                }
                let slot = parse_slot(parts.get(in_index + 1))?;
                let subtype = parts[1];
                match parts[2] {
                    "field" => {
                        let kind = subtype
                            .parse::<FieldKind>()
                            .map_err(|_| invalid(format!("Invalid field type: {subtype}")))?;
                        Ok(Command::CreateField { kind, slot })
                    }
                    "building" => {
                        let kind = subtype
                            .parse::<BuildingKind>()
                            .map_err(|_| invalid(format!("Invalid building type: {subtype}")))?;
                        Ok(Command::CreateBuilding { kind, slot })
                    }
                    other => Err(invalid(format!("Invalid target type: {other}"))),
                }
            }
            verb @ ("upgrade" | "destroy") => {
                let in_index = parts
                    .iter()
                    .position(|&p| p == "in")
                    .ok_or_else(|| invalid("Missing 'in' keyword"))?;
                if in_index < 2 {
                    return Err(invalid(format!("Invalid {verb} command format")));
                }
                let slot = parse_slot(parts.get(in_index + 1))?;
                match (verb, parts[1]) {
                    ("upgrade", "field") => Ok(Command::UpgradeField { slot }),
                    ("upgrade", "building") => Ok(Command::UpgradeBuilding { slot }),
                    ("destroy", "field") => Ok(Command::DestroyField { slot }),
                    ("destroy", "building") => Ok(Command::DestroyBuilding { slot }),
                    (_, other) => Err(invalid(format!("Invalid target type: {other}"))),
                }
            }
            verb @ ("move" | "attack") => {
                let to_index = parts.iter().position(|&p| p == "to").ok_or_else(|| {
                    invalid(format!("Invalid {verb} command format. Use: {verb} <troop_id> to <x>,<y>"))
                })?;
                if to_index < 2 {
                    return Err(invalid(format!("Invalid {verb} command format")));
                }
                let troop_id = parts[1]
                    .parse::<DocId>()
                    .map_err(|_| invalid(format!("Invalid troop id: {}", parts[1])))?;
                let target = Self::parse_location(&parts, to_index, verb)?;
                if verb == "move" {
                    Ok(Command::Move { troop_id, target })
                } else {
                    Ok(Command::Attack { troop_id, target })
                }
            }
            other => Err(invalid(format!("Unknown action: {other}"))),
        }
    }

    fn parse_location(parts: &[&str], to_index: usize, verb: &str) -> Result<Location, AppError> {
        let first = parts
            .get(to_index + 1)
            .ok_or_else(|| invalid(format!("Missing location after 'to' in {verb} command")))?;

        if first.contains(',') {
            let mut coords = first.split(',');
            let x = coords
                .next()
                .and_then(|c| c.parse::<i32>().ok())
                .ok_or_else(|| invalid(format!("Invalid location format: {first}. Use: x,y")))?;
            let y = coords
                .next()
                .and_then(|c| c.parse::<i32>().ok())
                .ok_or_else(|| invalid(format!("Invalid location format: {first}. Use: x,y")))?;
            if coords.next().is_some() {
                return Err(invalid(format!("Invalid location format: {first}. Use: x,y")));
            }
            Ok(Location::new(x, y))
        } else {
            let second = parts
                .get(to_index + 2)
                .ok_or_else(|| invalid(format!("Incomplete location in {verb} command")))?;
            let x = first
                .parse::<i32>()
                .map_err(|_| invalid("Location coordinates must be integers"))?;
            let y = second
                .parse::<i32>()
                .map_err(|_| invalid("Location coordinates must be integers"))?;
            Ok(Location::new(x, y))
        }
    }

    /// Renders the canonical text form of the command; `parse` inverts it.
    pub fn serialize(&self) -> String {
        match self {
            Command::CreateField { kind, slot } => format!("create {kind} field in {slot}"),
            Command::CreateBuilding { kind, slot } => format!("create {kind} building in {slot}"),
            Command::UpgradeField { slot } => format!("upgrade field in {slot}"),
            Command::UpgradeBuilding { slot } => format!("upgrade building in {slot}"),
            Command::DestroyField { slot } => format!("destroy field in {slot}"),
            Command::DestroyBuilding { slot } => format!("destroy building in {slot}"),
            Command::Train { kind, quantity } => format!("train {quantity} {kind}"),
            Command::Move { troop_id, target } => {
                format!("move {} to {},{}", troop_id, target.x, target.y)
            }
            Command::Attack { troop_id, target } => {
                format!("attack {} to {},{}", troop_id, target.x, target.y)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_field() {
        let cmd = Command::parse("create wood field in 7").unwrap();
        assert_eq!(
            cmd,
            Command::CreateField {
                kind: FieldKind::Wood,
                slot: 7
            }
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let cmd = Command::parse("CREATE Granary BUILDING in 3").unwrap();
        assert_eq!(
            cmd,
            Command::CreateBuilding {
                kind: BuildingKind::Granary,
                slot: 3
            }
        );
    }

    #[test]
    fn test_parse_upgrade_and_destroy() {
        assert_eq!(
            Command::parse("upgrade building in 12").unwrap(),
            Command::UpgradeBuilding { slot: 12 }
        );
        assert_eq!(
            Command::parse("destroy field in 0").unwrap(),
            Command::DestroyField { slot: 0 }
        );
    }

    #[test]
    fn test_parse_train() {
        assert_eq!(
            Command::parse("train 25 pikeman").unwrap(),
            Command::Train {
                kind: TroopKind::Pikeman,
                quantity: 25
            }
        );
    }

    #[test]
    fn test_parse_move_comma_and_space_coordinates() {
        let id = DocId::new();
        let comma = Command::parse(&format!("move {id} to -3,12")).unwrap();
        let space = Command::parse(&format!("move {id} to -3 12")).unwrap();
        assert_eq!(comma, space);
        assert_eq!(
            comma,
            Command::Move {
                troop_id: id,
                target: Location::new(-3, 12)
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_verbs_and_bad_args() {
        assert!(Command::parse("dance in 3").is_err());
        assert!(Command::parse("create wood field 3").is_err());
        assert!(Command::parse("create wood field in x").is_err());
        assert!(Command::parse("train some militia").is_err());
        assert!(Command::parse("move abc to 1,2").is_err());
        let id = DocId::new();
        assert!(Command::parse(&format!("attack {id} to 1,two")).is_err());
        assert!(Command::parse("upgrade").is_err());
    }

    #[test]
    fn test_parse_inverts_serialize() {
        let commands = vec![
            Command::CreateField {
                kind: FieldKind::Iron,
                slot: 9,
            },
            Command::CreateBuilding {
                kind: BuildingKind::HideSpot,
                slot: 24,
            },
            Command::UpgradeField { slot: 1 },
            Command::UpgradeBuilding { slot: 25 },
            Command::DestroyField { slot: 19 },
            Command::DestroyBuilding { slot: 4 },
            Command::Train {
                kind: TroopKind::LightCavalry,
                quantity: 120,
            },
            Command::Move {
                troop_id: DocId::new(),
                target: Location::new(-15, 15),
            },
            Command::Attack {
                troop_id: DocId::new(),
                target: Location::new(0, -7),
            },
        ];
        for command in commands {
            assert_eq!(Command::parse(&command.serialize()).unwrap(), command);
        }
    }
}
