use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, warn};

use minute_empire_game::models::village::Village;
use minute_empire_game::world;
use minute_empire_types::common::{DocId, User};
use minute_empire_types::errors::{AppError, ApplicationError};
use minute_empire_types::map::Location;

use crate::auth;
use crate::context::HandlerContext;

const MAX_LOCATION_ATTEMPTS: usize = 100;

#[derive(Debug, Clone)]
pub struct RegisterPlayer {
    pub username: String,
    pub password: String,
    pub family_name: String,
    pub color: String,
    pub village_name: String,
}

/// Creates a user and their first village on a random free tile. If the
/// village cannot be placed the half-created user is removed again.
pub struct RegisterPlayerCommandHandler {}

impl RegisterPlayerCommandHandler {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn handle(
        &self,
        ctx: &HandlerContext,
        cmd: RegisterPlayer,
        now: DateTime<Utc>,
    ) -> Result<(User, Village), ApplicationError> {
        if ctx.users.find_by_username(&cmd.username).await?.is_some() {
            return Err(AppError::UsernameTaken(cmd.username).into());
        }
        if !is_valid_color(&cmd.color) {
            return Err(
                AppError::InvalidCommand(format!("Invalid color code: {}", cmd.color)).into(),
            );
        }

        let user = User {
            id: DocId::new(),
            username: cmd.username,
            password_hash: auth::hash_password(&cmd.password)?,
            family_name: cmd.family_name,
            color: cmd.color,
        };
        ctx.users.insert(&user).await?;

        let location = match self.free_location(ctx).await {
            Ok(location) => location,
            Err(error) => {
                warn!(user_id = %user.id, "No free location, rolling back user");
                ctx.users.delete(&user.id).await?;
                return Err(error);
            }
        };

        let village = Village::new(cmd.village_name, user.id.clone(), location, now);
        ctx.villages.insert(&village).await?;

        info!(
            user_id = %user.id,
            village_id = %village.id,
            location = %location,
            "Player registered"
        );
        Ok((user, village))
    }

    async fn free_location(&self, ctx: &HandlerContext) -> Result<Location, ApplicationError> {
        let (x_min, x_max, y_min, y_max) = world::map_bounds();
        for _ in 0..MAX_LOCATION_ATTEMPTS {
            let candidate = {
                let mut rng = rand::thread_rng();
                Location::new(rng.gen_range(x_min..=x_max), rng.gen_range(y_min..=y_max))
            };
            if ctx.villages.find_by_location(candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(AppError::NoFreeLocation.into())
    }
}

fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| b.is_ascii_hexdigit())
}
