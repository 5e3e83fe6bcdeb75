use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use minute_empire_app::bus::CommandOutcome;
use minute_empire_types::common::DocId;

use super::authed_user;
use crate::http::AppState;

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub village_id: DocId,
    pub command: String,
}

pub async fn execute_command(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandOutcome>, (StatusCode, String)> {
    let user_id = authed_user(&jar)?;
    let outcome = state
        .bus
        .execute_command(&user_id, &request.village_id, &request.command)
        .await;
    Ok(Json(outcome))
}
