use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum_extra::extract::cookie::SignedCookieJar;
use tokio::sync::mpsc;
use tracing::debug;

use minute_empire_types::common::DocId;

use super::authed_user;
use crate::http::AppState;

pub async fn websocket(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    upgrade: WebSocketUpgrade,
) -> Result<Response, (StatusCode, String)> {
    let user_id = authed_user(&jar)?;
    Ok(upgrade.on_upgrade(move |socket| handle_socket(state, user_id, socket)))
}

/// Bridges the registry's frame channel onto the actual socket. The core
/// only ever sees the channel; a dead socket surfaces as a failed send and a
/// lazy disconnect.
async fn handle_socket(state: AppState, user_id: DocId, mut socket: WebSocket) {
    let village_ids: Vec<DocId> = state
        .bus
        .context()
        .villages
        .list_by_owner(&user_id)
        .await
        .map(|villages| villages.into_iter().map(|v| v.id).collect())
        .unwrap_or_default();

    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();
    state
        .bus
        .sockets()
        .connect(user_id.clone(), sender, &village_ids);

    loop {
        tokio::select! {
            frame = receiver.recv() => {
                match frame {
                    Some(frame) => {
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(other)) => debug!(user_id = %user_id, ?other, "Ignoring inbound frame"),
                }
            }
        }
    }

    state.bus.sockets().disconnect(&user_id);
}
