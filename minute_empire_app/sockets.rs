use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use minute_empire_types::common::DocId;

/// Process-wide registry of live WebSocket sessions. The web adapter owns
/// the actual sockets; the core only pushes frames into per-user channels.
/// A closed channel disconnects the user lazily on the next send.
pub struct SocketRegistry {
    connections: Mutex<HashMap<DocId, mpsc::UnboundedSender<String>>>,
    village_owners: Mutex<HashMap<DocId, DocId>>,
}

impl SocketRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            village_owners: Mutex::new(HashMap::new()),
        }
    }

    pub fn connect(
        &self,
        user_id: DocId,
        sender: mpsc::UnboundedSender<String>,
        village_ids: &[DocId],
    ) {
        {
            let mut owners = self.village_owners.lock().unwrap();
            for village_id in village_ids {
                owners.insert(village_id.clone(), user_id.clone());
            }
        }
        let mut connections = self.connections.lock().unwrap();
        connections.insert(user_id.clone(), sender);
        info!(user_id = %user_id, active = connections.len(), "WebSocket connected");
    }

    pub fn disconnect(&self, user_id: &DocId) {
        let mut connections = self.connections.lock().unwrap();
        if connections.remove(user_id).is_some() {
            info!(user_id = %user_id, active = connections.len(), "WebSocket disconnected");
        }
    }

    pub fn is_connected(&self, user_id: &DocId) -> bool {
        self.connections.lock().unwrap().contains_key(user_id)
    }

    pub fn connected_users(&self) -> Vec<DocId> {
        self.connections.lock().unwrap().keys().cloned().collect()
    }

    pub fn owner_of(&self, village_id: &DocId) -> Option<DocId> {
        self.village_owners.lock().unwrap().get(village_id).cloned()
    }

    /// Pushes a frame to one user. Returns false (and forgets the session)
    /// if the channel is gone.
    pub fn send_to_user(&self, user_id: &DocId, frame: String) -> bool {
        let sender = {
            let connections = self.connections.lock().unwrap();
            connections.get(user_id).cloned()
        };
        match sender {
            Some(sender) => {
                if sender.send(frame).is_err() {
                    warn!(user_id = %user_id, "WebSocket send failed, disconnecting");
                    self.disconnect(user_id);
                    false
                } else {
                    debug!(user_id = %user_id, "Frame pushed");
                    true
                }
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_to_connected_user() {
        let registry = SocketRegistry::new();
        let user_id = DocId::new();
        let village_id = DocId::new();
        let (sender, mut receiver) = mpsc::unbounded_channel();

        registry.connect(user_id.clone(), sender, &[village_id.clone()]);
        assert!(registry.is_connected(&user_id));
        assert_eq!(registry.owner_of(&village_id), Some(user_id.clone()));

        assert!(registry.send_to_user(&user_id, "hello".to_string()));
        assert_eq!(receiver.try_recv().unwrap(), "hello");
    }

    #[test]
    fn test_failed_send_disconnects_lazily() {
        let registry = SocketRegistry::new();
        let user_id = DocId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        registry.connect(user_id.clone(), sender, &[]);

        drop(receiver);
        assert!(!registry.send_to_user(&user_id, "x".to_string()));
        assert!(!registry.is_connected(&user_id));
    }

    #[test]
    fn test_send_to_unknown_user_is_noop() {
        let registry = SocketRegistry::new();
        assert!(!registry.send_to_user(&DocId::new(), "x".to_string()));
    }
}
