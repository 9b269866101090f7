use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::models::chat::ChatMessage;

/// In-process registry of live chat subscribers, keyed by session id.
///
/// Both the visitor (from the embedded widget) and the site owner's agent
/// view attach to a session; persisted messages fan out to every attached
/// peer. Senders that have gone away are pruned on the next broadcast.
#[derive(Clone)]
pub struct ChatHub {
    sessions: Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        ChatHub {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .push(tx);
        rx
    }

    pub fn broadcast_message(&self, message: &ChatMessage) {
        let payload = match serde_json::to_string(&serde_json::json!({
            "type": "message",
            "data": message,
        })) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize chat message: {}", e);
                return;
            }
        };
        self.broadcast(&message.session_id, &payload);
    }

    pub fn broadcast_status(&self, session_id: &str, status: &str) {
        let payload = serde_json::json!({
            "type": "status",
            "data": { "session_id": session_id, "status": status },
        })
        .to_string();
        self.broadcast(session_id, &payload);
    }

    fn broadcast(&self, session_id: &str, payload: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(subscribers) = sessions.get_mut(session_id) {
            subscribers.retain(|tx| tx.send(payload.to_string()).is_ok());
            if subscribers.is_empty() {
                sessions.remove(session_id);
            }
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self, session_id: &str) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(session_id: &str, content: &str) -> ChatMessage {
        ChatMessage {
            id: "m1".to_string(),
            session_id: session_id.to_string(),
            sender: "visitor".to_string(),
            content: content.to_string(),
            created_at: 0,
        }
    }

    #[actix_web::test]
    async fn test_broadcast_reaches_all_subscribers() {
        let hub = ChatHub::new();
        let mut rx1 = hub.subscribe("s1");
        let mut rx2 = hub.subscribe("s1");

        hub.broadcast_message(&message("s1", "hello"));

        let payload = rx1.recv().await.unwrap();
        assert!(payload.contains("\"hello\""));
        assert!(rx2.recv().await.is_some());
    }

    #[actix_web::test]
    async fn test_broadcast_is_scoped_to_session() {
        let hub = ChatHub::new();
        let mut rx_other = hub.subscribe("s2");

        hub.broadcast_message(&message("s1", "hello"));

        assert!(rx_other.try_recv().is_err());
    }

    #[actix_web::test]
    async fn test_dropped_subscribers_are_pruned() {
        let hub = ChatHub::new();
        let rx = hub.subscribe("s1");
        drop(rx);

        hub.broadcast_message(&message("s1", "hello"));
        assert_eq!(hub.subscriber_count("s1"), 0);
    }
}
