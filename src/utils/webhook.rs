use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::utils::misc::sha256_hash;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl WebhookPayload {
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    pub fn chat_session_started(session_id: &str, widget_id: &str, visitor_name: Option<&str>) -> Self {
        Self::new(
            "chat.session.started",
            json!({
                "session_id": session_id,
                "widget_id": widget_id,
                "visitor_name": visitor_name,
            }),
        )
    }

    pub fn chat_message_created(session_id: &str, widget_id: &str, sender: &str, content: &str) -> Self {
        Self::new(
            "chat.message.created",
            json!({
                "session_id": session_id,
                "widget_id": widget_id,
                "sender": sender,
                "content": content,
            }),
        )
    }
}

/// Post a webhook notification, fire-and-forget. Delivery failures are
/// logged and never surfaced to the caller.
pub async fn post_webhook(webhook_url: &str, secret: &str, payload: WebhookPayload) {
    if webhook_url.is_empty() {
        debug!("Webhook URL is empty, skipping webhook post");
        return;
    }

    let body = match serde_json::to_string(&payload) {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to serialize webhook payload: {}", e);
            return;
        }
    };

    let signature = sha256_hash(&format!("{}{}", secret, body));

    let client = Client::new();
    let result = client
        .post(webhook_url)
        .header("Content-Type", "application/json")
        .header("X-Reachpoint-Signature", signature)
        .body(body)
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await;

    match result {
        Ok(resp) if !resp.status().is_success() => {
            warn!("Webhook to {} returned {}", webhook_url, resp.status());
        }
        Ok(_) => debug!("Webhook delivered to {}", webhook_url),
        Err(e) => warn!("Webhook to {} failed: {}", webhook_url, e),
    }
}

/// Spawn webhook delivery without blocking the request path.
pub fn post_webhook_background(webhook_url: String, secret: String, payload: WebhookPayload) {
    actix_web::rt::spawn(async move {
        post_webhook(&webhook_url, &secret, payload).await;
    });
}
