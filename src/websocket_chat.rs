use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::Message as WsMessage;
use futures::stream::StreamExt;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::chat::MessageSender;
use crate::services::chat::ChatService;
use crate::services::user::UserService;
use crate::services::widget::WidgetService;
use crate::utils::auth::verify_jwt;
use crate::utils::webhook::{post_webhook_background, WebhookPayload};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatWsQuery {
    pub session_id: String,
    /// Present when the site owner's dashboard attaches as the agent.
    #[serde(default)]
    pub token: Option<String>,
}

/// WebSocket endpoint for live chat. The visitor (widget) and the agent
/// (dashboard) both attach to a session; messages persist first and then
/// fan out through the hub to every attached peer.
pub async fn websocket_chat_handler(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<ChatWsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let chat_service = ChatService::new(&state.db);
    let session = chat_service
        .get_session_by_id(&query.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    // A bearer token upgrades the connection to the agent side, provided
    // the caller owns the widget the session belongs to.
    let sender = match &query.token {
        Some(token) => {
            let claims = verify_jwt(token, &state.config.jwt_secret)
                .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
            let user = UserService::new(&state.db)
                .ensure_user_from_claims(&claims)
                .await?;
            let widget = WidgetService::new(&state.db)
                .get_widget_by_id(&session.widget_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;
            if widget.user_id != user.id && user.role != "admin" {
                return Err(AppError::Forbidden("Not your widget".to_string()).into());
            }
            MessageSender::Agent
        }
        None => MessageSender::Visitor,
    };

    let (response, ws_session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    tracing::info!(
        "Chat WebSocket attached: session={} sender={}",
        query.session_id,
        sender.as_str()
    );

    let session_id = query.session_id.clone();
    let mut hub_rx = state.chat_hub.subscribe(&session_id);

    // Fan-out task: hub broadcasts -> this socket.
    let mut ws_out = ws_session.clone();
    actix_web::rt::spawn(async move {
        while let Some(payload) = hub_rx.recv().await {
            if ws_out.text(payload).await.is_err() {
                break;
            }
        }
    });

    // Read loop: incoming frames -> persist -> hub.
    let state_clone = state.clone();
    let mut ws_in = ws_session;
    actix_web::rt::spawn(async move {
        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                WsMessage::Text(text) => {
                    if let Err(e) =
                        handle_incoming(&state_clone, &session_id, sender, &text).await
                    {
                        tracing::debug!("Chat message rejected: {}", e);
                        let error_msg = serde_json::json!({
                            "type": "error",
                            "error": e.to_string(),
                        })
                        .to_string();
                        let _ = ws_in.text(error_msg).await;
                    }
                }
                WsMessage::Ping(bytes) => {
                    let _ = ws_in.pong(&bytes).await;
                }
                WsMessage::Close(reason) => {
                    let _ = ws_in.close(reason).await;
                    break;
                }
                _ => {}
            }
        }

        tracing::debug!("Chat WebSocket closed: session={}", session_id);
    });

    Ok(response)
}

#[derive(Debug, Deserialize)]
struct IncomingFrame {
    content: String,
}

async fn handle_incoming(
    state: &web::Data<AppState>,
    session_id: &str,
    sender: MessageSender,
    text: &str,
) -> Result<(), AppError> {
    let frame: IncomingFrame = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid message frame: {}", e)))?;

    let content = frame.content.trim();
    if content.is_empty() || content.len() > 4000 {
        return Err(AppError::BadRequest("Message length out of range".to_string()));
    }

    let chat_service = ChatService::new(&state.db);
    let message = chat_service.add_message(session_id, sender, content).await?;

    state.chat_hub.broadcast_message(&message);

    // Notify the site owner about visitor activity.
    if sender == MessageSender::Visitor {
        if let Ok(Some(session)) = chat_service.get_session_by_id(session_id).await {
            let widget_service = WidgetService::new(&state.db);
            if let Ok(Some(widget)) = widget_service.get_widget_by_id(&session.widget_id).await {
                if let Some(notify_url) = widget.notify_url {
                    post_webhook_background(
                        notify_url,
                        state.config.webhook_secret.clone(),
                        WebhookPayload::chat_message_created(
                            session_id,
                            &widget.id,
                            sender.as_str(),
                            content,
                        ),
                    );
                }
            }
        }
    }

    Ok(())
}
