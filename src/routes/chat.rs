use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthMiddleware, AuthUser};
use crate::models::chat::{MessageForm, MessageSender, SessionStatusForm, StartSessionForm};
use crate::services::chat::ChatService;
use crate::services::widget::WidgetService;
use crate::utils::rate_limit::client_ip;
use crate::utils::webhook::{post_webhook_background, WebhookPayload};
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    // Public visitor endpoints, rate limited per client IP
    cfg.route("/sessions/start", web::post().to(start_session))
        .route(
            "/sessions/{id}/messages",
            web::get().to(get_session_messages_public),
        )
        .route(
            "/sessions/{id}/messages",
            web::post().to(post_visitor_message),
        )
        // Owner endpoints
        .service(
            web::resource("/sessions")
                .wrap(AuthMiddleware)
                .route(web::get().to(list_sessions)),
        )
        .service(
            web::resource("/sessions/{id}")
                .wrap(AuthMiddleware)
                .route(web::get().to(get_session)),
        )
        .service(
            web::resource("/sessions/{id}/reply")
                .wrap(AuthMiddleware)
                .route(web::post().to(post_agent_message)),
        )
        .service(
            web::resource("/sessions/{id}/status")
                .wrap(AuthMiddleware)
                .route(web::post().to(update_session_status)),
        );
}

fn check_rate_limit(state: &web::Data<AppState>, req: &HttpRequest) -> AppResult<()> {
    let ip = client_ip(req);
    if !state.chat_rate_limiter.check(&ip) {
        return Err(AppError::TooManyRequests(
            "Too many chat requests, slow down".to_string(),
        ));
    }
    Ok(())
}

async fn start_session(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Json<StartSessionForm>,
) -> AppResult<HttpResponse> {
    check_rate_limit(&state, &req)?;
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let widget = WidgetService::new(&state.db)
        .get_widget_by_id(&form.widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;

    if !widget.is_active {
        return Err(AppError::BadRequest("Widget is not active".to_string()));
    }

    let session = ChatService::new(&state.db)
        .create_session(&widget.id, form.visitor_name.as_deref())
        .await?;

    if let Some(notify_url) = widget.notify_url {
        post_webhook_background(
            notify_url,
            state.config.webhook_secret.clone(),
            WebhookPayload::chat_session_started(
                &session.id,
                &widget.id,
                session.visitor_name.as_deref(),
            ),
        );
    }

    tracing::info!("Chat session started: {} on widget {}", session.id, widget.id);
    Ok(HttpResponse::Ok().json(session))
}

/// Poll fallback for visitors without WebSocket support. The session id is
/// an unguessable capability handed out at session start.
async fn get_session_messages_public(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    check_rate_limit(&state, &req)?;

    let chat_service = ChatService::new(&state.db);
    chat_service
        .get_session_by_id(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let messages = chat_service.get_messages_by_session_id(&path).await?;
    Ok(HttpResponse::Ok().json(messages))
}

async fn post_visitor_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Json<MessageForm>,
) -> AppResult<HttpResponse> {
    check_rate_limit(&state, &req)?;
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let chat_service = ChatService::new(&state.db);
    let message = chat_service
        .add_message(&path, MessageSender::Visitor, &form.content)
        .await?;

    state.chat_hub.broadcast_message(&message);

    if let Ok(Some(session)) = chat_service.get_session_by_id(&path).await {
        let widget_service = WidgetService::new(&state.db);
        if let Ok(Some(widget)) = widget_service.get_widget_by_id(&session.widget_id).await {
            if let Some(notify_url) = widget.notify_url {
                post_webhook_background(
                    notify_url,
                    state.config.webhook_secret.clone(),
                    WebhookPayload::chat_message_created(
                        &path,
                        &widget.id,
                        MessageSender::Visitor.as_str(),
                        &form.content,
                    ),
                );
            }
        }
    }

    Ok(HttpResponse::Ok().json(message))
}

#[derive(Debug, Deserialize)]
struct ListSessionsQuery {
    #[serde(default)]
    widget_id: Option<String>,
}

async fn list_sessions(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ListSessionsQuery>,
) -> AppResult<HttpResponse> {
    let chat_service = ChatService::new(&state.db);

    let sessions = match &query.widget_id {
        Some(widget_id) => {
            let widget = WidgetService::new(&state.db)
                .get_widget_by_id(widget_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;
            if widget.user_id != user.id && !user.is_admin() {
                return Err(AppError::Forbidden("Not your widget".to_string()));
            }
            chat_service.get_sessions_by_widget_id(widget_id).await?
        }
        None => chat_service.get_sessions_for_user(&user.id).await?,
    };

    Ok(HttpResponse::Ok().json(sessions))
}

/// Load a session and check the caller owns the widget it belongs to.
async fn get_owned_session(
    state: &web::Data<AppState>,
    user: &AuthUser,
    session_id: &str,
) -> AppResult<crate::models::chat::ChatSession> {
    let session = ChatService::new(&state.db)
        .get_session_by_id(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let widget = WidgetService::new(&state.db)
        .get_widget_by_id(&session.widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;

    if widget.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden("Not your widget".to_string()));
    }

    Ok(session)
}

async fn get_session(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let session = get_owned_session(&state, &user, &path).await?;
    let messages = ChatService::new(&state.db)
        .get_messages_by_session_id(&session.id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session": session,
        "messages": messages,
    })))
}

async fn post_agent_message(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    form: web::Json<MessageForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let session = get_owned_session(&state, &user, &path).await?;
    let message = ChatService::new(&state.db)
        .add_message(&session.id, MessageSender::Agent, &form.content)
        .await?;

    state.chat_hub.broadcast_message(&message);
    Ok(HttpResponse::Ok().json(message))
}

async fn update_session_status(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    form: web::Json<SessionStatusForm>,
) -> AppResult<HttpResponse> {
    let session = get_owned_session(&state, &user, &path).await?;
    let session = ChatService::new(&state.db)
        .update_session_status(&session.id, form.status)
        .await?;

    state
        .chat_hub
        .broadcast_status(&session.id, &session.status);
    Ok(HttpResponse::Ok().json(session))
}
