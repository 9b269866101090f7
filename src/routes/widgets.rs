use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthMiddleware, AuthUser};
use crate::models::channel::{ChannelForm, ChannelOrderForm, UpdateChannelForm};
use crate::models::widget::{UpdateWidgetForm, Widget, WidgetForm, WidgetListResponse};
use crate::services::channel::ChannelService;
use crate::services::widget::WidgetService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_widgets)),
    )
    .service(
        web::resource("/create")
            .wrap(AuthMiddleware)
            .route(web::post().to(create_widget)),
    )
    .service(
        web::resource("/{id}")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_widget_by_id)),
    )
    .service(
        web::resource("/{id}/update")
            .wrap(AuthMiddleware)
            .route(web::post().to(update_widget_by_id)),
    )
    .service(
        web::resource("/{id}/delete")
            .wrap(AuthMiddleware)
            .route(web::delete().to(delete_widget_by_id)),
    )
    .service(
        web::resource("/{id}/embed")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_embed_snippet)),
    )
    // Channel routes
    .service(
        web::resource("/{id}/channels")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_channels)),
    )
    .service(
        web::resource("/{id}/channels/create")
            .wrap(AuthMiddleware)
            .route(web::post().to(create_channel)),
    )
    .service(
        web::resource("/{id}/channels/order")
            .wrap(AuthMiddleware)
            .route(web::post().to(reorder_channels)),
    )
    .service(
        web::resource("/{id}/channels/{channel_id}/update")
            .wrap(AuthMiddleware)
            .route(web::post().to(update_channel)),
    )
    .service(
        web::resource("/{id}/channels/{channel_id}/delete")
            .wrap(AuthMiddleware)
            .route(web::delete().to(delete_channel)),
    );
}

/// Load a widget and check the caller may manage it.
async fn get_owned_widget(
    state: &web::Data<AppState>,
    user: &AuthUser,
    widget_id: &str,
) -> AppResult<Widget> {
    let widget = WidgetService::new(&state.db)
        .get_widget_by_id(widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;

    if widget.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden("Not your widget".to_string()));
    }

    Ok(widget)
}

async fn get_widgets(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let widgets = WidgetService::new(&state.db)
        .get_widgets_by_user_id(&user.id)
        .await?;
    let widgets: Vec<WidgetListResponse> =
        widgets.into_iter().map(WidgetListResponse::from).collect();
    Ok(HttpResponse::Ok().json(widgets))
}

async fn create_widget(
    state: web::Data<AppState>,
    user: AuthUser,
    form: web::Json<WidgetForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let widget = WidgetService::new(&state.db)
        .create_widget(&user.id, &form)
        .await?;

    tracing::info!("Widget created: {} by {}", widget.id, user.id);
    Ok(HttpResponse::Ok().json(widget))
}

async fn get_widget_by_id(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let widget = get_owned_widget(&state, &user, &path).await?;
    Ok(HttpResponse::Ok().json(widget))
}

async fn update_widget_by_id(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    form: web::Json<UpdateWidgetForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let widget = get_owned_widget(&state, &user, &path).await?;
    let widget = WidgetService::new(&state.db)
        .update_widget(&widget.id, &form)
        .await?;

    state.embed_cache.invalidate(&widget.id).await;
    Ok(HttpResponse::Ok().json(widget))
}

async fn delete_widget_by_id(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let widget = get_owned_widget(&state, &user, &path).await?;
    WidgetService::new(&state.db).delete_widget(&widget.id).await?;

    state.embed_cache.invalidate(&widget.id).await;
    tracing::info!("Widget deleted: {} by {}", widget.id, user.id);
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

/// The snippet the site owner pastes into their page.
async fn get_embed_snippet(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let widget = get_owned_widget(&state, &user, &path).await?;
    let base = state.config.public_base_url.trim_end_matches('/');
    let script_url = format!("{}/embed/{}.js", base, widget.id);

    Ok(HttpResponse::Ok().json(json!({
        "script_url": script_url,
        "snippet": format!("<script src=\"{}\" async></script>", script_url),
    })))
}

async fn get_channels(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let widget = get_owned_widget(&state, &user, &path).await?;
    let channels = ChannelService::new(&state.db)
        .get_channels_by_widget_id(&widget.id)
        .await?;
    Ok(HttpResponse::Ok().json(channels))
}

async fn create_channel(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    form: web::Json<ChannelForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let widget = get_owned_widget(&state, &user, &path).await?;
    let channel = ChannelService::new(&state.db)
        .create_channel(&widget.id, &form)
        .await?;

    state.embed_cache.invalidate(&widget.id).await;
    Ok(HttpResponse::Ok().json(channel))
}

async fn update_channel(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(String, String)>,
    form: web::Json<UpdateChannelForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (widget_id, channel_id) = path.into_inner();
    let widget = get_owned_widget(&state, &user, &widget_id).await?;
    let channel = ChannelService::new(&state.db)
        .update_channel(&widget.id, &channel_id, &form)
        .await?;

    state.embed_cache.invalidate(&widget.id).await;
    Ok(HttpResponse::Ok().json(channel))
}

async fn delete_channel(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (widget_id, channel_id) = path.into_inner();
    let widget = get_owned_widget(&state, &user, &widget_id).await?;
    ChannelService::new(&state.db)
        .delete_channel(&widget.id, &channel_id)
        .await?;

    state.embed_cache.invalidate(&widget.id).await;
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

async fn reorder_channels(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    form: web::Json<ChannelOrderForm>,
) -> AppResult<HttpResponse> {
    let widget = get_owned_widget(&state, &user, &path).await?;
    let order: Vec<(String, i32)> = form
        .order
        .iter()
        .map(|e| (e.id.clone(), e.sort_order))
        .collect();

    ChannelService::new(&state.db)
        .reorder_channels(&widget.id, &order)
        .await?;

    state.embed_cache.invalidate(&widget.id).await;
    let channels = ChannelService::new(&state.db)
        .get_channels_by_widget_id(&widget.id)
        .await?;
    Ok(HttpResponse::Ok().json(channels))
}
