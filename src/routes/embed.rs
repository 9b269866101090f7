use actix_web::{web, HttpResponse};

use crate::embed;
use crate::error::{AppError, AppResult};
use crate::services::channel::ChannelService;
use crate::services::widget::WidgetService;
use crate::AppState;

/// Public: the self-contained widget script a host page loads.
///
/// Rendered scripts are cached; any widget or channel mutation invalidates
/// the entry. Deactivated widgets get a comment-only stub so existing
/// script tags on host pages never break.
pub async fn get_embed_script(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let widget_id = path.into_inner();

    if let Some(cached) = state.embed_cache.get(&widget_id).await {
        return Ok(script_response(cached));
    }

    let widget = WidgetService::new(&state.db)
        .get_widget_by_id(&widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;

    let script = if widget.is_active {
        let channels = ChannelService::new(&state.db)
            .get_channels_by_widget_id(&widget.id)
            .await?;
        embed::render_widget_script(&widget, &channels, &state.config.public_base_url)
    } else {
        embed::render_inactive_stub(&widget.id)
    };

    state.embed_cache.put(&widget_id, &script).await;
    Ok(script_response(script))
}

fn script_response(script: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .insert_header(("Cache-Control", "public, max-age=300"))
        .body(script)
}
