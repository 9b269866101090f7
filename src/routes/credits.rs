use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AdminMiddleware, AuthMiddleware, AuthUser};
use crate::models::credits::{AddCreditsForm, SpendCreditsForm};
use crate::services::credits::CreditsService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_credits)),
    )
    .service(
        web::resource("/transactions")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_transactions)),
    )
    .service(
        web::resource("/spend")
            .wrap(AuthMiddleware)
            .route(web::post().to(spend_credits)),
    )
    .service(
        web::resource("/add")
            .wrap(AdminMiddleware)
            .route(web::post().to(add_credits)),
    );
}

async fn get_credits(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let credits = CreditsService::new(&state.db)
        .get_or_init(&user.id, state.config.signup_credit_grant)
        .await?;
    Ok(HttpResponse::Ok().json(credits))
}

async fn get_transactions(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let transactions = CreditsService::new(&state.db)
        .get_transactions(&user.id)
        .await?;
    Ok(HttpResponse::Ok().json(transactions))
}

async fn spend_credits(
    state: web::Data<AppState>,
    user: AuthUser,
    form: web::Json<SpendCreditsForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CreditsService::new(&state.db);
    // Make sure the balance row exists before deducting.
    service
        .get_or_init(&user.id, state.config.signup_credit_grant)
        .await?;

    let credits = service
        .spend(
            &user.id,
            form.amount,
            form.description.as_deref().unwrap_or(""),
        )
        .await?;

    tracing::info!("Credits spent: {} by {}", form.amount, user.id);
    Ok(HttpResponse::Ok().json(credits))
}

async fn add_credits(
    state: web::Data<AppState>,
    admin: AuthUser,
    form: web::Json<AddCreditsForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let credits = CreditsService::new(&state.db)
        .add(
            &form.user_id,
            form.amount,
            form.description.as_deref().unwrap_or("Admin top-up"),
        )
        .await?;

    tracing::info!(
        "Credits added: {} to {} by {}",
        form.amount,
        form.user_id,
        admin.id
    );
    Ok(HttpResponse::Ok().json(credits))
}
