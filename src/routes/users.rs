use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::middleware::{AdminMiddleware, AuthMiddleware, AuthUser};
use crate::models::user::UserResponse;
use crate::services::user::UserService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/me")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_current_user)),
    )
    .service(
        web::resource("")
            .wrap(AdminMiddleware)
            .route(web::get().to(get_all_users)),
    );
}

async fn get_current_user(user: AuthUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse::from(user.user)))
}

async fn get_all_users(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users = UserService::new(&state.db).get_all_users().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(users))
}
