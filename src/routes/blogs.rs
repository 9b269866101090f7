use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthMiddleware, AuthUser};
use crate::models::blog::{BlogForm, BlogListResponse, BlogPost, UpdateBlogForm};
use crate::services::blog::BlogService;
use crate::utils::misc::{is_valid_slug, slugify};
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    // Public lookup for published posts
    cfg.route("/slug/{slug}", web::get().to(get_published_by_slug))
        .service(
            web::resource("")
                .wrap(AuthMiddleware)
                .route(web::get().to(get_posts)),
        )
        .service(
            web::resource("/create")
                .wrap(AuthMiddleware)
                .route(web::post().to(create_post)),
        )
        .service(
            web::resource("/{id}")
                .wrap(AuthMiddleware)
                .route(web::get().to(get_post_by_id)),
        )
        .service(
            web::resource("/{id}/update")
                .wrap(AuthMiddleware)
                .route(web::post().to(update_post_by_id)),
        )
        .service(
            web::resource("/{id}/publish")
                .wrap(AuthMiddleware)
                .route(web::post().to(publish_post_by_id)),
        )
        .service(
            web::resource("/{id}/delete")
                .wrap(AuthMiddleware)
                .route(web::delete().to(delete_post_by_id)),
        );
}

fn resolve_slug(title: &str, explicit: Option<&str>) -> AppResult<String> {
    let slug = match explicit {
        Some(slug) => slug.to_string(),
        None => slugify(title),
    };

    if !is_valid_slug(&slug) {
        return Err(AppError::Validation(format!("Invalid slug: '{}'", slug)));
    }

    Ok(slug)
}

async fn get_owned_post(
    state: &web::Data<AppState>,
    user: &AuthUser,
    post_id: &str,
) -> AppResult<BlogPost> {
    let post = BlogService::new(&state.db)
        .get_post_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if post.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden("Not your post".to_string()));
    }

    Ok(post)
}

async fn get_published_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = BlogService::new(&state.db)
        .get_published_post_by_slug(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(post))
}

async fn get_posts(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let posts = BlogService::new(&state.db)
        .get_posts_by_user_id(&user.id)
        .await?;
    let posts: Vec<BlogListResponse> = posts.into_iter().map(BlogListResponse::from).collect();
    Ok(HttpResponse::Ok().json(posts))
}

async fn create_post(
    state: web::Data<AppState>,
    user: AuthUser,
    form: web::Json<BlogForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let slug = resolve_slug(&form.title, form.slug.as_deref())?;
    let post = BlogService::new(&state.db)
        .create_post(
            &user.id,
            &form.title,
            &slug,
            form.content.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

async fn get_post_by_id(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = get_owned_post(&state, &user, &path).await?;
    Ok(HttpResponse::Ok().json(post))
}

async fn update_post_by_id(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    form: web::Json<UpdateBlogForm>,
) -> AppResult<HttpResponse> {
    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let post = get_owned_post(&state, &user, &path).await?;

    let slug = match form.slug.as_deref() {
        Some(slug) => {
            if !is_valid_slug(slug) {
                return Err(AppError::Validation(format!("Invalid slug: '{}'", slug)));
            }
            Some(slug)
        }
        None => None,
    };

    let post = BlogService::new(&state.db)
        .update_post(&post.id, form.title.as_deref(), slug, form.content.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

async fn publish_post_by_id(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = get_owned_post(&state, &user, &path).await?;
    let post = BlogService::new(&state.db).publish_post(&post.id).await?;

    tracing::info!("Blog post published: {} ({})", post.id, post.slug);
    Ok(HttpResponse::Ok().json(post))
}

async fn delete_post_by_id(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = get_owned_post(&state, &user, &path).await?;
    BlogService::new(&state.db).delete_post(&post.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_slug_from_title() {
        assert_eq!(
            resolve_slug("Ten Ways To Reach Customers", None).unwrap(),
            "ten-ways-to-reach-customers"
        );
    }

    #[test]
    fn test_resolve_slug_explicit_wins() {
        assert_eq!(
            resolve_slug("Some Title", Some("custom-slug")).unwrap(),
            "custom-slug"
        );
    }

    #[test]
    fn test_resolve_slug_rejects_invalid() {
        assert!(resolve_slug("Some Title", Some("Not A Slug")).is_err());
        assert!(resolve_slug("!!!", None).is_err());
    }
}
