use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthMiddleware, AuthUser};
use crate::models::file::StoredFileResponse;
use crate::services::file::FileService;
use crate::utils::misc::generate_uuid;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/upload")
            .wrap(AuthMiddleware)
            .route(web::post().to(upload_file)),
    )
    // Icons are referenced from embed scripts on third-party pages, so
    // content is served without auth.
    .route("/{id}/content", web::get().to(get_file_content))
    .service(
        web::resource("/{id}/delete")
            .wrap(AuthMiddleware)
            .route(web::delete().to(delete_file)),
    );
}

fn check_image_content_type(content_type: &str) -> AppResult<()> {
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "Only image uploads are accepted".to_string(),
        ));
    }
    Ok(())
}

fn append_chunk(data: &mut Vec<u8>, chunk: &[u8], max_size: usize) -> AppResult<()> {
    if data.len() + chunk.len() > max_size {
        return Err(AppError::BadRequest(format!(
            "File exceeds maximum size of {} bytes",
            max_size
        )));
    }
    data.extend_from_slice(chunk);
    Ok(())
}

fn stored_filename(id: &str, original: &str) -> String {
    let ext = std::path::Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    format!("{}.{}", id, ext)
}

async fn persist_upload(
    dir: &std::path::Path,
    stored_name: &str,
    data: &[u8],
) -> AppResult<std::path::PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(stored_name);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

async fn upload_file(
    state: web::Data<AppState>,
    user: AuthUser,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut field = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
        .ok_or_else(|| AppError::BadRequest("No file in payload".to_string()))?;

    let content_type = field
        .content_type()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    check_image_content_type(&content_type)?;

    let filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or("icon")
        .to_string();

    let max_size = state.config.max_upload_size;
    let mut data: Vec<u8> = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Upload failed: {}", e)))?
    {
        append_chunk(&mut data, &chunk, max_size)?;
    }

    if data.is_empty() {
        return Err(AppError::BadRequest("Empty upload".to_string()));
    }

    let id = generate_uuid();
    let stored_name = stored_filename(&id, &filename);
    let path = persist_upload(
        std::path::Path::new(&state.config.upload_dir),
        &stored_name,
        &data,
    )
    .await?;

    let file = FileService::new(&state.db)
        .create_file(
            &id,
            &user.id,
            &filename,
            &path.to_string_lossy(),
            &content_type,
            data.len() as i64,
        )
        .await?;

    tracing::info!("File uploaded: {} ({} bytes) by {}", id, data.len(), user.id);
    Ok(HttpResponse::Ok().json(StoredFileResponse::from(file)))
}

async fn get_file_content(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<actix_files::NamedFile> {
    let file = FileService::new(&state.db)
        .get_file_by_id(&path)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let named = actix_files::NamedFile::open(&file.path)
        .map_err(|_| AppError::NotFound("File content missing".to_string()))?;

    Ok(named)
}

async fn delete_file(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let service = FileService::new(&state.db);
    let file = service
        .get_file_by_id_and_user_id(&path, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    if let Err(e) = tokio::fs::remove_file(&file.path).await {
        tracing::warn!("Failed to remove file {} from disk: {}", file.path, e);
    }
    service.delete_file(&file.id).await?;

    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_images_pass_the_content_type_gate() {
        assert!(check_image_content_type("image/png").is_ok());
        assert!(check_image_content_type("image/svg+xml").is_ok());
        assert!(check_image_content_type("application/pdf").is_err());
        assert!(check_image_content_type("text/html").is_err());
    }

    #[test]
    fn test_size_cap_boundary() {
        let mut data = Vec::new();
        // Filling the cap exactly is fine; one more byte is not.
        assert!(append_chunk(&mut data, &[0u8; 8], 8).is_ok());
        assert_eq!(data.len(), 8);
        assert!(append_chunk(&mut data, &[0u8; 1], 8).is_err());
        assert_eq!(data.len(), 8);
    }

    #[test]
    fn test_stored_filename_keeps_extension() {
        assert_eq!(stored_filename("f1", "logo.png"), "f1.png");
        assert_eq!(stored_filename("f1", "icon"), "f1.bin");
        assert_eq!(stored_filename("f1", "archive.tar.gz"), "f1.gz");
    }

    #[actix_web::test]
    async fn test_persist_upload_writes_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist_upload(dir.path(), "f1.png", b"\x89PNG")
            .await
            .unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\x89PNG");
    }
}
