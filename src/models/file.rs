use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredFile {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub path: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct StoredFileResponse {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: i64,
}

impl From<StoredFile> for StoredFileResponse {
    fn from(file: StoredFile) -> Self {
        StoredFileResponse {
            id: file.id,
            filename: file.filename,
            content_type: file.content_type,
            size: file.size,
            created_at: file.created_at,
        }
    }
}
