use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::file::StoredFile;
use crate::utils::time::current_timestamp;

const FILE_COLUMNS: &str = "id, user_id, filename, path, content_type, size, created_at";

pub struct FileService<'a> {
    db: &'a Database,
}

impl<'a> FileService<'a> {
    pub fn new(db: &'a Database) -> Self {
        FileService { db }
    }

    pub async fn create_file(
        &self,
        id: &str,
        user_id: &str,
        filename: &str,
        path: &str,
        content_type: &str,
        size: i64,
    ) -> AppResult<StoredFile> {
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO stored_file (id, user_id, filename, path, content_type, size, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(filename)
        .bind(path)
        .bind(content_type)
        .bind(size)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_file_by_id(id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Failed to create file".to_string()))
    }

    pub async fn get_file_by_id(&self, id: &str) -> AppResult<Option<StoredFile>> {
        let file = sqlx::query_as::<_, StoredFile>(&format!(
            "SELECT {} FROM stored_file WHERE id = $1",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(file)
    }

    pub async fn get_file_by_id_and_user_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> AppResult<Option<StoredFile>> {
        let file = sqlx::query_as::<_, StoredFile>(&format!(
            "SELECT {} FROM stored_file WHERE id = $1 AND user_id = $2",
            FILE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(file)
    }

    pub async fn delete_file(&self, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM stored_file WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }
}
