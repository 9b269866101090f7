use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::blog::{BlogPost, BlogStatus};
use crate::utils::misc::generate_uuid;
use crate::utils::time::current_timestamp;

const BLOG_COLUMNS: &str =
    "id, user_id, title, slug, content, status, published_at, created_at, updated_at";

/// A concurrent create/update can slip past the slug pre-check and hit the
/// unique index instead; surface that race as the same 409.
fn slug_conflict(err: sqlx::Error, slug: &str) -> AppError {
    let unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if unique {
        AppError::Conflict(format!("Slug '{}' already in use", slug))
    } else {
        AppError::Database(err)
    }
}

pub struct BlogService<'a> {
    db: &'a Database,
}

impl<'a> BlogService<'a> {
    pub fn new(db: &'a Database) -> Self {
        BlogService { db }
    }

    pub async fn create_post(
        &self,
        user_id: &str,
        title: &str,
        slug: &str,
        content: &str,
    ) -> AppResult<BlogPost> {
        if self.get_post_by_slug(slug).await?.is_some() {
            return Err(AppError::Conflict(format!("Slug '{}' already in use", slug)));
        }

        let id = generate_uuid();
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO blog_post (id, user_id, title, slug, content, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'draft', $6, $6)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(slug)
        .bind(content)
        .bind(now)
        .execute(&self.db.pool)
        .await
        .map_err(|e| slug_conflict(e, slug))?;

        self.get_post_by_id(&id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Failed to create post".to_string()))
    }

    pub async fn get_post_by_id(&self, id: &str) -> AppResult<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {} FROM blog_post WHERE id = $1",
            BLOG_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(post)
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> AppResult<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {} FROM blog_post WHERE slug = $1",
            BLOG_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(post)
    }

    /// Public lookup: only published posts are visible by slug.
    pub async fn get_published_post_by_slug(&self, slug: &str) -> AppResult<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {} FROM blog_post WHERE slug = $1 AND status = 'published'",
            BLOG_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(post)
    }

    pub async fn get_posts_by_user_id(&self, user_id: &str) -> AppResult<Vec<BlogPost>> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {} FROM blog_post WHERE user_id = $1 ORDER BY updated_at DESC",
            BLOG_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(posts)
    }

    pub async fn update_post(
        &self,
        id: &str,
        title: Option<&str>,
        slug: Option<&str>,
        content: Option<&str>,
    ) -> AppResult<BlogPost> {
        if let Some(new_slug) = slug {
            if let Some(existing) = self.get_post_by_slug(new_slug).await? {
                if existing.id != id {
                    return Err(AppError::Conflict(format!(
                        "Slug '{}' already in use",
                        new_slug
                    )));
                }
            }
        }

        let post = self
            .get_post_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let now = current_timestamp();
        let slug_value = slug.unwrap_or(&post.slug);

        sqlx::query(
            "UPDATE blog_post SET title = $1, slug = $2, content = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(title.unwrap_or(&post.title))
        .bind(slug_value)
        .bind(content.unwrap_or(&post.content))
        .bind(now)
        .bind(id)
        .execute(&self.db.pool)
        .await
        .map_err(|e| slug_conflict(e, slug_value))?;

        self.get_post_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// `draft -> published` only; publishing twice is rejected.
    pub async fn publish_post(&self, id: &str) -> AppResult<BlogPost> {
        let post = self
            .get_post_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.status == BlogStatus::Published.as_str() {
            return Err(AppError::BadRequest("Post is already published".to_string()));
        }

        let now = current_timestamp();
        sqlx::query(
            "UPDATE blog_post SET status = 'published', published_at = $1, updated_at = $1 WHERE id = $2",
        )
        .bind(now)
        .bind(id)
        .execute(&self.db.pool)
        .await?;

        self.get_post_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    pub async fn delete_post(&self, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM blog_post WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err = slug_conflict(sqlx::Error::Database(Box::new(UniqueViolation)), "hello");
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("hello"));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        let err = slug_conflict(sqlx::Error::RowNotFound, "hello");
        assert!(matches!(err, AppError::Database(_)));
    }
}
