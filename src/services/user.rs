use crate::db::Database;
use crate::error::AppResult;
use crate::models::auth::Claims;
use crate::models::user::User;
use crate::utils::time::current_timestamp;

pub struct UserService<'a> {
    db: &'a Database,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database) -> Self {
        UserService { db }
    }

    pub async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, last_active_at, created_at, updated_at
            FROM user_account
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_all_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, last_active_at, created_at, updated_at
            FROM user_account
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;

        Ok(users)
    }

    /// Provision or refresh the local row for a user the identity platform
    /// has vouched for. First sight of a user creates the row; later
    /// requests just bump `last_active_at`.
    pub async fn ensure_user_from_claims(&self, claims: &Claims) -> AppResult<User> {
        let now = current_timestamp();
        let email = claims.email.clone().unwrap_or_default();
        let name = claims.name.clone().unwrap_or_default();
        let role = claims.role.clone().unwrap_or_else(|| "user".to_string());

        sqlx::query(
            r#"
            INSERT INTO user_account (id, email, name, role, last_active_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5, $5)
            ON CONFLICT (id) DO UPDATE SET last_active_at = $5
            "#,
        )
        .bind(&claims.sub)
        .bind(&email)
        .bind(&name)
        .bind(&role)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_user_by_id(&claims.sub).await?.ok_or_else(|| {
            crate::error::AppError::InternalServerError("Failed to provision user".to_string())
        })
    }
}
