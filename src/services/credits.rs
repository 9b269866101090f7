use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::credits::{CreditTransaction, UserCredits};
use crate::utils::misc::generate_uuid;
use crate::utils::time::current_timestamp;

pub struct CreditsService<'a> {
    db: &'a Database,
}

impl<'a> CreditsService<'a> {
    pub fn new(db: &'a Database) -> Self {
        CreditsService { db }
    }

    /// Fetch the balance row, creating it with the signup grant on first
    /// access.
    pub async fn get_or_init(&self, user_id: &str, signup_grant: i64) -> AppResult<UserCredits> {
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO user_credits (user_id, balance, total_spent, updated_at)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(signup_grant)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        let credits = sqlx::query_as::<_, UserCredits>(
            "SELECT user_id, balance, total_spent, updated_at FROM user_credits WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(credits)
    }

    /// Atomically deduct credits. A single conditional UPDATE guarantees the
    /// balance never goes negative; insufficient funds leave no trace.
    pub async fn spend(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
    ) -> AppResult<UserCredits> {
        if amount <= 0 {
            return Err(AppError::BadRequest("Amount must be positive".to_string()));
        }

        let now = current_timestamp();
        let mut tx = self.db.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE user_credits
            SET balance = balance - $1, total_spent = total_spent + $1, updated_at = $2
            WHERE user_id = $3 AND balance >= $1
            "#,
        )
        .bind(amount)
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BadRequest("Insufficient credits".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO credit_transaction (id, user_id, amount, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(generate_uuid())
        .bind(user_id)
        .bind(-amount)
        .bind(description)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let credits = sqlx::query_as::<_, UserCredits>(
            "SELECT user_id, balance, total_spent, updated_at FROM user_credits WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(credits)
    }

    pub async fn add(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
    ) -> AppResult<UserCredits> {
        if amount <= 0 {
            return Err(AppError::BadRequest("Amount must be positive".to_string()));
        }

        let now = current_timestamp();
        let mut tx = self.db.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_credits (user_id, balance, total_spent, updated_at)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (user_id) DO UPDATE SET balance = user_credits.balance + $2, updated_at = $3
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO credit_transaction (id, user_id, amount, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(generate_uuid())
        .bind(user_id)
        .bind(amount)
        .bind(description)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let credits = sqlx::query_as::<_, UserCredits>(
            "SELECT user_id, balance, total_spent, updated_at FROM user_credits WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(credits)
    }

    pub async fn get_transactions(&self, user_id: &str) -> AppResult<Vec<CreditTransaction>> {
        let transactions = sqlx::query_as::<_, CreditTransaction>(
            r#"
            SELECT id, user_id, amount, description, created_at
            FROM credit_transaction
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(transactions)
    }
}
