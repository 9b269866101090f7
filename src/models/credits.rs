use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserCredits {
    pub user_id: String,
    pub balance: i64,
    pub total_spent: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditTransaction {
    pub id: String,
    pub user_id: String,
    /// Positive for top-ups, negative for spends.
    pub amount: i64,
    pub description: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SpendCreditsForm {
    #[validate(range(min = 1))]
    pub amount: i64,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCreditsForm {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(range(min = 1))]
    pub amount: i64,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub description: Option<String>,
}
