use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    Draft,
    Published,
}

impl BlogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "draft",
            BlogStatus::Published => "published",
        }
    }
}

impl FromStr for BlogStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(BlogStatus::Draft),
            "published" => Ok(BlogStatus::Published),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlogPost {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: String,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BlogForm {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Derived from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBlogForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlogListResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub published_at: Option<i64>,
    pub updated_at: i64,
    pub created_at: i64,
}

impl From<BlogPost> for BlogListResponse {
    fn from(post: BlogPost) -> Self {
        BlogListResponse {
            id: post.id,
            title: post.title,
            slug: post.slug,
            status: post.status,
            published_at: post.published_at,
            updated_at: post.updated_at,
            created_at: post.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names_match_stored_values() {
        assert_eq!(BlogStatus::Draft.as_str(), "draft");
        assert_eq!(BlogStatus::Published.as_str(), "published");
        assert_eq!(BlogStatus::from_str("draft"), Ok(BlogStatus::Draft));
        assert!(BlogStatus::from_str("archived").is_err());
    }
}
