use std::str::FromStr;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::channel::{Channel, ChannelForm, ChannelType, UpdateChannelForm};
use crate::utils::misc::generate_uuid;
use crate::utils::time::current_timestamp;

const CHANNEL_COLUMNS: &str =
    "id, widget_id, channel_type, value, label, parent_id, sort_order, created_at";

/// Shape rules for updates that touch the type or parent: a group never has
/// a parent, and a group keeps its type while children still point at it.
fn check_group_shape(
    new_type: Option<ChannelType>,
    has_parent: bool,
    was_group: bool,
    has_children: bool,
) -> AppResult<()> {
    if new_type == Some(ChannelType::Group) && has_parent {
        return Err(AppError::BadRequest("Groups cannot be nested".to_string()));
    }
    if was_group && new_type != Some(ChannelType::Group) && has_children {
        return Err(AppError::BadRequest(
            "Group with child channels cannot change type".to_string(),
        ));
    }
    Ok(())
}

pub struct ChannelService<'a> {
    db: &'a Database,
}

impl<'a> ChannelService<'a> {
    pub fn new(db: &'a Database) -> Self {
        ChannelService { db }
    }

    /// A parent must be a `group` channel of the same widget; groups cannot
    /// nest, so depth is at most one.
    async fn check_parent(&self, widget_id: &str, parent_id: &str) -> AppResult<()> {
        let parent = self
            .get_channel_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Parent channel not found".to_string()))?;

        if parent.widget_id != widget_id {
            return Err(AppError::BadRequest(
                "Parent channel belongs to another widget".to_string(),
            ));
        }
        if ChannelType::from_str(&parent.channel_type) != Ok(ChannelType::Group) {
            return Err(AppError::BadRequest(
                "Parent channel must be a group".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn create_channel(&self, widget_id: &str, form: &ChannelForm) -> AppResult<Channel> {
        if let Some(ref parent_id) = form.parent_id {
            if form.channel_type == ChannelType::Group {
                return Err(AppError::BadRequest("Groups cannot be nested".to_string()));
            }
            self.check_parent(widget_id, parent_id).await?;
        }

        let id = generate_uuid();
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO channel (id, widget_id, channel_type, value, label, parent_id, sort_order, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&id)
        .bind(widget_id)
        .bind(form.channel_type.as_str())
        .bind(form.value.as_deref().unwrap_or(""))
        .bind(form.label.as_deref().unwrap_or(""))
        .bind(&form.parent_id)
        .bind(form.sort_order.unwrap_or(0))
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_channel_by_id(&id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Failed to create channel".to_string()))
    }

    pub async fn get_channel_by_id(&self, id: &str) -> AppResult<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>(&format!(
            "SELECT {} FROM channel WHERE id = $1",
            CHANNEL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(channel)
    }

    pub async fn get_channels_by_widget_id(&self, widget_id: &str) -> AppResult<Vec<Channel>> {
        let channels = sqlx::query_as::<_, Channel>(&format!(
            "SELECT {} FROM channel WHERE widget_id = $1 ORDER BY sort_order ASC, created_at ASC",
            CHANNEL_COLUMNS
        ))
        .bind(widget_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(channels)
    }

    pub async fn update_channel(
        &self,
        widget_id: &str,
        id: &str,
        form: &UpdateChannelForm,
    ) -> AppResult<Channel> {
        let existing = self
            .get_channel_by_id(id)
            .await?
            .filter(|c| c.widget_id == widget_id)
            .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

        let new_type = form
            .channel_type
            .or_else(|| ChannelType::from_str(&existing.channel_type).ok());
        let was_group = ChannelType::from_str(&existing.channel_type) == Ok(ChannelType::Group);

        // The parent that will be in effect after the update, whether it
        // comes from the form or is carried over unchanged.
        let parent_id = match &form.parent_id {
            Some(explicit) => explicit.clone(),
            None => existing.parent_id.clone(),
        };

        let has_children = if was_group && new_type != Some(ChannelType::Group) {
            self.has_children(id).await?
        } else {
            false
        };
        check_group_shape(new_type, parent_id.is_some(), was_group, has_children)?;

        if let Some(Some(ref new_parent)) = form.parent_id {
            if new_parent == id {
                return Err(AppError::BadRequest(
                    "Channel cannot be its own parent".to_string(),
                ));
            }
            self.check_parent(widget_id, new_parent).await?;
        }

        let channel_type = new_type
            .map(|t| t.as_str().to_string())
            .unwrap_or(existing.channel_type);
        let value = form.value.clone().unwrap_or(existing.value);
        let label = form.label.clone().unwrap_or(existing.label);
        let sort_order = form.sort_order.unwrap_or(existing.sort_order);

        sqlx::query(
            r#"
            UPDATE channel
            SET channel_type = $1, value = $2, label = $3, parent_id = $4, sort_order = $5
            WHERE id = $6
            "#,
        )
        .bind(&channel_type)
        .bind(&value)
        .bind(&label)
        .bind(&parent_id)
        .bind(sort_order)
        .bind(id)
        .execute(&self.db.pool)
        .await?;

        self.get_channel_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))
    }

    async fn has_children(&self, id: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channel WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count > 0)
    }

    /// Deleting a group detaches its children (FK sets their parent to NULL).
    pub async fn delete_channel(&self, widget_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM channel WHERE id = $1 AND widget_id = $2")
            .bind(id)
            .bind(widget_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }

        Ok(())
    }

    pub async fn reorder_channels(
        &self,
        widget_id: &str,
        order: &[(String, i32)],
    ) -> AppResult<()> {
        let mut tx = self.db.pool.begin().await?;

        for (id, sort_order) in order {
            sqlx::query("UPDATE channel SET sort_order = $1 WHERE id = $2 AND widget_id = $3")
                .bind(sort_order)
                .bind(id)
                .bind(widget_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_cannot_become_group_while_parented() {
        // Retyping a parented channel to `group` would nest groups even
        // though the form never mentions parent_id.
        let result = check_group_shape(Some(ChannelType::Group), true, false, false);
        assert!(result.is_err());
    }

    #[test]
    fn test_group_with_children_keeps_its_type() {
        let result = check_group_shape(Some(ChannelType::Whatsapp), false, true, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_group_may_change_type() {
        assert!(check_group_shape(Some(ChannelType::Link), false, true, false).is_ok());
    }

    #[test]
    fn test_top_level_channel_may_become_group() {
        assert!(check_group_shape(Some(ChannelType::Group), false, false, false).is_ok());
    }

    #[test]
    fn test_parented_child_may_change_between_leaf_types() {
        assert!(check_group_shape(Some(ChannelType::Email), true, false, false).is_ok());
    }
}
