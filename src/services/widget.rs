use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::widget::{UpdateWidgetForm, Widget, WidgetForm};
use crate::utils::misc::generate_uuid;
use crate::utils::time::current_timestamp;

const WIDGET_COLUMNS: &str = "id, user_id, name, website_url, button_color, position, \
     tooltip_text, tooltip_display, custom_icon_file_id, notify_url, video_url, \
     video_autoplay, is_active, created_at, updated_at";

pub struct WidgetService<'a> {
    db: &'a Database,
}

impl<'a> WidgetService<'a> {
    pub fn new(db: &'a Database) -> Self {
        WidgetService { db }
    }

    pub async fn create_widget(&self, user_id: &str, form: &WidgetForm) -> AppResult<Widget> {
        let id = generate_uuid();
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO widget
                (id, user_id, name, website_url, button_color, position, tooltip_text,
                 tooltip_display, custom_icon_file_id, notify_url, video_url,
                 video_autoplay, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, TRUE, $13, $13)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&form.name)
        .bind(form.website_url.as_deref().unwrap_or(""))
        .bind(form.button_color.as_deref().unwrap_or("#0b93f6"))
        .bind(form.position.map(|p| p.as_str()).unwrap_or("right"))
        .bind(form.tooltip_text.as_deref().unwrap_or(""))
        .bind(form.tooltip_display.map(|t| t.as_str()).unwrap_or("none"))
        .bind(&form.custom_icon_file_id)
        .bind(&form.notify_url)
        .bind(&form.video_url)
        .bind(form.video_autoplay.unwrap_or(false))
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_widget_by_id(&id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Failed to create widget".to_string()))
    }

    pub async fn get_widget_by_id(&self, id: &str) -> AppResult<Option<Widget>> {
        let widget = sqlx::query_as::<_, Widget>(&format!(
            "SELECT {} FROM widget WHERE id = $1",
            WIDGET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(widget)
    }

    pub async fn get_widgets_by_user_id(&self, user_id: &str) -> AppResult<Vec<Widget>> {
        let widgets = sqlx::query_as::<_, Widget>(&format!(
            "SELECT {} FROM widget WHERE user_id = $1 ORDER BY updated_at DESC",
            WIDGET_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(widgets)
    }

    pub async fn update_widget(&self, id: &str, form: &UpdateWidgetForm) -> AppResult<Widget> {
        let now = current_timestamp();

        let mut updates = vec!["updated_at = $1".to_string()];
        let mut bind_count = 2;

        let mut push = |column: &str, updates: &mut Vec<String>| {
            updates.push(format!("{} = ${}", column, bind_count));
            bind_count += 1;
        };

        if form.name.is_some() {
            push("name", &mut updates);
        }
        if form.website_url.is_some() {
            push("website_url", &mut updates);
        }
        if form.button_color.is_some() {
            push("button_color", &mut updates);
        }
        if form.position.is_some() {
            push("position", &mut updates);
        }
        if form.tooltip_text.is_some() {
            push("tooltip_text", &mut updates);
        }
        if form.tooltip_display.is_some() {
            push("tooltip_display", &mut updates);
        }
        if form.custom_icon_file_id.is_some() {
            push("custom_icon_file_id", &mut updates);
        }
        if form.notify_url.is_some() {
            push("notify_url", &mut updates);
        }
        if form.video_url.is_some() {
            push("video_url", &mut updates);
        }
        if form.video_autoplay.is_some() {
            push("video_autoplay", &mut updates);
        }
        if form.is_active.is_some() {
            push("is_active", &mut updates);
        }

        let query_str = format!(
            "UPDATE widget SET {} WHERE id = ${}",
            updates.join(", "),
            bind_count
        );

        let mut query = sqlx::query(&query_str);
        query = query.bind(now);

        if let Some(ref v) = form.name {
            query = query.bind(v);
        }
        if let Some(ref v) = form.website_url {
            query = query.bind(v);
        }
        if let Some(ref v) = form.button_color {
            query = query.bind(v);
        }
        if let Some(v) = form.position {
            query = query.bind(v.as_str());
        }
        if let Some(ref v) = form.tooltip_text {
            query = query.bind(v);
        }
        if let Some(v) = form.tooltip_display {
            query = query.bind(v.as_str());
        }
        if let Some(ref v) = form.custom_icon_file_id {
            query = query.bind(v);
        }
        if let Some(ref v) = form.notify_url {
            query = query.bind(v);
        }
        if let Some(ref v) = form.video_url {
            query = query.bind(v);
        }
        if let Some(v) = form.video_autoplay {
            query = query.bind(v);
        }
        if let Some(v) = form.is_active {
            query = query.bind(v);
        }

        query = query.bind(id);

        query.execute(&self.db.pool).await?;

        self.get_widget_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))
    }

    pub async fn delete_widget(&self, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM widget WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }
}
