use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetPosition {
    Left,
    Right,
}

impl WidgetPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetPosition::Left => "left",
            WidgetPosition::Right => "right",
        }
    }
}

/// When the tooltip bubble next to the floating button is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TooltipDisplay {
    None,
    OnLoad,
    Always,
}

impl TooltipDisplay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TooltipDisplay::None => "none",
            TooltipDisplay::OnLoad => "on_load",
            TooltipDisplay::Always => "always",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Widget {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub website_url: String,
    pub button_color: String,
    pub position: String,
    pub tooltip_text: String,
    pub tooltip_display: String,
    pub custom_icon_file_id: Option<String>,
    pub notify_url: Option<String>,
    pub video_url: Option<String>,
    pub video_autoplay: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_hex_color"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct WidgetForm {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(url)]
    pub website_url: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_hex_color))]
    pub button_color: Option<String>,
    #[serde(default)]
    pub position: Option<WidgetPosition>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub tooltip_text: Option<String>,
    #[serde(default)]
    pub tooltip_display: Option<TooltipDisplay>,
    #[serde(default)]
    pub custom_icon_file_id: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub notify_url: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_autoplay: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWidgetForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub website_url: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_hex_color))]
    pub button_color: Option<String>,
    #[serde(default)]
    pub position: Option<WidgetPosition>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub tooltip_text: Option<String>,
    #[serde(default)]
    pub tooltip_display: Option<TooltipDisplay>,
    /// `Some(None)` clears the column; absent leaves it untouched.
    #[serde(default, with = "crate::models::double_option")]
    pub custom_icon_file_id: Option<Option<String>>,
    #[serde(default, with = "crate::models::double_option")]
    pub notify_url: Option<Option<String>>,
    #[serde(default, with = "crate::models::double_option")]
    pub video_url: Option<Option<String>>,
    #[serde(default)]
    pub video_autoplay: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct WidgetListResponse {
    pub id: String,
    pub name: String,
    pub website_url: String,
    pub is_active: bool,
    pub updated_at: i64,
    pub created_at: i64,
}

impl From<Widget> for WidgetListResponse {
    fn from(widget: Widget) -> Self {
        WidgetListResponse {
            id: widget.id,
            name: widget.name,
            website_url: widget.website_url,
            is_active: widget.is_active,
            updated_at: widget.updated_at,
            created_at: widget.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hex_color() {
        assert!(validate_hex_color("#0b93f6").is_ok());
        assert!(validate_hex_color("#FFFFFF").is_ok());
        assert!(validate_hex_color("0b93f6").is_err());
        assert!(validate_hex_color("#0b93f").is_err());
        assert!(validate_hex_color("#0b93g6").is_err());
    }

    #[test]
    fn test_widget_form_validation() {
        let form = WidgetForm {
            name: "".to_string(),
            website_url: None,
            button_color: None,
            position: None,
            tooltip_text: None,
            tooltip_display: None,
            custom_icon_file_id: None,
            notify_url: None,
            video_url: None,
            video_autoplay: None,
        };
        assert!(validator::Validate::validate(&form).is_err());

        let form = WidgetForm {
            name: "Support widget".to_string(),
            website_url: Some("https://example.com".to_string()),
            button_color: Some("#112233".to_string()),
            position: Some(WidgetPosition::Left),
            tooltip_text: Some("Chat with us".to_string()),
            tooltip_display: Some(TooltipDisplay::OnLoad),
            custom_icon_file_id: None,
            notify_url: None,
            video_url: None,
            video_autoplay: None,
        };
        assert!(validator::Validate::validate(&form).is_ok());
    }

    #[test]
    fn test_update_form_distinguishes_null_from_absent() {
        let form: UpdateWidgetForm = serde_json::from_str(r#"{"video_url": null}"#).unwrap();
        assert_eq!(form.video_url, Some(None));
        assert!(form.notify_url.is_none());
        assert!(form.custom_icon_file_id.is_none());

        let form: UpdateWidgetForm =
            serde_json::from_str(r#"{"notify_url": "https://example.com/hook"}"#).unwrap();
        assert_eq!(
            form.notify_url,
            Some(Some("https://example.com/hook".to_string()))
        );
        assert!(form.video_url.is_none());
    }
}
