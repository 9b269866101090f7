use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use validator::Validate;

/// The closed set of contact channel kinds a widget can offer.
///
/// `Group` is a container: it carries no target of its own and renders as a
/// submenu holding its child channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Whatsapp,
    Telegram,
    Email,
    Phone,
    Instagram,
    Facebook,
    Messenger,
    Viber,
    Skype,
    Link,
    Group,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Whatsapp => "whatsapp",
            ChannelType::Telegram => "telegram",
            ChannelType::Email => "email",
            ChannelType::Phone => "phone",
            ChannelType::Instagram => "instagram",
            ChannelType::Facebook => "facebook",
            ChannelType::Messenger => "messenger",
            ChannelType::Viber => "viber",
            ChannelType::Skype => "skype",
            ChannelType::Link => "link",
            ChannelType::Group => "group",
        }
    }
}

impl FromStr for ChannelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whatsapp" => Ok(ChannelType::Whatsapp),
            "telegram" => Ok(ChannelType::Telegram),
            "email" => Ok(ChannelType::Email),
            "phone" => Ok(ChannelType::Phone),
            "instagram" => Ok(ChannelType::Instagram),
            "facebook" => Ok(ChannelType::Facebook),
            "messenger" => Ok(ChannelType::Messenger),
            "viber" => Ok(ChannelType::Viber),
            "skype" => Ok(ChannelType::Skype),
            "link" => Ok(ChannelType::Link),
            "group" => Ok(ChannelType::Group),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub id: String,
    pub widget_id: String,
    pub channel_type: String,
    pub value: String,
    pub label: String,
    pub parent_id: Option<String>,
    pub sort_order: i32,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChannelForm {
    pub channel_type: ChannelType,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub value: Option<String>,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub label: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateChannelForm {
    #[serde(default)]
    pub channel_type: Option<ChannelType>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub value: Option<String>,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub label: Option<String>,
    /// `Some(None)` clears the parent; absent leaves it untouched.
    #[serde(default, with = "crate::models::double_option")]
    pub parent_id: Option<Option<String>>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelOrderEntry {
    pub id: String,
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct ChannelOrderForm {
    pub order: Vec<ChannelOrderEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_roundtrip() {
        for t in [
            ChannelType::Whatsapp,
            ChannelType::Telegram,
            ChannelType::Email,
            ChannelType::Phone,
            ChannelType::Instagram,
            ChannelType::Facebook,
            ChannelType::Messenger,
            ChannelType::Viber,
            ChannelType::Skype,
            ChannelType::Link,
            ChannelType::Group,
        ] {
            assert_eq!(ChannelType::from_str(t.as_str()), Ok(t));
        }
        assert!(ChannelType::from_str("carrier-pigeon").is_err());
    }

    #[test]
    fn test_channel_type_serde_names() {
        let t: ChannelType = serde_json::from_str("\"whatsapp\"").unwrap();
        assert_eq!(t, ChannelType::Whatsapp);
        assert_eq!(serde_json::to_string(&ChannelType::Group).unwrap(), "\"group\"");
    }
}
