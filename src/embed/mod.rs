//! Embeddable widget runtime generator.
//!
//! A pure transformation from a stored widget configuration to a
//! self-contained script that renders the floating button, the contact
//! panel (with grouped channels as submenus), tooltip and greeting video
//! on arbitrary host pages. No build step, no dependencies on the host.

pub mod cache;
pub mod links;

use std::str::FromStr;

use crate::models::channel::{Channel, ChannelType};
use crate::models::widget::Widget;
use serde_json::json;

const RUNTIME_TEMPLATE: &str = include_str!("runtime.js");
const CONFIG_PLACEHOLDER: &str = "__REACHPOINT_CONFIG__";

/// Render the embed script for a widget. Never panics on stored data;
/// channels with unusable values are silently dropped.
pub fn render_widget_script(widget: &Widget, channels: &[Channel], base_url: &str) -> String {
    let config = build_config(widget, channels, base_url);
    let blob = escape_for_script(&config.to_string());
    RUNTIME_TEMPLATE.replace(CONFIG_PLACEHOLDER, &blob)
}

/// Script served for widgets that exist but are switched off. Host pages
/// keep a valid script tag and nothing renders.
pub fn render_inactive_stub(widget_id: &str) -> String {
    format!("/* widget {} is not active */\n", widget_id)
}

fn default_label(channel_type: ChannelType) -> &'static str {
    match channel_type {
        ChannelType::Whatsapp => "WhatsApp",
        ChannelType::Telegram => "Telegram",
        ChannelType::Email => "Email",
        ChannelType::Phone => "Call us",
        ChannelType::Instagram => "Instagram",
        ChannelType::Facebook => "Facebook",
        ChannelType::Messenger => "Messenger",
        ChannelType::Viber => "Viber",
        ChannelType::Skype => "Skype",
        ChannelType::Link => "Website",
        ChannelType::Group => "More",
    }
}

fn item_for(channel: &Channel) -> Option<serde_json::Value> {
    let channel_type = ChannelType::from_str(&channel.channel_type).ok()?;
    let href = links::channel_href(channel_type, &channel.value)?;
    let label = if channel.label.is_empty() {
        default_label(channel_type).to_string()
    } else {
        channel.label.clone()
    };
    Some(json!({
        "type": channel_type.as_str(),
        "label": label,
        "href": href,
    }))
}

/// Assemble the config blob substituted into the runtime template.
///
/// Top-level order follows `sort_order`; children nest under their group,
/// also in `sort_order`; empty groups are dropped.
pub fn build_config(widget: &Widget, channels: &[Channel], base_url: &str) -> serde_json::Value {
    let mut sorted: Vec<&Channel> = channels.iter().collect();
    sorted.sort_by_key(|c| (c.sort_order, c.created_at));

    let mut items = Vec::new();
    for channel in sorted.iter().filter(|c| c.parent_id.is_none()) {
        let channel_type = match ChannelType::from_str(&channel.channel_type) {
            Ok(t) => t,
            Err(_) => continue,
        };

        if channel_type == ChannelType::Group {
            let children: Vec<serde_json::Value> = sorted
                .iter()
                .filter(|c| c.parent_id.as_deref() == Some(channel.id.as_str()))
                .filter_map(|c| item_for(c))
                .collect();
            if children.is_empty() {
                continue;
            }
            let label = if channel.label.is_empty() {
                default_label(ChannelType::Group).to_string()
            } else {
                channel.label.clone()
            };
            items.push(json!({
                "type": "group",
                "label": label,
                "children": children,
            }));
        } else if let Some(item) = item_for(channel) {
            items.push(item);
        }
    }

    let icon_url = widget
        .custom_icon_file_id
        .as_ref()
        .map(|id| format!("{}/api/v1/files/{}/content", base_url.trim_end_matches('/'), id));

    let video = widget.video_url.as_ref().map(|url| {
        json!({
            "url": url,
            "autoplay": widget.video_autoplay,
        })
    });

    json!({
        "widgetId": widget.id,
        "color": widget.button_color,
        "position": widget.position,
        "tooltip": {
            "text": widget.tooltip_text,
            "display": widget.tooltip_display,
        },
        "video": video,
        "iconUrl": icon_url,
        "items": items,
    })
}

/// Escape a JSON blob for inline `<script>` embedding. `<`, `>` and `&`
/// only occur inside JSON string literals, where `\uXXXX` escapes are
/// valid, so `</script>` and `<!--` can never appear in the output.
fn escape_for_script(json: &str) -> String {
    json.replace('&', "\\u0026")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Widget {
        Widget {
            id: "w1".to_string(),
            user_id: "u1".to_string(),
            name: "Support".to_string(),
            website_url: "https://example.com".to_string(),
            button_color: "#0b93f6".to_string(),
            position: "right".to_string(),
            tooltip_text: "Chat with us".to_string(),
            tooltip_display: "on_load".to_string(),
            custom_icon_file_id: None,
            notify_url: None,
            video_url: None,
            video_autoplay: false,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn channel(id: &str, channel_type: &str, value: &str, parent: Option<&str>, order: i32) -> Channel {
        Channel {
            id: id.to_string(),
            widget_id: "w1".to_string(),
            channel_type: channel_type.to_string(),
            value: value.to_string(),
            label: String::new(),
            parent_id: parent.map(String::from),
            sort_order: order,
            created_at: 0,
        }
    }

    #[test]
    fn test_config_orders_and_maps_channels() {
        let channels = vec![
            channel("c2", "email", "hi@example.com", None, 2),
            channel("c1", "whatsapp", "+1 555 0100", None, 1),
        ];
        let config = build_config(&widget(), &channels, "http://localhost:8080");
        let items = config["items"].as_array().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["type"], "whatsapp");
        assert_eq!(items[0]["href"], "https://wa.me/15550100");
        assert_eq!(items[0]["label"], "WhatsApp");
        assert_eq!(items[1]["href"], "mailto:hi@example.com");
    }

    #[test]
    fn test_config_nests_group_children() {
        let channels = vec![
            channel("g1", "group", "", None, 1),
            channel("c1", "telegram", "@acme", Some("g1"), 2),
            channel("c2", "phone", "+1 555 0100", Some("g1"), 1),
        ];
        let config = build_config(&widget(), &channels, "http://localhost:8080");
        let items = config["items"].as_array().unwrap();

        assert_eq!(items.len(), 1);
        let children = items[0]["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["href"], "tel:+15550100");
        assert_eq!(children[1]["href"], "https://t.me/acme");
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let channels = vec![channel("g1", "group", "", None, 1)];
        let config = build_config(&widget(), &channels, "http://localhost:8080");
        assert!(config["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_type_and_empty_value_are_dropped() {
        let channels = vec![
            channel("c1", "fax", "12345", None, 1),
            channel("c2", "link", "", None, 2),
        ];
        let config = build_config(&widget(), &channels, "http://localhost:8080");
        assert!(config["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_icon_url_points_at_file_content() {
        let mut w = widget();
        w.custom_icon_file_id = Some("f1".to_string());
        let config = build_config(&w, &[], "http://localhost:8080/");
        assert_eq!(
            config["iconUrl"],
            "http://localhost:8080/api/v1/files/f1/content"
        );
    }

    #[test]
    fn test_rendered_script_never_contains_script_close() {
        let mut w = widget();
        w.tooltip_text = "</script><script>alert(1)</script>".to_string();
        let channels = vec![channel("c1", "link", "https://example.com/a?b=1&c=2", None, 1)];

        let script = render_widget_script(&w, &channels, "http://localhost:8080");
        assert!(!script.contains("</script>"));
        assert!(!script.contains("<!--"));
        assert!(script.contains("\\u003c/script\\u003e"));
        assert!(!script.contains(CONFIG_PLACEHOLDER));
    }

    #[test]
    fn test_video_config_passthrough() {
        let mut w = widget();
        w.video_url = Some("https://cdn.example.com/hello.mp4".to_string());
        w.video_autoplay = true;
        let config = build_config(&w, &[], "http://localhost:8080");
        assert_eq!(config["video"]["autoplay"], true);
        assert_eq!(config["video"]["url"], "https://cdn.example.com/hello.mp4");
    }

    #[test]
    fn test_inactive_stub_is_comment_only() {
        let stub = render_inactive_stub("w1");
        assert!(stub.starts_with("/*"));
        assert!(stub.contains("w1"));
    }
}
