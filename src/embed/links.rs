use crate::models::channel::ChannelType;

/// Map a channel to the href its menu entry opens.
///
/// `Group` channels have no target of their own and return `None`; unknown
/// link-like channels pass their value through, gaining an `https://` scheme
/// when none is present.
pub fn channel_href(channel_type: ChannelType, value: &str) -> Option<String> {
    let value = value.trim();
    if channel_type == ChannelType::Group {
        return None;
    }
    if value.is_empty() {
        return None;
    }

    let href = match channel_type {
        ChannelType::Whatsapp => {
            let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                return None;
            }
            format!("https://wa.me/{}", digits)
        }
        ChannelType::Telegram => {
            format!("https://t.me/{}", value.trim_start_matches('@'))
        }
        ChannelType::Email => format!("mailto:{}", value),
        ChannelType::Phone => {
            let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            format!("tel:{}", compact)
        }
        ChannelType::Group => unreachable!(),
        _ => {
            if value.contains("://") {
                value.to_string()
            } else {
                format!("https://{}", value)
            }
        }
    };

    Some(href)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_keeps_digits_only() {
        assert_eq!(
            channel_href(ChannelType::Whatsapp, "+49 (170) 123-4567"),
            Some("https://wa.me/491701234567".to_string())
        );
    }

    #[test]
    fn test_whatsapp_without_digits_is_dropped() {
        assert_eq!(channel_href(ChannelType::Whatsapp, "call me"), None);
    }

    #[test]
    fn test_telegram_strips_handle_prefix() {
        assert_eq!(
            channel_href(ChannelType::Telegram, "@support"),
            Some("https://t.me/support".to_string())
        );
        assert_eq!(
            channel_href(ChannelType::Telegram, "support"),
            Some("https://t.me/support".to_string())
        );
    }

    #[test]
    fn test_email_and_phone_schemes() {
        assert_eq!(
            channel_href(ChannelType::Email, "help@example.com"),
            Some("mailto:help@example.com".to_string())
        );
        assert_eq!(
            channel_href(ChannelType::Phone, "+1 555 0100"),
            Some("tel:+15550100".to_string())
        );
    }

    #[test]
    fn test_link_passthrough_and_scheme_default() {
        assert_eq!(
            channel_href(ChannelType::Link, "https://example.com/contact"),
            Some("https://example.com/contact".to_string())
        );
        assert_eq!(
            channel_href(ChannelType::Instagram, "instagram.com/acme"),
            Some("https://instagram.com/acme".to_string())
        );
    }

    #[test]
    fn test_group_and_empty_have_no_href() {
        assert_eq!(channel_href(ChannelType::Group, "anything"), None);
        assert_eq!(channel_href(ChannelType::Link, "   "), None);
    }
}
