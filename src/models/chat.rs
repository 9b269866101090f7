use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use validator::Validate;

/// Chat session lifecycle. Transitions are one-directional: a session starts
/// `active` and moves to exactly one terminal state, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
    Abandoned,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
            SessionStatus::Abandoned => "abandoned",
            SessionStatus::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(self, SessionStatus::Active) && next.is_terminal()
    }
}

impl FromStr for SessionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            "abandoned" => Ok(SessionStatus::Abandoned),
            "closed" => Ok(SessionStatus::Closed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Visitor,
    Agent,
}

impl MessageSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSender::Visitor => "visitor",
            MessageSender::Agent => "agent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatSession {
    pub id: String,
    pub widget_id: String,
    pub visitor_id: String,
    pub visitor_name: Option<String>,
    pub status: String,
    pub started_at: i64,
    pub ended_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub sender: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionForm {
    #[validate(length(min = 1))]
    pub widget_id: String,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub visitor_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MessageForm {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionStatusForm {
    pub status: SessionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_reaches_every_terminal_state() {
        for next in [
            SessionStatus::Ended,
            SessionStatus::Abandoned,
            SessionStatus::Closed,
        ] {
            assert!(SessionStatus::Active.can_transition_to(next));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [
            SessionStatus::Ended,
            SessionStatus::Abandoned,
            SessionStatus::Closed,
        ] {
            for next in [
                SessionStatus::Active,
                SessionStatus::Ended,
                SessionStatus::Abandoned,
                SessionStatus::Closed,
            ] {
                assert!(!from.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_no_transition_back_to_active() {
        assert!(!SessionStatus::Active.can_transition_to(SessionStatus::Active));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(SessionStatus::from_str("active"), Ok(SessionStatus::Active));
        assert_eq!(SessionStatus::from_str("closed"), Ok(SessionStatus::Closed));
        assert!(SessionStatus::from_str("paused").is_err());
    }
}
