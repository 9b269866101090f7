pub mod auth;
pub mod blog;
pub mod channel;
pub mod chat;
pub mod credits;
pub mod file;
pub mod user;
pub mod widget;

pub use user::User;

/// Distinguishes "field absent" from "field set to null" for PATCH-style
/// updates of nullable columns.
pub mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(de).map(Some)
    }
}
