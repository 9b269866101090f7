pub mod blog;
pub mod channel;
pub mod chat;
pub mod credits;
pub mod file;
pub mod user;
pub mod widget;
