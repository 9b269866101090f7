pub mod auth;
pub mod misc;
pub mod rate_limit;
pub mod time;
pub mod webhook;
