use std::env;

/// Application configuration, loaded once from the environment at startup.
///
/// Tokens are issued by the external identity platform; this service only
/// needs the shared signing secret to verify them.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,

    pub jwt_secret: String,

    pub cors_allow_origin: String,

    /// Public base URL of this service, used when rendering embed snippets.
    pub public_base_url: String,

    pub enable_redis: bool,
    pub redis_url: String,

    /// Seconds a rendered embed script stays cached.
    pub embed_cache_ttl: u64,

    /// Credits granted when a user's balance row is first created.
    pub signup_credit_grant: i64,

    /// Directory where uploaded widget icons are stored.
    pub upload_dir: String,
    /// Maximum accepted icon upload size in bytes.
    pub max_upload_size: usize,

    /// Secret used to sign outgoing webhook payloads.
    pub webhook_secret: String,

    /// Requests per minute allowed per client IP on public chat endpoints.
    pub chat_rate_limit_per_minute: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL").map_err(|_| {
                anyhow::anyhow!("DATABASE_URL environment variable is required")
            })?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            enable_redis: env::var("ENABLE_REDIS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            embed_cache_ttl: env::var("EMBED_CACHE_TTL")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
            signup_credit_grant: env::var("SIGNUP_CREDIT_GRANT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./data/uploads".to_string()),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "2097152".to_string())
                .parse()?,
            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),
            chat_rate_limit_per_minute: env::var("CHAT_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        })
    }
}
