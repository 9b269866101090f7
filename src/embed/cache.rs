use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use deadpool_redis::redis::AsyncCommands;

/// Cache for rendered embed scripts, keyed by widget id.
///
/// Uses Redis when configured so multiple instances share entries; falls
/// back to an in-process TTL map otherwise. Cache failures degrade to a
/// re-render, never to an error.
pub struct EmbedCache {
    redis: Option<deadpool_redis::Pool>,
    ttl: Duration,
    memory: Mutex<HashMap<String, (String, Instant)>>,
}

impl EmbedCache {
    pub fn new(redis: Option<deadpool_redis::Pool>, ttl_secs: u64) -> Self {
        EmbedCache {
            redis,
            ttl: Duration::from_secs(ttl_secs),
            memory: Mutex::new(HashMap::new()),
        }
    }

    fn key(widget_id: &str) -> String {
        format!("embed:script:{}", widget_id)
    }

    pub async fn get(&self, widget_id: &str) -> Option<String> {
        if let Some(ref pool) = self.redis {
            match pool.get().await {
                Ok(mut conn) => match conn.get::<_, Option<String>>(Self::key(widget_id)).await {
                    Ok(value) => return value,
                    Err(e) => tracing::warn!("Embed cache read failed: {}", e),
                },
                Err(e) => tracing::warn!("Redis pool unavailable: {}", e),
            }
            return None;
        }

        let mut memory = self.memory.lock().unwrap();
        match memory.get(widget_id) {
            Some((value, stored_at)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                memory.remove(widget_id);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, widget_id: &str, script: &str) {
        if let Some(ref pool) = self.redis {
            match pool.get().await {
                Ok(mut conn) => {
                    if let Err(e) = conn
                        .set_ex::<_, _, ()>(Self::key(widget_id), script, self.ttl.as_secs())
                        .await
                    {
                        tracing::warn!("Embed cache write failed: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Redis pool unavailable: {}", e),
            }
            return;
        }

        self.memory
            .lock()
            .unwrap()
            .insert(widget_id.to_string(), (script.to_string(), Instant::now()));
    }

    /// Drop the cached script after any widget or channel mutation.
    pub async fn invalidate(&self, widget_id: &str) {
        if let Some(ref pool) = self.redis {
            match pool.get().await {
                Ok(mut conn) => {
                    if let Err(e) = conn.del::<_, ()>(Self::key(widget_id)).await {
                        tracing::warn!("Embed cache invalidation failed: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Redis pool unavailable: {}", e),
            }
            return;
        }

        self.memory.lock().unwrap().remove(widget_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_memory_cache_roundtrip() {
        let cache = EmbedCache::new(None, 60);
        assert_eq!(cache.get("w1").await, None);

        cache.put("w1", "var x = 1;").await;
        assert_eq!(cache.get("w1").await.as_deref(), Some("var x = 1;"));

        cache.invalidate("w1").await;
        assert_eq!(cache.get("w1").await, None);
    }

    #[actix_web::test]
    async fn test_memory_cache_expires() {
        let cache = EmbedCache::new(None, 0);
        cache.put("w1", "var x = 1;").await;
        assert_eq!(cache.get("w1").await, None);
    }
}
