use actix_web::HttpRequest;
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Per-client-IP rate limiter for the public (unauthenticated) endpoints.
pub struct IpRateLimiter {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
}

impl IpRateLimiter {
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(nonzero!(30u32)));
        IpRateLimiter {
            limiter: RateLimiter::keyed(quota),
        }
    }

    pub fn check(&self, key: &str) -> bool {
        self.limiter.check_key(&key.to_string()).is_ok()
    }
}

/// Best-effort client address for rate limiting keys.
pub fn client_ip(req: &HttpRequest) -> String {
    ip_key(
        req.connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown"),
    )
}

/// Reduce a peer address to its IP. Handles `ip:port` pairs including
/// bracketed IPv6; port-less forwarded addresses pass through unchanged.
fn ip_key(addr: &str) -> String {
    match SocketAddr::from_str(addr) {
        Ok(sock) => sock.ip().to_string(),
        Err(_) => addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_allows_within_quota() {
        let limiter = IpRateLimiter::per_minute(5);
        for _ in 0..5 {
            assert!(limiter.check("1.2.3.4"));
        }
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn test_limiter_keys_are_independent() {
        let limiter = IpRateLimiter::per_minute(1);
        assert!(limiter.check("1.1.1.1"));
        assert!(!limiter.check("1.1.1.1"));
        assert!(limiter.check("2.2.2.2"));
    }

    #[test]
    fn test_ip_key_strips_port() {
        assert_eq!(ip_key("1.2.3.4:5678"), "1.2.3.4");
        assert_eq!(ip_key("1.2.3.4"), "1.2.3.4");
        assert_eq!(ip_key("unknown"), "unknown");
    }

    #[test]
    fn test_ip_key_keeps_ipv6_clients_distinct() {
        let a = ip_key("[2001:db8::1]:40000");
        let b = ip_key("[2001:db8:ffff::2]:40001");
        assert_eq!(a, "2001:db8::1");
        assert_ne!(a, b);
    }
}
