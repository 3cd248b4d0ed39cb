//! Gateway Rate Limiting Module
//!
//! Fixed-window counter per client, applied to the analyze endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Entries older than this many windows are dropped on the next sweep.
const STALE_WINDOWS: u32 = 2;
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Clone)]
pub struct RateLimiter {
    // client -> (request_count, window_start)
    limits: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimiter {
    /// `max_requests == 0` disables limiting.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Check if a request from the given client is allowed, counting it if so.
    pub async fn check_limit(&self, client: &str) -> bool {
        if self.max_requests == 0 {
            return true;
        }
        let mut limits = self.limits.write().await;
        let now = Instant::now();

        if limits.len() > SWEEP_THRESHOLD {
            let stale = self.window * STALE_WINDOWS;
            limits.retain(|_, (_, start)| now.duration_since(*start) <= stale);
        }

        let state = limits.entry(client.to_string()).or_insert((0, now));

        if now.duration_since(state.1) >= self.window {
            state.0 = 1;
            state.1 = now;
            debug!(client, "Rate limit window reset");
            true
        } else if state.0 >= self.max_requests {
            warn!(client, max = self.max_requests, "Rate limit exceeded");
            false
        } else {
            state.0 += 1;
            debug!(client, count = state.0, max = self.max_requests, "Rate limit OK");
            true
        }
    }

    /// Seconds until the window for `client` resets.
    pub async fn retry_after(&self, client: &str) -> u64 {
        let limits = self.limits.read().await;
        limits
            .get(client)
            .map(|(_, start)| self.window.saturating_sub(start.elapsed()).as_secs().max(1))
            .unwrap_or(1)
    }
}

/// Identify the caller: first `X-Forwarded-For` hop, else the peer IP.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn blocks_after_max_requests() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check_limit("10.0.0.1").await);
        assert!(limiter.check_limit("10.0.0.1").await);
        assert!(!limiter.check_limit("10.0.0.1").await);
        assert!(limiter.check_limit("10.0.0.2").await);
        assert!(limiter.retry_after("10.0.0.1").await >= 1);
    }

    #[tokio::test]
    async fn window_expiry_resets_count() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check_limit("a").await);
        assert!(!limiter.check_limit("a").await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check_limit("a").await);
    }

    #[tokio::test]
    async fn zero_disables_limit() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        for _ in 0..50 {
            assert!(limiter.check_limit("a").await);
        }
    }

    #[tokio::test]
    async fn zero_max_requests_from_config_disables_limit() {
        let raw = plastiscan_config::parse_config(
            "analysis:\n  provider: mock\nserver:\n  rateLimit:\n    maxRequests: 0\n",
        )
        .unwrap();
        let config = plastiscan_config::apply_all_defaults(raw);
        let report = plastiscan_config::validate(&config);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.path == "server.rateLimit.maxRequests" && w.message.contains("disabled")));

        let settings = plastiscan_config::Settings::from_config(&config);
        let limiter = RateLimiter::new(settings.rate_limit_max, settings.rate_limit_window);
        for _ in 0..50 {
            assert!(limiter.check_limit("10.0.0.9").await);
        }
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "192.168.1.5:4000".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "192.168.1.5");
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
        assert_eq!(client_key(&HeaderMap::new(), None), "unknown");
    }
}
