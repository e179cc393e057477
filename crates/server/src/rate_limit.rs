use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_types::{AppError, RateLimitConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const ANONYMOUS_KEY: &str = "anonymous";
/// Client count above which idle entries are swept on the next check.
const PRUNE_THRESHOLD: usize = 10_000;

/// Sliding window rate limit state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    inner: Arc<Mutex<RateLimitInner>>,
}

struct RateLimitInner {
    /// Map from client key -> list of request timestamps.
    requests: HashMap<String, Vec<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitState {
    /// Create rate limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimitInner {
                requests: HashMap::new(),
                max_requests,
                window,
            })),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    fn lock(&self) -> MutexGuard<'_, RateLimitInner> {
        // A panic while holding the lock leaves only timestamps behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a request from `key`. Returns false once the window is full.
    pub fn check(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let now = Instant::now();
        let window = inner.window;
        let max = inner.max_requests as usize;
        if inner.requests.len() > PRUNE_THRESHOLD {
            inner.prune(now);
        }

        let timestamps = inner.requests.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if timestamps.len() >= max {
            return false;
        }
        timestamps.push(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.lock().requests.len()
    }
}

impl RateLimitInner {
    /// Drop clients with no request inside the window.
    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.requests
            .retain(|_, ts| ts.iter().any(|t| now.duration_since(*t) < window));
    }
}

/// First hop of `x-forwarded-for`, or a shared anonymous bucket.
pub fn client_key(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_KEY)
        .to_string()
}

/// Axum middleware enforcing the per-client window.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(request.headers());
    if !state.check(&key) {
        tracing::warn!(client = %key, "rate limit exceeded");
        return AppError::rate_limited("تم تجاوز عدد الطلبات المسموح، يرجى المحاولة لاحقاً")
            .into_response();
    }
    next.run(request).await
}
