//! Fixed-window rate limiter middleware for the chat proxy.
//!
//! Every forwarded message costs an outbound flow run, so the proxy caps the
//! number of requests it accepts per window across all clients.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Extension, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ErrorBody;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u64,
}

/// Shared state for the rate limiter.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_per_window: u64,
    period: Duration,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    /// Allow `max_per_sec` requests per one-second window.
    pub fn per_second(max_per_sec: u64) -> Self {
        Self::new(max_per_sec, Duration::from_secs(1))
    }

    pub fn new(max_per_window: u64, period: Duration) -> Self {
        Self {
            max_per_window,
            period,
            window: Arc::new(Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Try to acquire a permit. Returns true if the request is allowed.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut window) = self.window.lock() else {
            return true;
        };
        if window.started.elapsed() >= self.period {
            window.started = Instant::now();
            window.count = 0;
        }
        if window.count < self.max_per_window {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

/// Axum middleware that enforces the rate limit.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        return next.run(req).await;
    }
    tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorBody {
            error: "too_many_requests".to_string(),
            message: "Rate limit exceeded".to_string(),
        }),
    )
        .into_response()
}
