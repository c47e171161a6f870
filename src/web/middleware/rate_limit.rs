//! Throttling middleware for credential-guessing routes.
//!
//! Login and device verification each get their own per-client allowance.
//! Clients are keyed by peer address; forwarding headers are only honoured
//! when the deployment says a trusted proxy sets them.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::web::error::ApiError;

/// Rate limiter keyed by client IP.
pub type IpRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Throttled route family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttled {
    Login,
    Verification,
}

/// State for login and verification rate limiting.
#[derive(Clone)]
pub struct RateLimitState {
    login: Arc<IpRateLimiter>,
    verification: Arc<IpRateLimiter>,
    /// Attempts allowed per window.
    login_rate_limit: u32,
    login_window: Duration,
    trust_forwarded_headers: bool,
}

impl RateLimitState {
    /// Allow `limit` attempts per `window_secs` for each client IP.
    ///
    /// The full allowance is available as a burst and refills evenly across
    /// the window.
    pub fn new(limit: u32, window_secs: u64) -> Self {
        let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        let window = Duration::from_secs(window_secs);
        let quota = Quota::with_period(window / burst.get())
            .map(|q| q.allow_burst(burst))
            .unwrap_or_else(|| Quota::per_second(burst));

        Self {
            login: Arc::new(RateLimiter::keyed(quota)),
            verification: Arc::new(RateLimiter::keyed(quota)),
            login_rate_limit: burst.get(),
            login_window: window,
            trust_forwarded_headers: false,
        }
    }

    /// Key clients on `X-Forwarded-For`/`X-Real-IP` when present.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    fn limiter(&self, route: Throttled) -> &IpRateLimiter {
        match route {
            Throttled::Login => &self.login,
            Throttled::Verification => &self.verification,
        }
    }

    /// Check if an attempt on `route` is allowed for the given IP.
    pub fn check(&self, route: Throttled, ip: &str) -> bool {
        self.limiter(route).check_key(&ip.to_string()).is_ok()
    }

    /// Check if a login attempt is allowed for the given IP.
    pub fn check_login(&self, ip: &str) -> bool {
        self.check(Throttled::Login, ip)
    }

    /// Forget clients whose allowance has fully refilled.
    pub fn cleanup(&self) {
        self.login.retain_recent();
        self.verification.retain_recent();
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await; // Every 5 minutes
                self.cleanup();
            }
        });
    }

    /// Throttling key for a request.
    fn client_key(&self, req: &Request<Body>) -> String {
        if self.trust_forwarded_headers {
            if let Some(ip) = forwarded_ip(req) {
                return ip;
            }
        }

        if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            return addr.ip().to_string();
        }

        "unknown".to_string()
    }
}

/// Client IP as reported by a reverse proxy.
fn forwarded_ip(req: &Request<Body>) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        // First hop is the original client
        if let Some(ip) = forwarded.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    req.headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

async fn throttle(
    state: Arc<RateLimitState>,
    route: Throttled,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = state.client_key(&req);

    if !state.check(route, &ip) {
        tracing::warn!(
            ip = %ip,
            route = ?route,
            limit = state.login_rate_limit,
            window_secs = state.login_window.as_secs(),
            "Rate limit exceeded"
        );
        let message = match route {
            Throttled::Login => "Too many login attempts. Please try again later.",
            Throttled::Verification => "Too many verification attempts. Please try again later.",
        };
        return ApiError::too_many_requests(message).into_response();
    }

    next.run(req).await
}

/// Rate limiting middleware for the login endpoint.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    throttle(state, Throttled::Login, req, next).await
}

/// Rate limiting middleware for the device verification endpoints.
pub async fn verification_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    throttle(state, Throttled::Verification, req, next).await
}
