use crate::consts::{RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW_SECS};
use crate::error::AppError;
use crate::types::AppState;

use axum::{
    extract::{ConnectInfo, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use http::Request;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Requests allowed per client address over a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: NonZeroU32,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: NonZeroU32::new(RATE_LIMIT_MAX_REQUESTS).unwrap_or(NonZeroU32::MIN),
            window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
        }
    }
}

impl RateLimit {
    /// The whole allowance is available as a burst and refills evenly over
    /// the window.
    pub fn limiter(&self) -> IpRateLimiter {
        let quota = Quota::with_period(self.window / self.max_requests.get())
            .unwrap_or_else(|| Quota::per_second(self.max_requests))
            .allow_burst(self.max_requests);
        RateLimiter::keyed(quota)
    }
}

/// Rejects clients that exhausted their allowance with a 429.
pub async fn limit_by_ip<B>(
    State(app_state): State<Arc<AppState>>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    let ip = client_ip(&request);
    match app_state.limiter.check_key(&ip) {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let retry_after = not_until.wait_time_from(DefaultClock::default().now());
            warn!(%ip, path = %request.uri().path(), "rate limit exceeded");
            AppError::RateLimited { retry_after }.into_response()
        }
    }
}

/// Peer address of the connection. Requests served without connection info
/// (e.g. in-process) share the unspecified address.
fn client_ip<B>(request: &Request<B>) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
