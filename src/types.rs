use crate::rate_limit::IpRateLimiter;
use crate::store::{CallStore, LoadStore};
use crate::validation::ValidationRules;

use std::sync::Arc;

pub struct AppState {
    /// Expected `X-API-Key` value; `None` when the server was started without one.
    pub api_key: Option<String>,
    pub rules: ValidationRules,
    pub loads: Arc<dyn LoadStore>,
    pub calls: Arc<dyn CallStore>,
    /// Shared by every rate-limited route.
    pub limiter: IpRateLimiter,
}
