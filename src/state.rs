use std::sync::Arc;

use crate::permissions::{InMemoryDirectory, PermissionChecker};
use crate::rate_limit::{RateLimitConfig, RateLimitStore};

// app's shared state
pub struct AppState {
    pub rate_limiter: Arc<RateLimitStore>, // behind /api/rate-limit/*, callers pick the keys
    pub api_limiter: Arc<RateLimitStore>,  // /api/* middleware only, keyed by client
    pub default_limit: RateLimitConfig,    // applied to /api/* and checks without explicit config
    pub trust_proxy: bool,                 // read x-forwarded-for / x-real-ip for the client
    pub directory: Arc<InMemoryDirectory>, // mutated by the role/permission routes
    pub permissions: PermissionChecker,
}

impl AppState {
    pub fn new(
        rate_limiter: Arc<RateLimitStore>,
        api_limiter: Arc<RateLimitStore>,
        default_limit: RateLimitConfig,
        trust_proxy: bool,
        directory: Arc<InMemoryDirectory>,
        cache_permissions: bool,
    ) -> Arc<Self> {
        let permissions = if cache_permissions {
            PermissionChecker::with_cache(directory.clone())
        } else {
            PermissionChecker::new(directory.clone())
        };

        Arc::new(Self {
            rate_limiter,
            api_limiter,
            default_limit,
            trust_proxy,
            directory,
            permissions,
        })
    }
}
