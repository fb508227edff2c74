use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, register_counter, register_gauge};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("newsroom_gate_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "newsroom_gate_rate_limited_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref PERMISSION_CHECKS: Counter = register_counter!(
        "newsroom_gate_permission_checks_total",
        "Total permission checks"
    )
    .unwrap();
    pub static ref PERMISSION_DENIALS: Counter = register_counter!(
        "newsroom_gate_permission_denials_total",
        "Permission checks that returned false"
    )
    .unwrap();
    pub static ref PERMISSION_CACHE_HITS: Counter = register_counter!(
        "newsroom_gate_permission_cache_hits_total",
        "Permission checks answered from cache"
    )
    .unwrap();
    pub static ref RATE_LIMIT_STORE_SIZE: Gauge = register_gauge!(
        "newsroom_gate_rate_limit_entries",
        "Current number of rate limit windows held in memory"
    )
    .unwrap();
}
