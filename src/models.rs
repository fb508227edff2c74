use serde::{Deserialize, Serialize};

// POST /api/rate-limit/check
// window/max fall back to the server defaults when left out
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRequest {
    pub identifier: String,
    #[serde(default)]
    pub window_ms: Option<u64>,
    #[serde(default)]
    pub max_requests: Option<u32>,
}

// POST /api/rate-limit/login
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LoginRateLimitRequest {
    pub identifier: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub user_id: Option<String>,
    pub permission: String,
    pub allowed: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermissions {
    pub user_id: String,
    pub permissions: Vec<String>, // sorted
}

// Result of a role/permission mutation
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct MutationResponse {
    pub changed: bool,
}
