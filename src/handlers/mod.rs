mod health;
mod metrics;
mod permissions;
mod rate_limit;
mod roles;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use permissions::{effective_permissions_handler, my_permission_handler, user_permission_handler};
pub use rate_limit::{check_handler, login_check_handler};
pub use roles::{assign_role_handler, grant_permission_handler, revoke_permission_handler, revoke_role_handler};
