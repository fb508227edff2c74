use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::rate_limit::RateLimitConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "newsroom-gate")]
#[command(about = "Rate limiting and permission checks for the newsroom platform")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Default max requests per window for API callers
    #[arg(long, default_value_t = 60)]
    pub rate_limit: u32,

    // Default rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // How often expired windows are swept, in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    // JSON file with roles -> permissions and users -> roles
    #[arg(short, long)]
    pub grants: Option<PathBuf>,

    // Take the client from x-forwarded-for / x-real-ip (only behind a proxy that sets them)
    #[arg(long)]
    pub trust_proxy: bool,

    // Recompute every permission check instead of memoizing
    #[arg(long)]
    pub no_permission_cache: bool,
}

impl Args {
    pub fn default_rate_limit(&self) -> Result<RateLimitConfig> {
        RateLimitConfig::new(self.rate_window.saturating_mul(1000), self.rate_limit)
    }

    pub fn sweep_every(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}
