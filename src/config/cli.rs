use crate::core::aggregator::{
    DEFAULT_CONCURRENT_SUBREQUESTS, DEFAULT_OWNERS_PATH, DEFAULT_SUBREQUEST_TIMEOUT_MS,
    DEFAULT_VISITS_PATH,
};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "owners-aggregator")]
#[command(about = "Scatter-gather gateway that enriches owners with their pets' visits")]
pub struct CliConfig {
    #[arg(long, env = "AGGREGATOR_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    #[arg(
        long,
        env = "AGGREGATOR_UPSTREAM_URL",
        default_value = "http://localhost:8081",
        help = "Upstream root (scheme, host, port); path prefixes go in --owners-path and --visits-path"
    )]
    pub upstream_url: String,

    #[arg(long, default_value = DEFAULT_OWNERS_PATH)]
    pub owners_path: String,

    #[arg(long, default_value = DEFAULT_VISITS_PATH, help = "Visits path, {petId} is replaced per pet")]
    pub visits_path: String,

    #[arg(long, default_value_t = DEFAULT_SUBREQUEST_TIMEOUT_MS)]
    pub subrequest_timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_CONCURRENT_SUBREQUESTS)]
    pub concurrent_subrequests: usize,

    #[arg(long, help = "TOML configuration file; replaces the options above")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(skip)]
    pub upstream_headers: HashMap<String, String>,
}

impl ConfigProvider for CliConfig {
    fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    fn upstream_headers(&self) -> &HashMap<String, String> {
        &self.upstream_headers
    }

    fn owners_path(&self) -> &str {
        &self.owners_path
    }

    fn visits_path(&self) -> &str {
        &self.visits_path
    }

    fn subrequest_timeout_ms(&self) -> u64 {
        self.subrequest_timeout_ms
    }

    fn concurrent_subrequests(&self) -> usize {
        self.concurrent_subrequests
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        super::validate_provider(self)
    }
}
