#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_base_url, validate_path_template, validate_range, validate_socket_addr,
    validate_upstream_path,
};

pub const MAX_SUBREQUEST_TIMEOUT_MS: u64 = 600_000;
pub const MAX_CONCURRENT_SUBREQUESTS: usize = 1_024;

/// Checks shared by every configuration source.
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_socket_addr("listen_addr", config.listen_addr())?;
    validate_base_url("upstream_url", config.upstream_url())?;
    validate_upstream_path("owners_path", config.owners_path())?;
    validate_path_template("visits_path", config.visits_path())?;
    validate_range(
        "subrequest_timeout_ms",
        config.subrequest_timeout_ms(),
        1,
        MAX_SUBREQUEST_TIMEOUT_MS,
    )?;
    validate_range(
        "concurrent_subrequests",
        config.concurrent_subrequests(),
        1,
        MAX_CONCURRENT_SUBREQUESTS,
    )?;
    Ok(())
}
