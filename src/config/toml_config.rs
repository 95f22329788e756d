use crate::core::aggregator::{
    DEFAULT_CONCURRENT_SUBREQUESTS, DEFAULT_OWNERS_PATH, DEFAULT_SUBREQUEST_TIMEOUT_MS,
    DEFAULT_VISITS_PATH,
};
use crate::core::ConfigProvider;
use crate::utils::error::{AggregatorError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    pub listen_addr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Upstream root only; a path prefix belongs in `owners_path`/`visits_path`.
    pub base_url: String,
    pub owners_path: Option<String>,
    pub visits_path: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AggregationConfig {
    pub subrequest_timeout_ms: Option<u64>,
    pub concurrent_subrequests: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AggregatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AggregatorError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UPSTREAM_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AggregatorError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn verbose(&self) -> bool {
        self.logging.verbose.unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn listen_addr(&self) -> &str {
        self.server
            .listen_addr
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_ADDR)
    }

    fn upstream_url(&self) -> &str {
        &self.upstream.base_url
    }

    fn upstream_headers(&self) -> &HashMap<String, String> {
        &self.upstream.headers
    }

    fn owners_path(&self) -> &str {
        self.upstream
            .owners_path
            .as_deref()
            .unwrap_or(DEFAULT_OWNERS_PATH)
    }

    fn visits_path(&self) -> &str {
        self.upstream
            .visits_path
            .as_deref()
            .unwrap_or(DEFAULT_VISITS_PATH)
    }

    fn subrequest_timeout_ms(&self) -> u64 {
        self.aggregation
            .subrequest_timeout_ms
            .unwrap_or(DEFAULT_SUBREQUEST_TIMEOUT_MS)
    }

    fn concurrent_subrequests(&self) -> usize {
        self.aggregation
            .concurrent_subrequests
            .unwrap_or(DEFAULT_CONCURRENT_SUBREQUESTS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        super::validate_provider(self)?;
        for (name, value) in &self.upstream.headers {
            validate_non_empty_string(&format!("upstream.headers.{}", name), value)?;
        }
        Ok(())
    }
}
