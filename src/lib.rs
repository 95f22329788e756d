pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::HttpSubrequestClient;
pub use crate::core::{
    aggregator::{AggregationSettings, OwnerAggregator},
    dispatch::{build_router, AppState},
    owner_resource::OwnerResource,
    response::AggregateResponse,
    server::AggregatorServer,
};
pub use domain::ports::{ConfigProvider, SubrequestClient};
pub use utils::error::{AggregatorError, Result};
