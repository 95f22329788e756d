use crate::adapters::HttpSubrequestClient;
use crate::core::aggregator::AggregationSettings;
use crate::core::dispatch::{build_router, AppState};
use crate::core::ConfigProvider;
use crate::utils::error::{AggregatorError, Result};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub struct AggregatorServer {
    listen_addr: String,
    router: Router,
}

impl AggregatorServer {
    pub fn new(listen_addr: impl Into<String>, router: Router) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            router,
        }
    }

    /// Wires the reqwest-backed subrequest client into the gateway router.
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client =
            HttpSubrequestClient::with_headers(config.upstream_url(), config.upstream_headers())?;
        let settings = AggregationSettings::from_config(config);

        tracing::info!(
            "🔧 Upstream {} (owners: {}, visits: {}, timeout: {}ms, concurrency: {})",
            config.upstream_url(),
            settings.owners_path,
            settings.visits_path,
            config.subrequest_timeout_ms(),
            settings.concurrent_subrequests
        );

        Ok(Self::new(
            config.listen_addr(),
            build_router(AppState::new(client, settings)),
        ))
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        Ok(listener)
    }

    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: SocketAddr = listener.local_addr()?;
        tracing::info!("🚀 Owners aggregator listening on {}", local_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AggregatorError::ServerError {
                message: e.to_string(),
            })?;

        tracing::info!("👋 Owners aggregator stopped");
        Ok(())
    }

    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal()).await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
