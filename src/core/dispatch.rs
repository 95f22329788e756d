use crate::core::aggregator::{AggregationSettings, OwnerAggregator};
use crate::core::owner_resource::OwnerResource;
use crate::core::response::{json_response, AggregateResponse};
use crate::core::SubrequestClient;
use crate::domain::model::iso_timestamp;
use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{any, get};
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub const OWNERS_ROUTE: &str = "/aggregate/owners";
pub const OWNER_ROUTE: &str = "/aggregate/owners/:id";
pub const HEALTH_ROUTE: &str = "/health";

pub struct AppState<C: SubrequestClient> {
    pub aggregator: Arc<OwnerAggregator<Arc<C>>>,
    pub owner_resource: Arc<OwnerResource<Arc<C>>>,
}

impl<C: SubrequestClient> AppState<C> {
    pub fn new(client: C, settings: AggregationSettings) -> Self {
        let client = Arc::new(client);
        Self {
            aggregator: Arc::new(OwnerAggregator::new(client.clone(), settings.clone())),
            owner_resource: Arc::new(OwnerResource::new(client, settings)),
        }
    }
}

impl<C: SubrequestClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            aggregator: self.aggregator.clone(),
            owner_resource: self.owner_resource.clone(),
        }
    }
}

pub fn build_router<C: SubrequestClient + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route(OWNERS_ROUTE, any(owners_collection_handler::<C>))
        .route(OWNER_ROUTE, any(owner_resource_handler::<C>))
        .route(HEALTH_ROUTE, get(health_handler))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn owners_collection_handler<C: SubrequestClient + 'static>(
    State(state): State<AppState<C>>,
    method: Method,
) -> AggregateResponse {
    if method != Method::GET {
        return AggregateResponse::method_not_allowed(&method);
    }

    match state.aggregator.aggregate_owners().await {
        Ok(owners) => AggregateResponse::Owners(owners),
        Err(e) => {
            tracing::error!("❌ Owner aggregation failed: {}", e);
            AggregateResponse::fatal(&e)
        }
    }
}

async fn owner_resource_handler<C: SubrequestClient + 'static>(
    State(state): State<AppState<C>>,
    method: Method,
    Path(owner_id): Path<String>,
) -> AggregateResponse {
    state.owner_resource.handle(&method, &owner_id).await
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "healthy".to_string(),
            timestamp: iso_timestamp(),
        },
    )
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        "{} {} -> {} in {}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
