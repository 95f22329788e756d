use crate::core::aggregator::{fetch_with_deadline, AggregationSettings};
use crate::core::response::AggregateResponse;
use crate::core::SubrequestClient;
use axum::http::Method;

/// Method-dispatching facade over one owner id.
///
/// `PUT` answers with a fixed placeholder and performs no upstream write; the
/// update contract is not yet specified.
pub struct OwnerResource<C: SubrequestClient> {
    client: C,
    settings: AggregationSettings,
}

impl<C: SubrequestClient> OwnerResource<C> {
    pub fn new(client: C, settings: AggregationSettings) -> Self {
        Self { client, settings }
    }

    pub async fn handle(&self, method: &Method, owner_id: &str) -> AggregateResponse {
        match *method {
            Method::GET => self.get(owner_id).await,
            Method::PUT => {
                tracing::debug!("✏️ Placeholder update for owner {}", owner_id);
                AggregateResponse::Placeholder
            }
            _ => {
                tracing::warn!("🚫 Rejected {} for owner {}", method, owner_id);
                AggregateResponse::method_not_allowed(method)
            }
        }
    }

    async fn get(&self, owner_id: &str) -> AggregateResponse {
        let path = match self.settings.owner_path_for(owner_id) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("🚫 {}", e);
                return AggregateResponse::bad_request(&e);
            }
        };

        match fetch_with_deadline(&self.client, &path, self.settings.subrequest_timeout).await {
            Ok(response) => {
                tracing::debug!("📡 Owner {} settled with status {}", owner_id, response.status);
                AggregateResponse::Acknowledged
            }
            Err(e) => {
                tracing::error!("❌ Owner {} fetch failed: {}", owner_id, e);
                AggregateResponse::fatal(&e)
            }
        }
    }
}
