use crate::core::SubrequestClient;
use crate::domain::model::SubrequestResponse;
use crate::utils::error::{AggregatorError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone)]
enum Canned {
    Respond(SubrequestResponse),
    RespondAfter(Duration, SubrequestResponse),
    Fail,
}

/// In-memory upstream. Unknown paths answer 404.
#[derive(Clone, Default)]
pub(crate) struct MockSubrequestClient {
    routes: HashMap<String, Canned>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

/// Counts one outstanding fetch until dropped, including on cancellation.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockSubrequestClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_body(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            path.to_string(),
            Canned::Respond(SubrequestResponse::new(status, body)),
        );
        self
    }

    pub(crate) fn with_json(self, path: &str, status: u16, body: serde_json::Value) -> Self {
        self.with_body(path, status, &body.to_string())
    }

    pub(crate) fn with_delayed_json(
        mut self,
        path: &str,
        delay: Duration,
        status: u16,
        body: serde_json::Value,
    ) -> Self {
        self.routes.insert(
            path.to_string(),
            Canned::RespondAfter(delay, SubrequestResponse::new(status, body.to_string())),
        );
        self
    }

    pub(crate) fn with_failure(mut self, path: &str) -> Self {
        self.routes.insert(path.to_string(), Canned::Fail);
        self
    }

    pub(crate) async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// Highest number of fetches that were outstanding at the same time.
    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubrequestClient for MockSubrequestClient {
    async fn fetch(&self, path: &str) -> Result<SubrequestResponse> {
        self.calls.lock().await.push(path.to_string());
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(outstanding, Ordering::SeqCst);
        let _in_flight = InFlight(self.in_flight.clone());

        match self.routes.get(path).cloned() {
            Some(Canned::Respond(response)) => Ok(response),
            Some(Canned::RespondAfter(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Canned::Fail) => Err(AggregatorError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("connection refused: {}", path),
            ))),
            None => Ok(SubrequestResponse::new(404, "")),
        }
    }
}
