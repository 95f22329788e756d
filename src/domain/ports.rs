use crate::domain::model::SubrequestResponse;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Fetches an upstream resource by path on behalf of an inbound request.
#[async_trait]
pub trait SubrequestClient: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<SubrequestResponse>;
}

#[async_trait]
impl<T: SubrequestClient + ?Sized> SubrequestClient for Arc<T> {
    async fn fetch(&self, path: &str) -> Result<SubrequestResponse> {
        (**self).fetch(path).await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn listen_addr(&self) -> &str;
    fn upstream_url(&self) -> &str;
    fn upstream_headers(&self) -> &HashMap<String, String>;
    fn owners_path(&self) -> &str;
    fn visits_path(&self) -> &str;
    fn subrequest_timeout_ms(&self) -> u64;
    fn concurrent_subrequests(&self) -> usize;
}
