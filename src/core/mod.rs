pub mod aggregator;
pub mod dispatch;
pub mod owner_resource;
pub mod response;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{AggregatedOwnerList, EnrichedOwner, Owner, Visit};
pub use crate::domain::ports::{ConfigProvider, SubrequestClient};
pub use crate::utils::error::Result;
