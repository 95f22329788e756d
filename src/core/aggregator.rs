use crate::core::{ConfigProvider, SubrequestClient};
use crate::domain::model::{
    parse_owner_collection, parse_visits, AggregatedOwnerList, EnrichedOwner, Owner, PetId,
    SubrequestResponse, Visit,
};
use crate::utils::error::{AggregatorError, Result};
use crate::utils::validation::{validate_owner_id, PET_ID_PLACEHOLDER};
use futures::future::join_all;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const DEFAULT_OWNERS_PATH: &str = "/owners";
pub const DEFAULT_VISITS_PATH: &str = "/visits/pets/{petId}";
pub const DEFAULT_SUBREQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CONCURRENT_SUBREQUESTS: usize = 16;

#[derive(Debug, Clone)]
pub struct AggregationSettings {
    pub owners_path: String,
    pub visits_path: String,
    pub subrequest_timeout: Duration,
    pub concurrent_subrequests: usize,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            owners_path: DEFAULT_OWNERS_PATH.to_string(),
            visits_path: DEFAULT_VISITS_PATH.to_string(),
            subrequest_timeout: Duration::from_millis(DEFAULT_SUBREQUEST_TIMEOUT_MS),
            concurrent_subrequests: DEFAULT_CONCURRENT_SUBREQUESTS,
        }
    }
}

impl AggregationSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            owners_path: config.owners_path().to_string(),
            visits_path: config.visits_path().to_string(),
            subrequest_timeout: Duration::from_millis(config.subrequest_timeout_ms()),
            concurrent_subrequests: config.concurrent_subrequests().max(1),
        }
    }

    pub fn visits_path_for(&self, pet_id: &PetId) -> String {
        self.visits_path
            .replace(PET_ID_PLACEHOLDER, &pet_id.to_string())
    }

    /// Path of a single owner under `owners_path`. Ids that would resolve
    /// outside that collection are refused.
    pub fn owner_path_for(&self, owner_id: &str) -> Result<String> {
        validate_owner_id(owner_id)?;
        Ok(format!("{}/{}", self.owners_path.trim_end_matches('/'), owner_id))
    }
}

/// Issues `path` through `client`, failing with `SubrequestTimeout` once `deadline` passes.
pub(crate) async fn fetch_with_deadline<C: SubrequestClient + ?Sized>(
    client: &C,
    path: &str,
    deadline: Duration,
) -> Result<SubrequestResponse> {
    match tokio::time::timeout(deadline, client.fetch(path)).await {
        Ok(result) => result,
        Err(_) => Err(AggregatorError::SubrequestTimeout {
            path: path.to_string(),
            timeout_ms: deadline.as_millis() as u64,
        }),
    }
}

/// Scatter-gather over the owner collection: one subrequest for the owners,
/// then one per pet for its visits.
pub struct OwnerAggregator<C: SubrequestClient> {
    client: C,
    settings: AggregationSettings,
}

impl<C: SubrequestClient> OwnerAggregator<C> {
    pub fn new(client: C, settings: AggregationSettings) -> Self {
        Self { client, settings }
    }

    pub async fn aggregate_owners(&self) -> Result<AggregatedOwnerList> {
        let owners = self.fetch_owner_collection().await?;
        tracing::debug!("🐾 Fetched {} owners, fanning out visit subrequests", owners.len());

        // Bounded per inbound request; permits are held only while a fetch is outstanding.
        let permits = Semaphore::new(self.settings.concurrent_subrequests);

        // Slot i of the joined result belongs to owners[i].
        let branches: Vec<_> = owners
            .iter()
            .map(|owner| self.collect_owner_visits(owner, &permits))
            .collect();
        let visits_per_owner = join_all(branches).await;

        let aggregated: AggregatedOwnerList = owners
            .into_iter()
            .zip(visits_per_owner)
            .map(|(owner, visits)| EnrichedOwner::new(owner, visits))
            .collect();

        tracing::debug!("🐾 Aggregated {} owners", aggregated.len());
        Ok(aggregated)
    }

    async fn fetch_owner_collection(&self) -> Result<Vec<Owner>> {
        let path = &self.settings.owners_path;
        let response =
            fetch_with_deadline(&self.client, path, self.settings.subrequest_timeout).await?;

        if !response.is_success() {
            return Err(AggregatorError::UpstreamStatusError {
                path: path.clone(),
                status: response.status,
            });
        }

        parse_owner_collection(&response.body)
    }

    async fn collect_owner_visits(&self, owner: &Owner, permits: &Semaphore) -> Vec<Visit> {
        let branches: Vec<_> = owner
            .pet_ids()
            .map(|pet_id| self.fetch_pet_visits(pet_id, permits))
            .collect();
        let per_pet = join_all(branches).await;

        per_pet.into_iter().flatten().collect()
    }

    /// Visits for one pet. Every failure mode degrades to an empty list.
    pub async fn fetch_pet_visits(&self, pet_id: &PetId, permits: &Semaphore) -> Vec<Visit> {
        let path = self.settings.visits_path_for(pet_id);
        let _permit = permits.acquire().await.ok();

        match fetch_with_deadline(&self.client, &path, self.settings.subrequest_timeout).await {
            Ok(response) if response.is_success() => match parse_visits(&response.body) {
                Ok(visits) => visits,
                Err(e) => {
                    tracing::warn!("⚠️ Unparsable visits for pet {}: {}", pet_id, e);
                    Vec::new()
                }
            },
            Ok(response) => {
                tracing::warn!(
                    "⚠️ Visits for pet {} unavailable (status {})",
                    pet_id,
                    response.status
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("⚠️ Visits for pet {} unavailable: {}", pet_id, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MockSubrequestClient;
    use serde_json::{json, Value};
    use std::collections::HashSet;

    fn settings_with_timeout(timeout_ms: u64) -> AggregationSettings {
        AggregationSettings {
            subrequest_timeout: Duration::from_millis(timeout_ms),
            ..AggregationSettings::default()
        }
    }

    fn to_json(owners: &AggregatedOwnerList) -> Value {
        serde_json::to_value(owners).unwrap()
    }

    fn visit_ids(owner: &Value) -> HashSet<String> {
        owner["visits"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_single_owner_with_partial_visit_failure() {
        let client = MockSubrequestClient::new()
            .with_json("/owners", 200, json!([{"id": "o1", "pets": [{"id": "p1"}, {"id": "p2"}]}]))
            .with_json("/visits/pets/p1", 200, json!([{"id": "v1"}]))
            .with_json("/visits/pets/p2", 404, json!({"error": "not found"}));

        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());
        let owners = aggregator.aggregate_owners().await.unwrap();

        assert_eq!(
            to_json(&owners),
            json!([{"id": "o1", "pets": [{"id": "p1"}, {"id": "p2"}], "visits": [{"id": "v1"}]}])
        );
    }

    #[tokio::test]
    async fn test_every_owner_gets_a_visits_array() {
        let client = MockSubrequestClient::new()
            .with_json(
                "/owners",
                200,
                json!([
                    {"id": "o1", "pets": []},
                    {"id": "o2", "pets": [{"id": "p9"}]},
                    {"id": "o3", "pets": [{"id": "p3"}]}
                ]),
            )
            .with_failure("/visits/pets/p9")
            .with_json("/visits/pets/p3", 500, json!("boom"));

        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());
        let owners = to_json(&aggregator.aggregate_owners().await.unwrap());

        let owners = owners.as_array().unwrap();
        assert_eq!(owners.len(), 3);
        for owner in owners {
            assert_eq!(owner["visits"], json!([]));
        }
    }

    #[tokio::test]
    async fn test_visits_never_leak_across_owners() {
        let client = MockSubrequestClient::new()
            .with_json(
                "/owners",
                200,
                json!([
                    {"id": "o1", "pets": [{"id": "p1"}, {"id": "p2"}]},
                    {"id": "o2", "pets": [{"id": "p3"}]}
                ]),
            )
            .with_json("/visits/pets/p1", 200, json!([{"id": "v1"}, {"id": "v2"}]))
            .with_json("/visits/pets/p2", 200, json!([{"id": "v3"}]))
            .with_json("/visits/pets/p3", 200, json!([{"id": "v4"}]));

        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());
        let owners = to_json(&aggregator.aggregate_owners().await.unwrap());

        assert_eq!(owners[0]["id"], "o1");
        assert_eq!(owners[1]["id"], "o2");
        let expected_o1: HashSet<String> =
            ["v1", "v2", "v3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(visit_ids(&owners[0]), expected_o1);
        assert_eq!(owners[1]["visits"], json!([{"id": "v4"}]));
    }

    #[tokio::test]
    async fn test_owner_collection_transport_error_is_fatal() {
        let client = MockSubrequestClient::new().with_failure("/owners");
        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());

        let result = aggregator.aggregate_owners().await;
        assert!(matches!(result, Err(AggregatorError::IoError(_))));
    }

    #[tokio::test]
    async fn test_unparsable_owner_collection_is_fatal_and_skips_fan_out() {
        let client = MockSubrequestClient::new().with_body("/owners", 200, "<html>oops</html>");
        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());

        let result = aggregator.aggregate_owners().await;
        assert!(matches!(result, Err(AggregatorError::PayloadError(_))));
    }

    #[tokio::test]
    async fn test_owner_without_pets_field_is_fatal() {
        let client = MockSubrequestClient::new()
            .with_json("/owners", 200, json!([{"id": "o1", "pets": [{"id": "p1"}]}, {"id": "o2"}]));
        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());

        assert!(aggregator.aggregate_owners().await.is_err());
    }

    #[tokio::test]
    async fn test_owner_collection_error_status_is_fatal() {
        let client = MockSubrequestClient::new().with_json("/owners", 503, json!([]));
        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());

        match aggregator.aggregate_owners().await {
            Err(AggregatorError::UpstreamStatusError { path, status }) => {
                assert_eq!(path, "/owners");
                assert_eq!(status, 503);
            }
            other => panic!("expected upstream status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_pet_branch_degrades_to_empty_visits() {
        let client = MockSubrequestClient::new()
            .with_json("/owners", 200, json!([{"id": "o1", "pets": [{"id": "slow"}, {"id": "fast"}]}]))
            .with_delayed_json(
                "/visits/pets/slow",
                Duration::from_secs(30),
                200,
                json!([{"id": "late"}]),
            )
            .with_json("/visits/pets/fast", 200, json!([{"id": "v1"}]));

        let aggregator = OwnerAggregator::new(client, settings_with_timeout(100));
        let owners = to_json(&aggregator.aggregate_owners().await.unwrap());

        assert_eq!(owners[0]["visits"], json!([{"id": "v1"}]));
    }

    #[tokio::test]
    async fn test_slow_owner_collection_is_fatal_timeout() {
        let client = MockSubrequestClient::new().with_delayed_json(
            "/owners",
            Duration::from_secs(30),
            200,
            json!([]),
        );
        let aggregator = OwnerAggregator::new(client, settings_with_timeout(50));

        let result = aggregator.aggregate_owners().await;
        assert!(matches!(
            result,
            Err(AggregatorError::SubrequestTimeout { timeout_ms: 50, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_visits_body_degrades_to_empty_visits() {
        let client = MockSubrequestClient::new()
            .with_json("/owners", 200, json!([{"id": "o1", "pets": [{"id": "p1"}]}]))
            .with_body("/visits/pets/p1", 200, "{\"not\":\"an array\"}");

        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());
        let owners = to_json(&aggregator.aggregate_owners().await.unwrap());

        assert_eq!(owners[0]["visits"], json!([]));
    }

    #[tokio::test]
    async fn test_one_subrequest_per_pet_with_numeric_ids() {
        let client = MockSubrequestClient::new()
            .with_json("/owners", 200, json!([{"id": 1, "pets": [{"id": 10}, {"id": 11}]}]))
            .with_json("/visits/pets/10", 200, json!([]))
            .with_json("/visits/pets/11", 200, json!([]));

        let aggregator = OwnerAggregator::new(client.clone(), AggregationSettings::default());
        aggregator.aggregate_owners().await.unwrap();

        let mut calls = client.calls().await;
        calls.sort();
        assert_eq!(calls, vec!["/owners", "/visits/pets/10", "/visits/pets/11"]);
    }

    #[tokio::test]
    async fn test_visit_subrequests_respect_concurrency_bound() {
        let delay = Duration::from_millis(25);
        let mut client = MockSubrequestClient::new().with_json(
            "/owners",
            200,
            json!([
                {"id": "o1", "pets": [{"id": "p1"}, {"id": "p2"}, {"id": "p3"}]},
                {"id": "o2", "pets": [{"id": "p4"}, {"id": "p5"}, {"id": "p6"}]}
            ]),
        );
        for pet in ["p1", "p2", "p3", "p4", "p5", "p6"] {
            client = client.with_delayed_json(
                &format!("/visits/pets/{}", pet),
                delay,
                200,
                json!([{"id": format!("v-{}", pet)}]),
            );
        }
        let settings = AggregationSettings {
            concurrent_subrequests: 2,
            ..AggregationSettings::default()
        };

        let aggregator = OwnerAggregator::new(client.clone(), settings);
        let owners = to_json(&aggregator.aggregate_owners().await.unwrap());

        assert!(client.peak_in_flight() <= 2);
        assert_eq!(client.peak_in_flight(), 2);
        let expected_o1: HashSet<String> =
            ["v-p1", "v-p2", "v-p3"].iter().map(|s| s.to_string()).collect();
        let expected_o2: HashSet<String> =
            ["v-p4", "v-p5", "v-p6"].iter().map(|s| s.to_string()).collect();
        assert_eq!(visit_ids(&owners[0]), expected_o1);
        assert_eq!(visit_ids(&owners[1]), expected_o2);
    }

    #[tokio::test]
    async fn test_empty_owner_collection() {
        let client = MockSubrequestClient::new().with_json("/owners", 200, json!([]));
        let aggregator = OwnerAggregator::new(client, AggregationSettings::default());

        assert!(aggregator.aggregate_owners().await.unwrap().is_empty());
    }

    #[test]
    fn test_settings_paths() {
        let settings = AggregationSettings {
            owners_path: "/api/owners/".to_string(),
            ..AggregationSettings::default()
        };
        assert_eq!(settings.owner_path_for("o1").unwrap(), "/api/owners/o1");
        assert_eq!(
            settings.visits_path_for(&PetId::Text("p1".to_string())),
            "/visits/pets/p1"
        );
    }

    #[test]
    fn test_owner_path_refuses_ids_leaving_the_collection() {
        let settings = AggregationSettings::default();

        for id in ["../../admin/secret", "..", "o1?role=admin", "o1#frag", "a%2Fb"] {
            assert!(matches!(
                settings.owner_path_for(id),
                Err(AggregatorError::InvalidOwnerId { .. })
            ));
        }
    }
}
