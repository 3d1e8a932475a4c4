//! Application state shared across handlers.

use hondana_core::config::AppConfig;
use hondana_metadata::MetadataStore;
use hondana_storage::ObjectStore;
use hondana_upstream::ArchiveSource;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Per-chapter materialization claims.
///
/// The first reader of an unmaterialized chapter claims it and spawns the
/// pipeline; later readers observe the claim and fall back to polling
/// instead of re-running it. Claims carry a TTL so a crashed or wedged run
/// cannot block a chapter forever: after expiry the next reader may
/// re-trigger, and duplicate runs are idempotent (same keys, same final
/// manifest).
#[derive(Clone)]
pub struct FlightRegistry {
    claims: Arc<Mutex<HashMap<String, Instant>>>,
    ttl: Duration,
}

impl FlightRegistry {
    /// Create a registry whose claims expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            claims: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Claim a chapter for materialization.
    ///
    /// Returns false when a non-expired claim is already held, in which
    /// case the caller must not start another run.
    pub async fn try_claim(&self, key: &str) -> bool {
        let mut claims = self.claims.lock().await;
        if let Some(claimed_at) = claims.get(key) {
            if claimed_at.elapsed() < self.ttl {
                return false;
            }
            tracing::warn!(claim = %key, "materialization claim expired, re-claiming");
        }
        claims.insert(key.to_string(), Instant::now());
        true
    }

    /// Release a claim after the run finished, failed, or timed out.
    pub async fn release(&self, key: &str) {
        self.claims.lock().await.remove(key);
    }

    /// Whether a non-expired claim is currently held.
    pub async fn is_in_flight(&self, key: &str) -> bool {
        let claims = self.claims.lock().await;
        claims
            .get(key)
            .is_some_and(|claimed_at| claimed_at.elapsed() < self.ttl)
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object cache backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Archive source.
    pub source: Arc<dyn ArchiveSource>,
    /// In-flight materialization claims.
    pub flights: FlightRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Panics
    ///
    /// Panics if server configuration validation fails; a zero poll
    /// interval or zero parallelism would stall at runtime instead.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        source: Arc<dyn ArchiveSource>,
    ) -> Self {
        if let Err(error) = config.server.validate() {
            panic!("invalid server configuration: {error}");
        }

        let flights = FlightRegistry::new(config.server.flight_ttl());
        Self {
            config: Arc::new(config),
            storage,
            metadata,
            source,
            flights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claims_are_exclusive_until_released() {
        let flights = FlightRegistry::new(Duration::from_secs(60));
        assert!(flights.try_claim("s/7/manifest.json").await);
        assert!(!flights.try_claim("s/7/manifest.json").await);
        assert!(flights.is_in_flight("s/7/manifest.json").await);

        flights.release("s/7/manifest.json").await;
        assert!(!flights.is_in_flight("s/7/manifest.json").await);
        assert!(flights.try_claim("s/7/manifest.json").await);
    }

    #[tokio::test]
    async fn expired_claims_can_be_retaken() {
        let flights = FlightRegistry::new(Duration::from_millis(10));
        assert!(flights.try_claim("k").await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!flights.is_in_flight("k").await);
        assert!(flights.try_claim("k").await);
    }
}
