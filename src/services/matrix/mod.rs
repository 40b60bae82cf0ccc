//! Distance/time matrix provider: a real driving-matrix HTTP backend with a
//! deterministic Haversine fallback, cached by point-set fingerprint.

mod real;

pub use real::{RealProvider, RealProviderConfig};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::Coordinates;

/// Distance (meters) and duration (minutes) matrices for an ordered point list.
#[derive(Debug, Clone)]
pub struct DistanceTimeMatrices {
    pub distances_m: Vec<Vec<u64>>,
    pub durations_min: Vec<Vec<u64>>,
    pub size: usize,
    /// "real" or "fallback" — surfaced to callers per §8 S6 (`matrix_source` tag).
    pub source: &'static str,
}

impl DistanceTimeMatrices {
    pub fn empty(source: &'static str) -> Self {
        Self { distances_m: vec![], durations_min: vec![], size: 0, source }
    }

    pub fn distance(&self, from: usize, to: usize) -> u64 {
        self.distances_m[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> u64 {
        self.durations_min[from][to]
    }
}

#[async_trait]
pub trait MatrixProvider: Send + Sync {
    async fn get_matrix(&self, points: &[Coordinates]) -> DistanceTimeMatrices;
    fn name(&self) -> &str;
}

/// Great-circle distance, time from an assumed road speed.
/// Deterministic, used whenever the real backend is unavailable or fails.
pub struct HaversineProvider {
    assumed_speed_mph: f64,
}

impl Default for HaversineProvider {
    fn default() -> Self {
        Self { assumed_speed_mph: 30.0 }
    }
}

impl HaversineProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatrixProvider for HaversineProvider {
    async fn get_matrix(&self, points: &[Coordinates]) -> DistanceTimeMatrices {
        use crate::services::geo::haversine_distance;

        let n = points.len();
        if n == 0 {
            return DistanceTimeMatrices::empty("fallback");
        }

        let mut distances_m = vec![vec![0u64; n]; n];
        let mut durations_min = vec![vec![0u64; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let straight_km = haversine_distance(&points[i], &points[j]);
                let straight_miles = straight_km * 0.621371;
                distances_m[i][j] = (straight_km * 1000.0).round() as u64;
                durations_min[i][j] = ((straight_miles / self.assumed_speed_mph) * 60.0).ceil() as u64;
            }
        }

        DistanceTimeMatrices { distances_m, durations_min, size: n, source: "fallback" }
    }

    fn name(&self) -> &str {
        "haversine"
    }
}

/// Rounds coordinates to 6 decimal degrees and joins them into a cache key.
fn fingerprint(points: &[Coordinates]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lat, p.lng))
        .collect::<Vec<_>>()
        .join(";")
}

struct CacheEntry {
    matrices: DistanceTimeMatrices,
    inserted_at: Instant,
}

/// Wraps an inner `MatrixProvider` with a read-biased TTL cache keyed by
/// point-set fingerprint, per §4.1's "legitimately process-wide" carve-out.
pub struct CachedMatrixProvider<P: MatrixProvider> {
    inner: P,
    ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl<P: MatrixProvider> CachedMatrixProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self { inner, ttl, cache: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl<P: MatrixProvider> MatrixProvider for CachedMatrixProvider<P> {
    async fn get_matrix(&self, points: &[Coordinates]) -> DistanceTimeMatrices {
        let key = fingerprint(points);

        if let Some(entry) = self.cache.read().get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return entry.matrices.clone();
            }
        }

        let matrices = self.inner.get_matrix(points).await;
        self.cache.write().insert(
            key,
            CacheEntry { matrices: matrices.clone(), inserted_at: Instant::now() },
        );
        matrices
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Resolves the matrix backend the way the donor resolves its routing
/// service: probe a configured URL with a bounded timeout, fall back to
/// `HaversineProvider` on any failure (including "no URL configured").
pub async fn create_matrix_provider_with_fallback(
    backend_url: Option<String>,
    cache_ttl: Duration,
    max_points: usize,
) -> Box<dyn MatrixProvider> {
    use tracing::{info, warn};

    if let Some(url) = backend_url {
        let config = RealProviderConfig::new(&url).with_max_points(max_points);
        match health_check(&url).await {
            Ok(()) => {
                info!("real matrix backend available at {}", url);
                return Box::new(CachedMatrixProvider::new(RealProvider::new(config), cache_ttl));
            }
            Err(e) => {
                warn!("matrix backend unavailable at {}: {}. falling back to haversine", url, e);
            }
        }
    }

    info!("using haversine matrix provider (no backend configured or unavailable)");
    Box::new(CachedMatrixProvider::new(HaversineProvider::new(), cache_ttl))
}

async fn health_check(base_url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;
    let url = format!("{}/status", base_url);
    let response = client.get(&url).send().await?;
    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("backend returned status {}", response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prague() -> Coordinates {
        Coordinates { lat: 50.0755, lng: 14.4378 }
    }

    fn brno() -> Coordinates {
        Coordinates { lat: 49.1951, lng: 16.6068 }
    }

    #[tokio::test]
    async fn haversine_empty_points() {
        let provider = HaversineProvider::new();
        let matrices = provider.get_matrix(&[]).await;
        assert_eq!(matrices.size, 0);
    }

    #[tokio::test]
    async fn haversine_diagonal_is_zero() {
        let provider = HaversineProvider::new();
        let matrices = provider.get_matrix(&[prague(), brno()]).await;
        assert_eq!(matrices.distance(0, 0), 0);
        assert_eq!(matrices.distance(1, 1), 0);
    }

    #[tokio::test]
    async fn haversine_is_symmetric() {
        let provider = HaversineProvider::new();
        let matrices = provider.get_matrix(&[prague(), brno()]).await;
        assert_eq!(matrices.distance(0, 1), matrices.distance(1, 0));
        assert_eq!(matrices.duration(0, 1), matrices.duration(1, 0));
    }

    #[tokio::test]
    async fn haversine_is_tagged_fallback() {
        let provider = HaversineProvider::new();
        let matrices = provider.get_matrix(&[prague(), brno()]).await;
        assert_eq!(matrices.source, "fallback");
    }

    #[tokio::test]
    async fn cached_provider_reuses_result_within_ttl() {
        let cached = CachedMatrixProvider::new(HaversineProvider::new(), Duration::from_secs(60));
        let first = cached.get_matrix(&[prague(), brno()]).await;
        let second = cached.get_matrix(&[prague(), brno()]).await;
        assert_eq!(first.distance(0, 1), second.distance(0, 1));
    }

    #[tokio::test]
    async fn fallback_used_when_no_backend_configured() {
        let provider =
            create_matrix_provider_with_fallback(None, Duration::from_secs(3600), 200).await;
        assert_eq!(provider.name(), "haversine");
    }

    #[tokio::test]
    async fn fallback_used_when_backend_unreachable() {
        let provider = create_matrix_provider_with_fallback(
            Some("http://localhost:1".to_string()),
            Duration::from_secs(3600),
            200,
        )
        .await;
        assert_eq!(provider.name(), "haversine");
    }
}
