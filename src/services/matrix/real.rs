//! Real driving-matrix backend (OSRM/Valhalla-style `sources_to_targets` HTTP API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Coordinates;
use super::{DistanceTimeMatrices, MatrixProvider};

/// Default cap on points per request when the caller doesn't configure one.
const DEFAULT_MAX_POINTS: usize = 100;

#[derive(Debug, Clone)]
pub struct RealProviderConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Points beyond this count are rejected up front; the caller falls back
    /// rather than risk an oversized, slow request to the backend.
    pub max_points: usize,
}

impl RealProviderConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds: 30,
            max_points: DEFAULT_MAX_POINTS,
        }
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }
}

pub struct RealProvider {
    client: reqwest::Client,
    config: RealProviderConfig,
}

impl RealProvider {
    pub fn new(config: RealProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("failed to build matrix backend HTTP client");
        Self { client, config }
    }
}

#[derive(Serialize)]
struct MatrixLocation {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
struct MatrixRequest<'a> {
    sources: &'a [MatrixLocation],
    targets: &'a [MatrixLocation],
    costing: &'static str,
    units: &'static str,
}

#[derive(Deserialize)]
struct MatrixCell {
    distance: Option<f64>,
    time: Option<f64>,
}

#[derive(Deserialize)]
struct MatrixResponse {
    sources_to_targets: Vec<Vec<MatrixCell>>,
}

#[async_trait]
impl MatrixProvider for RealProvider {
    async fn get_matrix(&self, points: &[Coordinates]) -> DistanceTimeMatrices {
        let n = points.len();
        if n == 0 {
            return DistanceTimeMatrices::empty("real");
        }
        if n == 1 {
            return DistanceTimeMatrices {
                distances_m: vec![vec![0]],
                durations_min: vec![vec![0]],
                size: 1,
                source: "real",
            };
        }

        match self.fetch(points).await {
            Ok(matrices) => matrices,
            Err(e) => {
                warn!("real matrix backend request failed: {}. caller should fall back", e);
                DistanceTimeMatrices::empty("fallback")
            }
        }
    }

    fn name(&self) -> &str {
        "real"
    }
}

impl RealProvider {
    async fn fetch(&self, points: &[Coordinates]) -> anyhow::Result<DistanceTimeMatrices> {
        if points.len() > self.config.max_points {
            anyhow::bail!(
                "point set of {} exceeds configured max of {}",
                points.len(),
                self.config.max_points
            );
        }

        let locations: Vec<MatrixLocation> =
            points.iter().map(|p| MatrixLocation { lat: p.lat, lon: p.lng }).collect();

        let request = MatrixRequest {
            sources: &locations,
            targets: &locations,
            costing: "auto",
            units: "kilometers",
        };

        let url = format!("{}/sources_to_targets", self.config.base_url);
        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("matrix backend returned status {}", response.status());
        }

        let parsed: MatrixResponse = response.json().await?;
        let n = points.len();
        let mut distances_m = vec![vec![0u64; n]; n];
        let mut durations_min = vec![vec![0u64; n]; n];

        for (i, row) in parsed.sources_to_targets.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                if i == j {
                    continue;
                }
                let distance_m = cell.distance.map(|km| (km * 1000.0) as u64).unwrap_or(u64::MAX / 2);
                // whole minutes, floored but never zero for a real arc
                let duration_min = cell.time.map(|s| ((s / 60.0).floor() as u64).max(1)).unwrap_or(u64::MAX / 2);
                distances_m[i][j] = distance_m;
                durations_min[i][j] = duration_min;
            }
        }

        Ok(DistanceTimeMatrices { distances_m, durations_min, size: n, source: "real" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_point_is_trivial() {
        let provider = RealProvider::new(RealProviderConfig::new("http://localhost:1"));
        let matrices = provider.get_matrix(&[Coordinates { lat: 1.0, lng: 1.0 }]).await;
        assert_eq!(matrices.size, 1);
        assert_eq!(matrices.distance(0, 0), 0);
    }

    #[tokio::test]
    async fn fetch_rejects_point_set_over_configured_max() {
        let config = RealProviderConfig::new("http://localhost:1").with_max_points(2);
        let provider = RealProvider::new(config);
        let points = vec![
            Coordinates { lat: 1.0, lng: 1.0 },
            Coordinates { lat: 2.0, lng: 2.0 },
            Coordinates { lat: 3.0, lng: 3.0 },
        ];
        let matrices = provider.get_matrix(&points).await;
        assert_eq!(matrices.source, "fallback");
        assert_eq!(matrices.size, 0);
    }

    #[tokio::test]
    #[ignore = "requires a running driving-matrix backend"]
    async fn live_backend_returns_symmetric_matrix() {
        let provider = RealProvider::new(RealProviderConfig::new("http://localhost:8002"));
        let points = vec![
            Coordinates { lat: 50.0755, lng: 14.4378 },
            Coordinates { lat: 49.1951, lng: 16.6068 },
        ];
        let matrices = provider.get_matrix(&points).await;
        assert_eq!(matrices.size, 2);
    }
}
