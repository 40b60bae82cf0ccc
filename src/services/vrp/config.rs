//! VRP solver configuration.

use crate::types::SpeedProfile;

/// Configuration for the VRP solver, derived from the requested [`SpeedProfile`].
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum solving time in seconds.
    pub max_time_seconds: u32,
    /// Maximum generations for the metaheuristic.
    pub max_generations: usize,
    /// Per-vehicle `costs.time` used to bias the solver toward even workload
    /// distribution across vehicles; paired with a fixed `costs.distance` of 1.0.
    pub span_cost_coefficient: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::quick()
    }
}

impl SolverConfig {
    pub fn from_profile(profile: SpeedProfile) -> Self {
        match profile {
            SpeedProfile::Quick => Self::quick(),
            SpeedProfile::Thorough => Self::thorough(),
        }
    }

    /// ~30s budget, favors responsiveness over polish.
    pub fn quick() -> Self {
        Self {
            max_time_seconds: 30,
            max_generations: 1500,
            span_cost_coefficient: 5000.0,
        }
    }

    /// ~120s budget, used for background/batch re-optimization.
    pub fn thorough() -> Self {
        Self {
            max_time_seconds: 120,
            max_generations: 6000,
            span_cost_coefficient: 4000.0,
        }
    }

    /// Minimal budget for unit tests — never used in production paths.
    pub fn instant() -> Self {
        Self {
            max_time_seconds: 2,
            max_generations: 200,
            span_cost_coefficient: 5000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_is_faster_than_thorough() {
        assert!(SolverConfig::quick().max_time_seconds < SolverConfig::thorough().max_time_seconds);
    }

    #[test]
    fn from_profile_matches_explicit_constructors() {
        let quick = SolverConfig::from_profile(SpeedProfile::Quick);
        assert_eq!(quick.max_time_seconds, SolverConfig::quick().max_time_seconds);
        let thorough = SolverConfig::from_profile(SpeedProfile::Thorough);
        assert_eq!(thorough.max_time_seconds, SolverConfig::thorough().max_time_seconds);
    }

    #[test]
    fn default_matches_quick() {
        assert_eq!(SolverConfig::default().max_time_seconds, SolverConfig::quick().max_time_seconds);
    }
}
