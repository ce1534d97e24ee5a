//! Rubric scoring for prompt evaluations.
//!
//! Each dimension (clarity, specificity, safety) is sampled by a pluggable
//! [`ScoreSampler`]; the aggregation into an overall score is fixed: a convex
//! combination of the three dimensions using the normalized rubric weights.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Lowest score a single dimension can receive.
pub const MIN_DIMENSION_SCORE: u8 = 60;

/// Highest score a single dimension can receive.
pub const MAX_DIMENSION_SCORE: u8 = 100;

/// Relative importance of each scoring dimension.
///
/// Only the ratios matter: `{1, 1, 1}` and `{5, 5, 5}` score identically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricWeights {
    pub clarity: f64,
    pub specificity: f64,
    pub safety: f64,
}

impl RubricWeights {
    pub fn new(clarity: f64, specificity: f64, safety: f64) -> Self {
        Self {
            clarity,
            specificity,
            safety,
        }
    }

    /// Equal weighting of all three dimensions.
    pub fn uniform() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub fn total(&self) -> f64 {
        self.clarity + self.specificity + self.safety
    }
}

/// Raw per-dimension scores produced by a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionScores {
    pub clarity: u8,
    pub specificity: u8,
    pub safety: u8,
}

/// Per-dimension scores plus the weighted overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub clarity: u8,
    pub specificity: u8,
    pub safety: u8,
    pub overall: u8,
}

/// Source of per-dimension quality scores.
///
/// Stand-in for a real quality evaluator. Implementations should return
/// values in `[MIN_DIMENSION_SCORE, MAX_DIMENSION_SCORE]`; [`score`] clamps
/// anything outside that range.
pub trait ScoreSampler: Send + Sync {
    fn sample(&self) -> DimensionScores;
}

/// Uniform integer samples from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSampler;

impl ScoreSampler for RandomSampler {
    fn sample(&self) -> DimensionScores {
        let mut rng = rand::rng();
        DimensionScores {
            clarity: rng.random_range(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE),
            specificity: rng.random_range(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE),
            safety: rng.random_range(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE),
        }
    }
}

/// Uniform integer samples from a seeded RNG; the same seed yields the same
/// sequence of scores.
#[derive(Debug)]
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ScoreSampler for SeededSampler {
    fn sample(&self) -> DimensionScores {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        DimensionScores {
            clarity: rng.random_range(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE),
            specificity: rng.random_range(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE),
            safety: rng.random_range(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE),
        }
    }
}

/// Always returns the same scores.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub DimensionScores);

impl FixedSampler {
    pub fn new(clarity: u8, specificity: u8, safety: u8) -> Self {
        Self(DimensionScores {
            clarity,
            specificity,
            safety,
        })
    }
}

impl ScoreSampler for FixedSampler {
    fn sample(&self) -> DimensionScores {
        self.0
    }
}

/// Score one (prompt, model) pair.
///
/// Samples the three dimensions and combines them with the normalized
/// weights. A zero or non-finite weight total falls back to equal weighting.
pub fn score(weights: &RubricWeights, sampler: &dyn ScoreSampler) -> ScoreCard {
    let raw = sampler.sample();
    let clarity = clamp_dimension(raw.clarity);
    let specificity = clamp_dimension(raw.specificity);
    let safety = clamp_dimension(raw.safety);

    let total = weights.total();
    let effective = if total.is_finite() && total > 0.0 {
        *weights
    } else {
        RubricWeights::uniform()
    };
    let total = effective.total();

    let overall = f64::from(clarity) * (effective.clarity / total)
        + f64::from(specificity) * (effective.specificity / total)
        + f64::from(safety) * (effective.safety / total);

    ScoreCard {
        clarity,
        specificity,
        safety,
        overall: overall.round().clamp(0.0, 100.0) as u8,
    }
}

fn clamp_dimension(value: u8) -> u8 {
    value.clamp(MIN_DIMENSION_SCORE, MAX_DIMENSION_SCORE)
}
