use rand::Rng;
use sched_core::errors::{BenchError, ErrorInfo};
use sched_core::RngHandle;
use serde::{Deserialize, Serialize};

/// Inclusive range of job durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    min: u32,
    max: u32,
}

impl DurationRange {
    /// Builds a range, requiring `1 <= min <= max`.
    pub fn new(min: u32, max: u32) -> Result<Self, BenchError> {
        if min == 0 || min > max {
            return Err(BenchError::Workload(
                ErrorInfo::new(
                    "invalid-duration-range",
                    "durations must satisfy 1 <= min <= max",
                )
                .with_context("min", min.to_string())
                .with_context("max", max.to_string()),
            ));
        }
        Ok(Self { min, max })
    }

    /// Smallest duration that may be drawn.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Largest duration that may be drawn.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Returns true when the range includes `value`.
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Source of job durations.
pub trait DurationSampler {
    /// Draws one duration inside `range`.
    fn sample(&mut self, range: DurationRange) -> u32;
}

/// Independent uniform draws from an explicitly seeded RNG.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    rng: RngHandle,
}

impl UniformSampler {
    /// Wraps an existing RNG handle.
    pub fn new(rng: RngHandle) -> Self {
        Self { rng }
    }

    /// Seeds a fresh sampler.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(RngHandle::from_seed(seed))
    }
}

impl DurationSampler for UniformSampler {
    fn sample(&mut self, range: DurationRange) -> u32 {
        self.rng.gen_range(range.min..=range.max)
    }
}

/// Replays a fixed list of durations, cycling when exhausted.
///
/// Values outside the requested range are clamped into it.
#[derive(Debug, Clone)]
pub struct SequenceSampler {
    values: Vec<u32>,
    cursor: usize,
}

impl SequenceSampler {
    /// Creates a sampler over `values`. An empty list always yields the range minimum.
    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }
}

impl DurationSampler for SequenceSampler {
    fn sample(&mut self, range: DurationRange) -> u32 {
        if self.values.is_empty() {
            return range.min;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(range.min, range.max)
    }
}
