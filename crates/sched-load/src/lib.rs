//! Synthetic workload generation for solver benchmarks.
//!
//! A workload is a two-column CSV (`Job ID,Duration`) whose identifiers are
//! derived from the 1-based job index and whose durations are drawn from an
//! injected [`DurationSampler`].

mod generate;
mod sampler;

pub use generate::{
    generate_to_path, generate_workload, read_workload, write_workload, WORKLOAD_HEADER,
};
pub use sampler::{DurationRange, DurationSampler, SequenceSampler, UniformSampler};
