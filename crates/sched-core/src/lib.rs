#![deny(missing_docs)]
#![doc = "Core types, errors and seeding policy shared by the sched-bench crates."]

pub mod errors;
pub mod provenance;
pub mod rng;
mod types;

pub use errors::{BenchError, ErrorInfo};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{Configuration, CoolingMethod, Job, Workload};
