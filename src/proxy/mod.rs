//! Proxy lifecycle: sourcing, benchmarking, and health tracking
//!
//! Candidates flow from the source endpoint through the benchmarker into
//! the health store, where workers check them out one at a time.

mod benchmark;
mod source;
mod store;

pub use benchmark::{BenchmarkOutcome, BenchmarkReport, Benchmarker};
pub use source::CandidateSource;
pub use store::{ProxyRecord, ProxySet, ProxyStore};
