//! Integration tests for the tidepool crawler
//!
//! These tests use wiremock servers as the candidate source, the benchmark
//! target, and the catalog API — and, because plain-HTTP forward proxying
//! is just absolute-form request forwarding, the same mock server doubles
//! as the forward proxy the workers route through.

mod common;
mod crawl_tests;
mod probe_tests;
mod scan_tests;
