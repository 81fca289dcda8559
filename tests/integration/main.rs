//! End-to-end tests for both stages
//!
//! These tests use wiremock to stand in for the listing API and the image
//! host, and tempfile directories for every file the stages write.

mod download_tests;
mod export_tests;
