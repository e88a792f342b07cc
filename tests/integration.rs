//! Integration test suite (requires a running server)

#[path = "integration/api_tests.rs"]
mod api_tests;
