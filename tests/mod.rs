//! Integration tests for ktuvit-subs
//!
//! Tests are organized by component:
//! - catalog_test: Title resolution, movie and series listings
//! - auth_test: Login handshake, access probe, settings validation
//! - download_test: Token exchange and file fetch
//! - cli_test: Argument parsing, JSON output, command handlers

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
