//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! through the HTTP router against mock adapters.  All tests run on the
//! host (x86_64) with no real hardware required.

mod admin_routes_tests;
mod auth_tests;
mod config_store_tests;
mod mock_hw;
mod ota_flow_tests;
mod provisioning_flow_tests;
