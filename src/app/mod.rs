//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the rules of the admin and update control plane:
//! validate-then-commit configuration, the provisioning and admin gates,
//! the OTA lifecycle and the LED wiring test.  All interaction with
//! hardware and the network happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod admin_gate;
pub mod commands;
pub mod config_store;
pub mod events;
pub mod fields;
pub mod ota;
pub mod ports;
pub mod provisioning;
pub mod service;
