//! Unified error types for the admin and update control plane.
//!
//! Every fallible admin operation funnels into [`Error`], which the HTTP
//! layer maps onto a status code.  All variants are `Copy` so they can be
//! logged, emitted as events and returned without allocation.
//!
//! | Variant            | HTTP | Live state                          |
//! |--------------------|------|-------------------------------------|
//! | `AuthRequired`     | 401  | untouched, client re-challenged     |
//! | `Validation`       | 400  | untouched                           |
//! | `Persist`          | 500  | untouched, previous NVS copy stays  |
//! | `NotProvisioned`   | 403  | untouched                           |
//! | `OtaTransition`    | 409  | untouched                           |
//! | `OtaNetwork`       | 500  | OTA controller in `Failed`          |
//! | `InvalidSymbol`    | 400  | actuator untouched                  |
//!
//! Nothing here is fatal: the admin surface stays reachable after any of
//! them.

use core::fmt;

use crate::app::fields::Field;
use crate::app::ota::OtaError;
use crate::app::ports::{StorageError, UpdateError};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Credentials missing or wrong. No privileged side effect occurred.
    AuthRequired,
    /// A submitted field failed its rule. Nothing was applied.
    Validation(ValidationError),
    /// The staged record could not be written.
    Persist(PersistError),
    /// Device-function route used before the unit was provisioned.
    NotProvisioned,
    /// OTA action not allowed from the current state.
    OtaTransition(OtaError),
    /// Update source unreachable or returned garbage.
    OtaNetwork(UpdateError),
    /// LED test symbol outside `red|green|blue|off`.
    InvalidSymbol,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthRequired => write!(f, "authentication required"),
            Self::Validation(e) => write!(f, "{e}"),
            Self::Persist(e) => write!(f, "save failed: {e}"),
            Self::NotProvisioned => write!(f, "not provisioned"),
            Self::OtaTransition(e) => write!(f, "ota: {e}"),
            Self::OtaNetwork(e) => write!(f, "ota: {e}"),
            Self::InvalidSymbol => write!(f, "bad color, use c=red|green|blue|off"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// First field of a submission that failed its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Field,
    pub reason: &'static str,
}

impl ValidationError {
    pub const fn new(field: Field, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    /// Record could not be serialised.
    Encode,
    /// Encoded document exceeds the NVS blob budget.
    TooLarge,
    /// Underlying storage rejected the write.
    Storage(StorageError),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "encode failed"),
            Self::TooLarge => write!(f, "document too large"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<StorageError> for PersistError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<PersistError> for Error {
    fn from(e: PersistError) -> Self {
        Self::Persist(e)
    }
}

// ---------------------------------------------------------------------------
// OTA
// ---------------------------------------------------------------------------

impl From<OtaError> for Error {
    fn from(e: OtaError) -> Self {
        match e {
            OtaError::Source(u) => Self::OtaNetwork(u),
            other => Self::OtaTransition(other),
        }
    }
}
