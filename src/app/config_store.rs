//! Validate-then-commit store for the device configuration record.
//!
//! ```text
//!   FieldSet ──validate_and_stage──▶ StagedRecord ──commit──▶ NVS ──▶ live
//!                  │ (clone, never the live record)    │ write fails?
//!                  ▼                                   ▼
//!           ValidationError                  PersistError, live unchanged
//! ```
//!
//! The live record is only replaced after the NVS write succeeds, so the
//! in-memory copy and the persisted copy always hold either the last fully
//! validated record or the factory default.  `commit` takes `&mut self`;
//! ownership makes the store its own single writer.

use log::{info, warn};

use crate::config::DeviceConfig;
use crate::error::{PersistError, ValidationError};
use crate::platform::FirmwareProfile;

use super::fields::{FieldSet, apply_field, validate_record};
use super::ports::{StorageError, StoragePort};

/// NVS namespace holding the config document.
pub const CONFIG_NAMESPACE: &str = "lightworks";
/// NVS key of the config document.
pub const CONFIG_KEY: &str = "config";
/// Upper bound for the encoded document (NVS blob budget).
pub const MAX_DOCUMENT_SIZE: usize = 4000;

/// A fully validated replacement record, ready to commit.
///
/// Only [`ConfigStore::validate_and_stage`] can create one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRecord {
    record: DeviceConfig,
}

impl StagedRecord {
    pub fn record(&self) -> &DeviceConfig {
        &self.record
    }
}

/// Owner of the one live [`DeviceConfig`].
pub struct ConfigStore<S: StoragePort> {
    storage: S,
    profile: FirmwareProfile,
    live: DeviceConfig,
}

impl<S: StoragePort> ConfigStore<S> {
    /// Open the store and load the persisted record (or the default).
    pub fn open(storage: S, profile: FirmwareProfile) -> Self {
        let live = Self::load_from(&storage, &profile);
        Self {
            storage,
            profile,
            live,
        }
    }

    /// Read the persisted record again. Never fails outward.
    pub fn load(&self) -> DeviceConfig {
        Self::load_from(&self.storage, &self.profile)
    }

    fn load_from(storage: &S, profile: &FirmwareProfile) -> DeviceConfig {
        let fallback = || DeviceConfig::factory_default(profile.role);

        let mut buf = vec![0u8; MAX_DOCUMENT_SIZE];
        let len = match storage.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("ConfigStore: no stored config, using factory default");
                return fallback();
            }
            Err(e) => {
                warn!("ConfigStore: read failed ({}), using factory default", e);
                return fallback();
            }
        };

        let record = match decode(&buf[..len]) {
            Some(record) => record,
            None => {
                warn!("ConfigStore: stored config corrupt ({} bytes), using factory default", len);
                return fallback();
            }
        };

        if let Err(e) = validate_record(&record, profile) {
            warn!("ConfigStore: stored config invalid ({}), using factory default", e);
            return fallback();
        }

        info!("ConfigStore: loaded config ({} bytes)", len);
        record
    }

    /// The live record.
    pub fn current(&self) -> &DeviceConfig {
        &self.live
    }

    pub fn profile(&self) -> &FirmwareProfile {
        &self.profile
    }

    /// Check every field of `fields` and build a complete replacement.
    ///
    /// The first failing field aborts the whole submission; the live record
    /// is never touched here.
    pub fn validate_and_stage(&self, fields: &FieldSet) -> Result<StagedRecord, ValidationError> {
        let mut candidate = self.live.clone();
        for (field, raw) in fields.iter() {
            apply_field(&mut candidate, field, raw, &self.profile)?;
        }
        Ok(StagedRecord { record: candidate })
    }

    /// Persist `staged` and make it live.
    ///
    /// On failure the live record and the previously persisted document
    /// are both left as they were.
    pub fn commit(&mut self, staged: StagedRecord) -> Result<(), PersistError> {
        let bytes = encode(&staged.record)?;
        if let Err(e) = self.storage.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes) {
            warn!("ConfigStore: write failed ({}), keeping previous record", e);
            return Err(e.into());
        }
        self.live = staged.record;
        info!("ConfigStore: committed ({} bytes)", bytes.len());
        Ok(())
    }

    /// Underlying storage (tests and diagnostics).
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// Serialise a record into the persisted document format.
pub fn encode(record: &DeviceConfig) -> Result<Vec<u8>, PersistError> {
    let bytes = serde_json::to_vec(record).map_err(|_| PersistError::Encode)?;
    if bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(PersistError::TooLarge);
    }
    Ok(bytes)
}

/// Parse a persisted document. `None` on any malformation.
pub fn decode(bytes: &[u8]) -> Option<DeviceConfig> {
    serde_json::from_slice(bytes).ok()
}
