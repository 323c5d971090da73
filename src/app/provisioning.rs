//! Provisioning gate: factory unit or configured unit.
//!
//! A unit leaves the factory once its record carries `provisioned = true`
//! and a role stamp matching the firmware image it runs.  Until then the
//! display routes refuse to act, while the SoftAP setup surface and the
//! admin pages keep working.

use crate::config::DeviceConfig;
use crate::error::Error;
use crate::platform::AppRole;

/// Operating mode derived from the provisioning stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// Not stamped, or stamped for a different image.
    Factory,
    /// Stamped for this image; display routes are live.
    Configured,
}

/// Stateless check against the role compiled into this image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningGate {
    role: AppRole,
}

impl ProvisioningGate {
    pub fn new(role: AppRole) -> Self {
        Self { role }
    }

    pub fn role(&self) -> AppRole {
        self.role
    }

    pub fn is_operational(&self, record: &DeviceConfig) -> bool {
        record.provisioned && self.role.matches(&record.role)
    }

    pub fn mode(&self, record: &DeviceConfig) -> DeviceMode {
        if self.is_operational(record) {
            DeviceMode::Configured
        } else {
            DeviceMode::Factory
        }
    }

    /// `Err(NotProvisioned)` unless the unit is operational.
    pub fn require_operational(&self, record: &DeviceConfig) -> Result<(), Error> {
        if self.is_operational(record) {
            Ok(())
        } else {
            Err(Error::NotProvisioned)
        }
    }
}
