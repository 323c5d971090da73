//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters decide where they
//! go (serial log today; a syslog or MQTT adapter would implement the same
//! trait).

use crate::error::{PersistError, ValidationError};
use crate::platform::{AppRole, HardwareVariant};

use super::led_test::TestSymbol;
use super::ota::OtaState;
use super::provisioning::DeviceMode;

/// Why the device is about to restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// `/admin/reboot` or `/reboot`.
    AdminRequest,
    /// A new image was written and made bootable.
    FirmwareInstalled,
}

/// Events the application core emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Service started with the loaded record.
    Started {
        mode: DeviceMode,
        role: AppRole,
        variant: HardwareVariant,
    },

    /// A staged record was written and is now live.
    ConfigCommitted,

    /// A submission failed validation; nothing was applied.
    ConfigRejected(ValidationError),

    /// NVS refused the write; the previous record stays live.
    PersistFailed(PersistError),

    /// A privileged request arrived without valid credentials.
    AuthRejected,

    /// A display route was refused because the unit is not provisioned.
    NotProvisioned,

    /// The OTA controller moved between states.
    OtaStateChanged { from: OtaState, to: OtaState },

    /// The wiring test drove the strip.
    LedTest(TestSymbol),

    /// The display was asked to redraw now.
    DisplayRefresh,

    /// A restart follows the response just sent.
    RestartScheduled(RestartReason),
}
