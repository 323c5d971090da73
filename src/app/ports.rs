//! Port traits — the hexagonal boundary between the admin core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (storage, LED strip, display refresh, update source,
//! restart, event sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware or the network directly.
//!
//! ## Security notes
//!
//! - **StoragePort** writes must be atomic; a torn write would break the
//!   "last good record or factory default" guarantee.
//! - **UpdateSourcePort** implementations MUST NOT switch the boot
//!   partition until the whole image has been written and verified.
//! - All port errors are typed; callers must handle every variant explicitly.

use core::fmt;

use crate::config::LedConfig;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → LED strip)
// ───────────────────────────────────────────────────────────────

/// Raw strip primitives used by the wiring test.
///
/// Channel reordering for [`ColorOrder`](crate::config::ColorOrder) is the
/// adapter's job; callers always pass logical red/green/blue.
pub trait ActuatorPort {
    /// Fill the whole strip with one colour and latch it.
    fn set_color(&mut self, r: u8, g: u8, b: u8);

    /// Turn every pixel off.
    fn clear(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → weather renderer)
// ───────────────────────────────────────────────────────────────

/// The weather display the core pokes after configuration changes.
pub trait DisplayPort {
    /// Re-create the strip driver for a new pin / length / order.
    fn apply_led_config(&mut self, led: &LedConfig);

    /// Fetch fresh weather data and redraw immediately.
    fn refresh_now(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Update source port (driven adapter: domain ↔ release server)
// ───────────────────────────────────────────────────────────────

/// Version tag capacity (`"v12.345.6789-rc1"` fits).
pub type VersionTag = heapless::String<24>;

/// A release newer than the running image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Tag as published, e.g. `v0.4.0`.
    pub version: VersionTag,
    /// Direct download URL for the asset.
    pub url: String,
    /// Advertised asset size in bytes (0 if unknown).
    pub size: u32,
}

/// Where firmware images come from.
///
/// Both calls block until they reach a terminal outcome.
pub trait UpdateSourcePort {
    /// Look up the newest release carrying `asset_name`.
    ///
    /// `Ok(None)` means the running image is already the newest.
    fn latest(&mut self, asset_name: &str) -> Result<Option<ReleaseInfo>, UpdateError>;

    /// Download `release` into the inactive slot and mark it bootable.
    ///
    /// Returning `Ok` means the next restart boots the new image.
    fn install(&mut self, release: &ReleaseInfo) -> Result<(), UpdateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    /// Connection, TLS or read failure.
    Network,
    /// Server answered with a non-success status.
    HttpStatus(u16),
    /// Release metadata did not parse.
    Parse,
    /// Release exists but carries no asset for this chip / role.
    AssetMissing,
    /// Image is empty or larger than the OTA slot.
    BadSize,
    /// Writing to the inactive partition failed.
    Write,
    /// Image verification failed in finalize.
    Verify,
    /// Could not switch the boot partition.
    BootPartition,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network error"),
            Self::HttpStatus(code) => write!(f, "HTTP {code}"),
            Self::Parse => write!(f, "bad release metadata"),
            Self::AssetMissing => write!(f, "no asset for this device"),
            Self::BadSize => write!(f, "image size out of range"),
            Self::Write => write!(f, "flash write failed"),
            Self::Verify => write!(f, "image verification failed"),
            Self::BootPartition => write!(f, "set boot partition failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// System port (driven adapter: domain → chip)
// ───────────────────────────────────────────────────────────────

/// Process-level control.
pub trait SystemPort {
    /// Restart the chip. On hardware this does not return.
    fn restart(&mut self);
}

/// Everything the service drives on the device side, bundled so one
/// `&mut` can be threaded through a request without double borrows.
pub trait DevicePorts: ActuatorPort + DisplayPort + UpdateSourcePort + SystemPort {}

impl<T: ActuatorPort + DisplayPort + UpdateSourcePort + SystemPort> DevicePorts for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// # Security
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
/// - The config document carries WiFi credentials; on production units the
///   NVS partition should be encrypted.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Value does not fit the caller's buffer.
    TooLarge,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::TooLarge => write!(f, "value too large"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
