//! Device configuration record.
//!
//! One [`DeviceConfig`] exists per device.  It is owned by
//! [`ConfigStore`](crate::app::config_store::ConfigStore), stored in NVS as
//! a JSON document, and only ever replaced wholesale by a validated commit.
//! Field rules live in [`crate::app::fields`]; this module holds the shapes
//! and the factory defaults.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pins::DEFAULT_LED_PIN;
use crate::platform::AppRole;

/// Core device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name and network credentials. Not interpreted by the admin core.
    #[serde(default)]
    pub identity: Identity,

    // --- Provisioning stamp ---
    /// Set at the factory once the unit has been stamped with its role.
    pub provisioned: bool,
    /// Role token the unit was stamped for (`"lamp"` / `"map"`).
    pub role: String,

    // --- Strip ---
    pub led: LedConfig,

    // --- Firmware updates ---
    #[serde(default)]
    pub ota: OtaPrefs,

    // --- Role-specific display settings ---
    pub display: DisplaySettings,
}

impl DeviceConfig {
    /// Compiled-in record for a freshly flashed unit of `role`.
    pub fn factory_default(role: AppRole) -> Self {
        let (led, display) = match role {
            AppRole::Lamp => (
                LedConfig {
                    pin: DEFAULT_LED_PIN,
                    count: 1,
                    order: ColorOrder::Rgb,
                },
                DisplaySettings::Lamp(LampSettings::default()),
            ),
            AppRole::Map => (
                LedConfig {
                    pin: DEFAULT_LED_PIN,
                    count: 1,
                    order: ColorOrder::Grb,
                },
                DisplaySettings::Map(MapSettings::default()),
            ),
        };
        Self {
            identity: Identity {
                device_name: role.default_device_name().into(),
                ..Identity::default()
            },
            provisioned: false,
            role: String::new(),
            led,
            ota: OtaPrefs::default(),
            display,
        }
    }

    pub fn lamp(&self) -> Option<&LampSettings> {
        match &self.display {
            DisplaySettings::Lamp(s) => Some(s),
            DisplaySettings::Map(_) => None,
        }
    }

    pub fn map(&self) -> Option<&MapSettings> {
        match &self.display {
            DisplaySettings::Map(s) => Some(s),
            DisplaySettings::Lamp(_) => None,
        }
    }

    /// Brightness of whichever display is configured.
    pub fn brightness(&self) -> u8 {
        match &self.display {
            DisplaySettings::Lamp(s) => s.brightness,
            DisplaySettings::Map(s) => s.brightness,
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Pass-through identity and network fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// SoftAP SSID and page title.
    pub device_name: String,
    pub wifi_ssid: String,
    pub wifi_pass: String,
    /// Weather API token.
    pub weather_token: String,
}

// ---------------------------------------------------------------------------
// Strip
// ---------------------------------------------------------------------------

/// Addressable strip wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfig {
    /// Data GPIO. Always passes the safety policy for the running chip.
    pub pin: i32,
    /// Number of pixels, `1..=role.max_led_count()`.
    pub count: u16,
    /// Wire order of the colour channels.
    pub order: ColorOrder,
}

/// Colour channel order expected by the strip on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorOrder {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    /// Every accepted permutation.
    pub const ALL: [Self; 6] = [
        Self::Rgb,
        Self::Rbg,
        Self::Grb,
        Self::Gbr,
        Self::Brg,
        Self::Bgr,
    ];

    /// Canonical uppercase spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Rbg => "RBG",
            Self::Grb => "GRB",
            Self::Gbr => "GBR",
            Self::Brg => "BRG",
            Self::Bgr => "BGR",
        }
    }

    /// Place a logical `(r, g, b)` triple into wire order.
    pub fn arrange(self, r: u8, g: u8, b: u8) -> [u8; 3] {
        match self {
            Self::Rgb => [r, g, b],
            Self::Rbg => [r, b, g],
            Self::Grb => [g, r, b],
            Self::Gbr => [g, b, r],
            Self::Brg => [b, r, g],
            Self::Bgr => [b, g, r],
        }
    }
}

impl fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input was not one of the six channel permutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidColorOrder;

impl fmt::Display for InvalidColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "color order must be one of RGB, RBG, GRB, GBR, BRG, BGR")
    }
}

impl FromStr for ColorOrder {
    type Err = InvalidColorOrder;

    /// Surrounding whitespace is ignored and case does not matter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
            .ok_or(InvalidColorOrder)
    }
}

// ---------------------------------------------------------------------------
// OTA preferences
// ---------------------------------------------------------------------------

/// Update-check preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtaPrefs {
    /// Periodically check and install without user action.
    pub auto_update: bool,
    /// Days between automatic checks, `1..=60`.
    pub interval_days: u8,
    /// Run one check shortly after boot.
    pub check_on_boot: bool,
}

impl Default for OtaPrefs {
    fn default() -> Self {
        Self {
            auto_update: false,
            interval_days: 7,
            check_on_boot: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Display settings
// ---------------------------------------------------------------------------

/// Settings for the display the firmware role drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplaySettings {
    Lamp(LampSettings),
    Map(MapSettings),
}

/// Single-airport lamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampSettings {
    /// ICAO station, uppercase.
    pub airport_code: String,
    /// Percent, `3..=100`.
    pub brightness: u8,
    pub schedule: Schedule,
    /// POSIX TZ string used by the schedule.
    pub timezone: String,
    /// Display animation, `0..=5`.
    pub display_mode: u8,
    pub flight_pulse: FlightPulse,
}

impl Default for LampSettings {
    fn default() -> Self {
        Self {
            airport_code: "KTIX".into(),
            brightness: 100,
            schedule: Schedule::default(),
            timezone: "UTC0".into(),
            display_mode: 0,
            flight_pulse: FlightPulse::default(),
        }
    }
}

/// Daily on-window for the lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub enabled: bool,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 0,
            start_minute: 0,
            end_hour: 23,
            end_minute: 59,
        }
    }
}

/// Pulse the lamp when a tracked aircraft is nearby.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightPulse {
    pub enabled: bool,
    /// 24-bit ICAO transponder address, 6 uppercase hex digits or empty.
    pub icao: String,
    /// US N-number or empty.
    pub tail: String,
}

/// Multi-node map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSettings {
    /// Comma-separated token list, one LED per token.
    pub tokens: String,
    /// Raw strip brightness, `1..=255`.
    pub brightness: u8,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            tokens: "VFR,MVFR,IFR,LIFR,SKIP".into(),
            brightness: 120,
        }
    }
}
