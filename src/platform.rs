//! Hardware variant, application role and the firmware profile derived
//! from them.
//!
//! The same source builds two products (the single-strip lamp and the
//! multi-node map) for two chip families.  Everything that used to differ
//! between those builds is parameterised here:
//!
//! ```text
//!   HardwareVariant ──┐
//!                     ├──▶ FirmwareProfile ──▶ asset name, pin policy, limits
//!   AppRole ──────────┘
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of an OTA asset file name.
pub const ASSET_NAME_LEN: usize = 48;

/// Fixed-capacity asset name (`metar-<role>-<chip>.bin`).
pub type AssetName = heapless::String<ASSET_NAME_LEN>;

// ───────────────────────────────────────────────────────────────
// Hardware variant
// ───────────────────────────────────────────────────────────────

/// Microcontroller family the firmware is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareVariant {
    /// ESP32-C3: reduced pin count, USB-JTAG on GPIO18/19.
    Esp32C3,
    /// Classic ESP32: flash bus, strapping and input-only pads to avoid.
    Esp32,
}

impl HardwareVariant {
    /// Map a chip model string (e.g. `"ESP32-C3"`) to a variant.
    ///
    /// Anything that mentions "C3" is the reduced-pin chip; everything else
    /// gets the stricter standard-chip policy.
    pub fn from_chip_model(model: &str) -> Self {
        if model.to_ascii_uppercase().contains("C3") {
            Self::Esp32C3
        } else {
            Self::Esp32
        }
    }

    /// Detect the variant of the running chip.
    #[cfg(target_os = "espidf")]
    pub fn detect() -> Self {
        // SAFETY: plain C struct, fully written by esp_chip_info.
        let mut info: esp_idf_svc::sys::esp_chip_info_t = unsafe { core::mem::zeroed() };
        unsafe { esp_idf_svc::sys::esp_chip_info(&mut info) };
        if info.model == esp_idf_svc::sys::esp_chip_model_t_CHIP_ESP32C3 {
            Self::Esp32C3
        } else {
            Self::Esp32
        }
    }

    /// Simulation stub: host builds behave like a classic ESP32.
    #[cfg(not(target_os = "espidf"))]
    pub fn detect() -> Self {
        Self::Esp32
    }

    /// Chip tag used in release asset names.
    pub fn chip_tag(self) -> &'static str {
        match self {
            Self::Esp32C3 => "esp32c3",
            Self::Esp32 => "esp32",
        }
    }

    /// Highest pin number offered by the LED setup form.
    pub fn max_form_pin(self) -> i32 {
        match self {
            Self::Esp32C3 => crate::pins::C3_MAX_GPIO,
            Self::Esp32 => crate::pins::ESP32_MAX_OUTPUT_GPIO,
        }
    }
}

impl fmt::Display for HardwareVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Esp32C3 => write!(f, "ESP32-C3"),
            Self::Esp32 => write!(f, "ESP32"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Application role
// ───────────────────────────────────────────────────────────────

/// Which product this firmware image implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppRole {
    /// Single addressable strip showing one airport.
    Lamp,
    /// One LED per airport / legend token.
    Map,
}

impl AppRole {
    /// Role compiled into this image (`--features map` selects the map).
    pub const fn compiled() -> Self {
        if cfg!(feature = "map") {
            Self::Map
        } else {
            Self::Lamp
        }
    }

    /// Token written into the provisioning stamp.
    pub fn token(self) -> &'static str {
        match self {
            Self::Lamp => "lamp",
            Self::Map => "map",
        }
    }

    /// Whether a stored role string names this role (ASCII case-insensitive).
    pub fn matches(self, stamp: &str) -> bool {
        !stamp.is_empty() && stamp.eq_ignore_ascii_case(self.token())
    }

    /// Upper bound for the strip length.
    pub fn max_led_count(self) -> u16 {
        match self {
            Self::Lamp => 300,
            Self::Map => 250,
        }
    }

    /// Brightness range accepted by the display settings.
    pub fn brightness_range(self) -> core::ops::RangeInclusive<u8> {
        match self {
            Self::Lamp => 3..=100,
            Self::Map => 1..=255,
        }
    }

    /// Human-facing product name.
    pub fn product_name(self) -> &'static str {
        match self {
            Self::Lamp => "METAR Lightworks",
            Self::Map => "METAR Mapworks",
        }
    }

    /// Default SoftAP / device name.
    pub fn default_device_name(self) -> &'static str {
        match self {
            Self::Lamp => "METARLightworks",
            Self::Map => "METARMapworks",
        }
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ───────────────────────────────────────────────────────────────
// Firmware profile
// ───────────────────────────────────────────────────────────────

/// Static facts about the running image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareProfile {
    pub variant: HardwareVariant,
    pub role: AppRole,
    /// Semantic version of the running image.
    pub version: &'static str,
}

impl FirmwareProfile {
    pub fn new(variant: HardwareVariant, role: AppRole) -> Self {
        Self {
            variant,
            role,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Profile of the running image: detected chip, compiled role.
    pub fn running() -> Self {
        Self::new(HardwareVariant::detect(), AppRole::compiled())
    }

    /// Release asset this image updates from, e.g. `metar-map-esp32c3.bin`.
    pub fn asset_name(&self) -> AssetName {
        let mut name = AssetName::new();
        // Longest combination is 23 bytes, well under capacity.
        let _ = fmt::Write::write_fmt(
            &mut name,
            format_args!("metar-{}-{}.bin", self.role.token(), self.variant.chip_tag()),
        );
        name
    }
}
