//! GPIO reference tables for the supported ESP32 families.
//!
//! Single source of truth for every pin number the firmware reasons about.
//! [`crate::safety`] consults these tables; nothing else hard-codes pin
//! numbers.
//!
//! Numbers follow the Espressif datasheets for the ESP32 (WROOM/WROVER)
//! and ESP32-C3 (Mini/SuperMini boards).

use core::ops::RangeInclusive;

// ---------------------------------------------------------------------------
// Factory default
// ---------------------------------------------------------------------------

/// Strip data pin shipped in the factory record. Safe on every variant.
pub const DEFAULT_LED_PIN: i32 = 5;

// ---------------------------------------------------------------------------
// ESP32-C3 (reduced pin count)
// ---------------------------------------------------------------------------

/// Highest GPIO number bonded out on the C3.
pub const C3_MAX_GPIO: i32 = 21;
/// USB-Serial/JTAG D- / D+. Driving these drops the debug console.
pub const C3_USB_JTAG: [i32; 2] = [18, 19];

// ---------------------------------------------------------------------------
// ESP32 (standard)
// ---------------------------------------------------------------------------

/// Highest GPIO that can be configured as an output.
pub const ESP32_MAX_OUTPUT_GPIO: i32 = 33;
/// SPI flash bus (SD0–SD3, CLK, CMD). Touching these crashes the chip.
pub const ESP32_FLASH_BUS: RangeInclusive<i32> = 6..=11;
/// Input-only pads (no output driver).
pub const ESP32_INPUT_ONLY: RangeInclusive<i32> = 34..=39;
/// Boot strapping pins. Usable, but a pulled-up strip can stop the chip booting.
pub const ESP32_STRAPPING: [i32; 4] = [0, 2, 12, 15];
/// UART0 TX / RX used by the boot ROM and log console.
pub const ESP32_CONSOLE_UART: [i32; 2] = [1, 3];
