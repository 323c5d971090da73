//! GPIO safety policy for the LED strip data pin.
//!
//! Every pin value must pass [`is_safe`] before it can enter a staged
//! configuration record.  The policy is deliberately conservative: pins
//! that *could* drive a strip but risk a failed boot, a crashed flash bus
//! or a garbled console are refused outright.
//!
//! ## Rules
//!
//! | Variant  | Blocked                                                   |
//! |----------|-----------------------------------------------------------|
//! | any      | `pin < 0`                                                 |
//! | ESP32-C3 | `pin > 21`, USB-JTAG `{18, 19}`                           |
//! | ESP32    | flash `6..=11`, input-only `34..=39`, strapping `{0,2,12,15}`, UART0 `{1,3}`, `pin > 33` |
//!
//! The function is pure and total over `i32`.

use core::fmt;

use crate::pins;
use crate::platform::HardwareVariant;

/// Outcome of classifying a candidate pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinVerdict {
    Safe,
    Negative,
    OutOfRange,
    DebugInterface,
    FlashBus,
    InputOnly,
    Strapping,
    ConsoleUart,
}

impl PinVerdict {
    /// Human-readable reason, used verbatim in validation errors.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Safe => "safe GPIO",
            Self::Negative => "unsafe GPIO: negative pin number",
            Self::OutOfRange => "unsafe GPIO: not an output pin on this chip",
            Self::DebugInterface => "unsafe GPIO: USB-JTAG debug pin",
            Self::FlashBus => "unsafe GPIO: internal flash bus",
            Self::InputOnly => "unsafe GPIO: input-only pin",
            Self::Strapping => "unsafe GPIO: boot strapping pin",
            Self::ConsoleUart => "unsafe GPIO: console UART pin",
        }
    }
}

impl fmt::Display for PinVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Classify `pin` for `variant`.
pub fn classify(variant: HardwareVariant, pin: i32) -> PinVerdict {
    if pin < 0 {
        return PinVerdict::Negative;
    }
    match variant {
        HardwareVariant::Esp32C3 => {
            if pin > pins::C3_MAX_GPIO {
                PinVerdict::OutOfRange
            } else if pins::C3_USB_JTAG.contains(&pin) {
                PinVerdict::DebugInterface
            } else {
                PinVerdict::Safe
            }
        }
        HardwareVariant::Esp32 => {
            if pins::ESP32_FLASH_BUS.contains(&pin) {
                PinVerdict::FlashBus
            } else if pins::ESP32_INPUT_ONLY.contains(&pin) {
                PinVerdict::InputOnly
            } else if pins::ESP32_STRAPPING.contains(&pin) {
                PinVerdict::Strapping
            } else if pins::ESP32_CONSOLE_UART.contains(&pin) {
                PinVerdict::ConsoleUart
            } else if pin > pins::ESP32_MAX_OUTPUT_GPIO {
                PinVerdict::OutOfRange
            } else {
                PinVerdict::Safe
            }
        }
    }
}

/// `true` iff `pin` may drive the LED strip on `variant`.
pub fn is_safe(variant: HardwareVariant, pin: i32) -> bool {
    classify(variant, pin) == PinVerdict::Safe
}

/// All safe pins for `variant`, ascending. Feeds the setup form's hints.
pub fn safe_pins(variant: HardwareVariant) -> impl Iterator<Item = i32> {
    (0..=variant.max_form_pin()).filter(move |&p| is_safe(variant, p))
}
