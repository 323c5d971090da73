//! Addressable LED strip adapter (WS2812-class, one data pin).
//!
//! Implements [`ActuatorPort`] and [`DisplayPort`].  Callers always speak
//! logical red/green/blue; the configured [`ColorOrder`] is applied here,
//! just before the bytes hit the wire.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the WS2812 timing through an RMT TX channel.  The
//! driver is rebuilt whenever the pin, length or order changes.
//! On host/test: keeps the last frame in memory only.
//!
//! [`ColorOrder`]: crate::config::ColorOrder

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ActuatorPort, DisplayPort};
use crate::config::LedConfig;

/// Strip state shared by both targets.
pub struct LedStrip {
    config: LedConfig,
    /// Wire-order bytes for every pixel of the last frame.
    frame: Vec<[u8; 3]>,
    refresh_requested: bool,
    #[cfg(target_os = "espidf")]
    tx: Option<esp_idf_hal::rmt::TxRmtDriver<'static>>,
}

impl LedStrip {
    pub fn new(config: LedConfig) -> Self {
        let mut strip = Self {
            config,
            frame: Vec::new(),
            refresh_requested: false,
            #[cfg(target_os = "espidf")]
            tx: None,
        };
        strip.rebuild();
        strip
    }

    pub fn config(&self) -> &LedConfig {
        &self.config
    }

    /// Wire-order bytes of the last frame written.
    pub fn frame(&self) -> &[[u8; 3]] {
        &self.frame
    }

    /// Consume a pending refresh request. Stands in for the display side
    /// of [`DisplayPort::refresh_now`]; tests read it to see that a refresh
    /// was asked for.
    pub fn take_refresh_request(&mut self) -> bool {
        core::mem::take(&mut self.refresh_requested)
    }

    fn fill(&mut self, r: u8, g: u8, b: u8) {
        let px = self.config.order.arrange(r, g, b);
        self.frame.clear();
        self.frame.resize(usize::from(self.config.count), px);
        self.show();
    }

    fn rebuild(&mut self) {
        self.frame = vec![[0; 3]; usize::from(self.config.count)];
        self.platform_open();
        self.show();
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_open(&mut self) {
        use esp_idf_hal::gpio::AnyOutputPin;
        use esp_idf_hal::rmt::{CHANNEL0, TxRmtDriver, config::TransmitConfig};

        // Release the channel before claiming it again.
        self.tx = None;

        // SAFETY: the strip is the only RMT user and owns CHANNEL0; the pin
        // was checked against the safety policy before it reached the record.
        let (channel, pin) = unsafe { (CHANNEL0::new(), AnyOutputPin::new(self.config.pin)) };
        let conf = TransmitConfig::new().clock_divider(1);
        match TxRmtDriver::new(channel, pin, &conf) {
            Ok(tx) => {
                info!(
                    "LedStrip: GPIO{} x{} {}",
                    self.config.pin, self.config.count, self.config.order
                );
                self.tx = Some(tx);
            }
            Err(e) => warn!("LedStrip: RMT init on GPIO{} failed: {:?}", self.config.pin, e),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_open(&mut self) {
        info!(
            "LedStrip(sim): GPIO{} x{} {}",
            self.config.pin, self.config.count, self.config.order
        );
    }

    #[cfg(target_os = "espidf")]
    fn show(&mut self) {
        if let Some(tx) = self.tx.as_mut() {
            if let Err(e) = write_ws2812(tx, &self.frame) {
                warn!("LedStrip: write failed: {:?}", e);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn show(&mut self) {}
}

/// Encode `frame` MSB-first with WS2812 bit timings and block until sent.
#[cfg(target_os = "espidf")]
fn write_ws2812(
    tx: &mut esp_idf_hal::rmt::TxRmtDriver<'static>,
    frame: &[[u8; 3]],
) -> Result<(), esp_idf_svc::sys::EspError> {
    use core::time::Duration;
    use esp_idf_hal::rmt::{PinState, Pulse, VariableLengthSignal};

    let hz = tx.counter_clock()?;
    let t0h = Pulse::new_with_duration(hz, PinState::High, &Duration::from_nanos(350))?;
    let t0l = Pulse::new_with_duration(hz, PinState::Low, &Duration::from_nanos(800))?;
    let t1h = Pulse::new_with_duration(hz, PinState::High, &Duration::from_nanos(700))?;
    let t1l = Pulse::new_with_duration(hz, PinState::Low, &Duration::from_nanos(600))?;

    let mut signal = VariableLengthSignal::new();
    for byte in frame.iter().flatten() {
        for bit in (0..8).rev() {
            let pair = if byte & (1 << bit) != 0 {
                [&t1h, &t1l]
            } else {
                [&t0h, &t0l]
            };
            signal.push(pair)?;
        }
    }
    tx.start_blocking(&signal)
}

impl ActuatorPort for LedStrip {
    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.fill(r, g, b);
    }

    fn clear(&mut self) {
        self.fill(0, 0, 0);
    }
}

impl DisplayPort for LedStrip {
    fn apply_led_config(&mut self, led: &LedConfig) {
        if *led == self.config {
            return;
        }
        self.config = *led;
        self.rebuild();
    }

    fn refresh_now(&mut self) {
        info!("LedStrip: refresh requested");
        self.refresh_requested = true;
    }
}
