//! Device adapter — bridges the strip, the update source and the chip to
//! the domain port traits.
//!
//! One value implements every port the service drives on a request, so
//! the HTTP handlers can thread a single `&mut` through it.  On
//! non-espidf targets the restart is recorded instead of performed.

use log::info;

use crate::app::ports::{
    ActuatorPort, DisplayPort, ReleaseInfo, SystemPort, UpdateError, UpdateSourcePort,
};
use crate::config::LedConfig;

use super::strip::LedStrip;
use super::update_source::GithubUpdateSource;

/// Concrete adapter that combines all device-side I/O behind port traits.
pub struct DeviceAdapter {
    strip: LedStrip,
    updates: GithubUpdateSource,
    #[cfg(not(target_os = "espidf"))]
    restarts: u32,
}

impl DeviceAdapter {
    pub fn new(strip: LedStrip, updates: GithubUpdateSource) -> Self {
        Self {
            strip,
            updates,
            #[cfg(not(target_os = "espidf"))]
            restarts: 0,
        }
    }

    pub fn strip(&self) -> &LedStrip {
        &self.strip
    }

    pub fn strip_mut(&mut self) -> &mut LedStrip {
        &mut self.strip
    }

    pub fn updates_mut(&mut self) -> &mut GithubUpdateSource {
        &mut self.updates
    }

    /// Restarts requested so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

// ── ActuatorPort / DisplayPort ────────────────────────────────

impl ActuatorPort for DeviceAdapter {
    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.strip.set_color(r, g, b);
    }

    fn clear(&mut self) {
        self.strip.clear();
    }
}

impl DisplayPort for DeviceAdapter {
    fn apply_led_config(&mut self, led: &LedConfig) {
        self.strip.apply_led_config(led);
    }

    fn refresh_now(&mut self) {
        self.strip.refresh_now();
    }
}

// ── UpdateSourcePort ──────────────────────────────────────────

impl UpdateSourcePort for DeviceAdapter {
    fn latest(&mut self, asset_name: &str) -> Result<Option<ReleaseInfo>, UpdateError> {
        self.updates.latest(asset_name)
    }

    fn install(&mut self, release: &ReleaseInfo) -> Result<(), UpdateError> {
        self.updates.install(release)
    }
}

// ── SystemPort ────────────────────────────────────────────────

impl SystemPort for DeviceAdapter {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        info!("System: restarting");
        esp_idf_svc::hal::reset::restart();
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        info!("System(sim): restart requested");
        self.restarts += 1;
    }
}
