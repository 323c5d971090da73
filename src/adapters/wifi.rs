//! WiFi bring-up: station mode with the stored credentials, or a SoftAP
//! named after the device so the setup pages stay reachable.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: only the credential checks and the plan are
//!   compiled, for host-side tests.
//!
//! The decision itself ([`plan`]) is pure: station when the identity holds
//! usable credentials, SoftAP otherwise.  A station that fails to associate
//! after [`STA_CONNECT_ATTEMPTS`] tries also falls back to the SoftAP.

use core::fmt;

use crate::app::fields::WIFI_PASS_LEN;
use crate::config::Identity;

/// Station association attempts before falling back to the SoftAP.
pub const STA_CONNECT_ATTEMPTS: u32 = 3;

#[cfg(target_os = "espidf")]
const STA_RETRY_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), CredentialError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CredentialError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.is_empty() {
        return Ok(());
    }
    if !WIFI_PASS_LEN.contains(&password.len()) {
        return Err(CredentialError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Plan
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiPlan {
    /// Join `ssid`; an empty password means an open network.
    Station { ssid: String, password: String },
    /// Open our own access point.
    SoftAp { ssid: String },
}

/// Decide how to bring the network up for `identity`.
///
/// `fallback_name` names the SoftAP when the identity carries no device
/// name of its own.
pub fn plan(identity: &Identity, fallback_name: &str) -> WifiPlan {
    let ssid = identity.wifi_ssid.trim();
    if validate_ssid(ssid).is_ok() && validate_password(&identity.wifi_pass).is_ok() {
        return WifiPlan::Station {
            ssid: ssid.to_string(),
            password: identity.wifi_pass.clone(),
        };
    }
    WifiPlan::SoftAp {
        ssid: soft_ap_name(identity, fallback_name),
    }
}

/// Device name if it is a valid SSID, otherwise `fallback_name`.
pub fn soft_ap_name(identity: &Identity, fallback_name: &str) -> String {
    let name = identity.device_name.trim();
    if validate_ssid(name).is_ok() {
        name.to_string()
    } else {
        fallback_name.to_string()
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF bring-up
// ───────────────────────────────────────────────────────────────

/// Which network the device ended up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkMode {
    Station { ssid: String },
    SoftAp { ssid: String },
}

#[cfg(target_os = "espidf")]
pub fn bring_up(
    modem: esp_idf_svc::hal::modem::Modem,
    sys_loop: esp_idf_svc::eventloop::EspSystemEventLoop,
    nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
    identity: &Identity,
    fallback_name: &str,
) -> anyhow::Result<(esp_idf_svc::wifi::EspWifi<'static>, NetworkMode)> {
    use anyhow::anyhow;
    use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
    use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
    use log::{info, warn};

    let mut esp_wifi = EspWifi::new(modem, sys_loop.clone(), nvs)?;
    let mut wifi = BlockingWifi::wrap(&mut esp_wifi, sys_loop)?;

    let WifiPlan::Station { ssid, password } = plan(identity, fallback_name) else {
        warn!("WiFi: no usable credentials, starting SoftAP");
        let ap = start_soft_ap(&mut wifi, identity, fallback_name)?;
        return Ok((esp_wifi, NetworkMode::SoftAp { ssid: ap }));
    };

    let auth_method = if password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi ssid too long"))?,
        password: password
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi password too long"))?,
        auth_method,
        ..Default::default()
    }))?;
    wifi.start()?;
    info!("WiFi: connecting to '{}'", ssid);

    for attempt in 1..=STA_CONNECT_ATTEMPTS {
        match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => {
                info!("WiFi: connected on attempt {}", attempt);
                return Ok((esp_wifi, NetworkMode::Station { ssid }));
            }
            Err(e) => {
                warn!("WiFi: attempt {}/{} failed: {:?}", attempt, STA_CONNECT_ATTEMPTS, e);
                let _ = wifi.disconnect();
                std::thread::sleep(std::time::Duration::from_millis(STA_RETRY_DELAY_MS));
            }
        }
    }

    warn!("WiFi: station failed, falling back to SoftAP");
    let _ = wifi.stop();
    let ap = start_soft_ap(&mut wifi, identity, fallback_name)?;
    Ok((esp_wifi, NetworkMode::SoftAp { ssid: ap }))
}

#[cfg(target_os = "espidf")]
fn start_soft_ap(
    wifi: &mut esp_idf_svc::wifi::BlockingWifi<&mut esp_idf_svc::wifi::EspWifi<'static>>,
    identity: &Identity,
    fallback_name: &str,
) -> anyhow::Result<String> {
    use anyhow::anyhow;
    use embedded_svc::wifi::{AccessPointConfiguration, AuthMethod, Configuration};

    let ssid = soft_ap_name(identity, fallback_name);
    wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
        ssid: ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("SoftAP SSID too long"))?,
        auth_method: AuthMethod::None,
        channel: 1,
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.wait_netif_up()?;
    log::info!("WiFi: SoftAP '{}' up", ssid);
    Ok(ssid)
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
