//! METAR Lightworks Firmware — Main Entry Point
//!
//! Hexagonal architecture: the HTTP server and the main loop share one
//! [`Runtime`] and never touch the domain directly.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  DeviceAdapter        LogEventSink   NvsAdapter   UptimeClock  │
//! │  (Strip+OTA+Reset)    (EventSink)    (Storage)    (clock)      │
//! │  HttpServer           WiFi (STA / SoftAP)                      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ConfigStore · AdminGate · Provisioning · OTA          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use lightworks::adapters::device::DeviceAdapter;
use lightworks::adapters::http_server;
use lightworks::adapters::nvs::NvsAdapter;
use lightworks::adapters::strip::LedStrip;
use lightworks::adapters::time::UptimeClock;
use lightworks::adapters::update_source::{DEFAULT_RELEASES_URL, GithubUpdateSource};
use lightworks::adapters::wifi::{self, NetworkMode};
use lightworks::app::admin_gate::{AdminGate, DEFAULT_ADMIN_PASS, DEFAULT_ADMIN_USER};
use lightworks::app::config_store::ConfigStore;
use lightworks::app::service::AppService;
use lightworks::platform::FirmwareProfile;
use lightworks::runtime::{self, Runtime};

/// Control loop period.
const TICK_MS: u64 = 1000;

const ADMIN_USER: &str = match option_env!("LIGHTWORKS_ADMIN_USER") {
    Some(user) => user,
    None => DEFAULT_ADMIN_USER,
};
const ADMIN_PASS: &str = match option_env!("LIGHTWORKS_ADMIN_PASS") {
    Some(pass) => pass,
    None => DEFAULT_ADMIN_PASS,
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let profile = FirmwareProfile::running();
    info!("╔══════════════════════════════════════╗");
    info!("║  METAR Lightworks v{:<18}║", profile.version);
    info!("╚══════════════════════════════════════╝");
    info!("Role {} on {} (asset {})", profile.role, profile.variant, profile.asset_name());

    // ── 1b. Confirm this image ────────────────────────────────
    // A freshly installed image that got this far boots again next time.
    if let Err(e) = esp_ota::mark_app_valid() {
        warn!("OTA: mark_app_valid failed: {:?}", e);
    }

    // ── 2. Config from NVS (or defaults) ──────────────────────
    let nvs = NvsAdapter::new()
        .map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let store = ConfigStore::open(nvs, profile);
    let config = store.current().clone();
    if ADMIN_PASS == DEFAULT_ADMIN_PASS {
        warn!("Admin: factory password in use");
    }

    // ── 3. Construct adapters ─────────────────────────────────
    let device = DeviceAdapter::new(
        LedStrip::new(config.led),
        GithubUpdateSource::new(DEFAULT_RELEASES_URL, profile.version),
    );
    let service = AppService::new(store, AdminGate::new(ADMIN_USER, ADMIN_PASS));
    let mut rt = Runtime::new(service, device, UptimeClock::new());
    rt.start();

    // ── 4. Network ────────────────────────────────────────────
    let peripherals = esp_idf_svc::hal::peripherals::Peripherals::take()?;
    let sys_loop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
    let wifi_nvs = esp_idf_svc::nvs::EspDefaultNvsPartition::take().ok();
    let (_wifi, network) = wifi::bring_up(
        peripherals.modem,
        sys_loop,
        wifi_nvs,
        &config.identity,
        profile.role.default_device_name(),
    )?;
    match &network {
        NetworkMode::Station { ssid } => info!("Network: station on '{}'", ssid),
        NetworkMode::SoftAp { ssid } => info!("Network: SoftAP '{}' (setup pages at 192.168.4.1)", ssid),
    }

    // ── 5. HTTP admin surface ─────────────────────────────────
    let shared = rt.into_shared();
    let _server = http_server::start(shared.clone())?;

    // ── 6. Main loop ──────────────────────────────────────────
    info!("Entering main loop");
    loop {
        runtime::lock(&shared).tick();
        std::thread::sleep(std::time::Duration::from_millis(TICK_MS));
    }
}
