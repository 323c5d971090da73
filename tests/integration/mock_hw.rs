//! Mock device adapter and harness for integration tests.
//!
//! Records every strip and display call, serves scripted release lookups
//! and counts restarts, so tests can assert on the full side-effect
//! history without touching real GPIO, flash or network.

use lightworks::adapters::nvs::NvsAdapter;
use lightworks::app::admin_gate::{AdminGate, Credentials};
use lightworks::app::config_store::ConfigStore;
use lightworks::app::events::AppEvent;
use lightworks::app::ports::{
    ActuatorPort, DisplayPort, EventSink, ReleaseInfo, SystemPort, UpdateError, UpdateSourcePort,
};
use lightworks::app::service::AppService;
use lightworks::config::LedConfig;
use lightworks::http::{self, HttpRequest, Routed};
use lightworks::platform::{AppRole, FirmwareProfile, HardwareVariant};

pub const USER: &str = "admin";
pub const PASS: &str = "hangar-42";

// ── Device call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    SetColor { r: u8, g: u8, b: u8 },
    Clear,
    ApplyLed(LedConfig),
    Refresh,
    Latest,
    Install(String),
    Restart,
}

// ── MockDevice ────────────────────────────────────────────────

pub struct MockDevice {
    pub calls: Vec<DeviceCall>,
    /// Answer to the next `latest` lookups.
    pub latest: Result<Option<ReleaseInfo>, UpdateError>,
    /// Answer to the next `install` calls.
    pub install: Result<(), UpdateError>,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            latest: Ok(None),
            install: Ok(()),
        }
    }

    /// Serve `tag` as a newer release.
    pub fn offer(&mut self, tag: &str) {
        self.latest = Ok(Some(release(tag)));
    }

    pub fn count(&self, call: &DeviceCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn restarts(&self) -> usize {
        self.count(&DeviceCall::Restart)
    }

    pub fn installs(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::Install(_)))
            .count()
    }

    pub fn lookups(&self) -> usize {
        self.count(&DeviceCall::Latest)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

pub fn release(tag: &str) -> ReleaseInfo {
    ReleaseInfo {
        version: tag.try_into().unwrap(),
        url: format!("https://example.invalid/{tag}/image.bin"),
        size: 65_536,
    }
}

impl ActuatorPort for MockDevice {
    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.calls.push(DeviceCall::SetColor { r, g, b });
    }

    fn clear(&mut self) {
        self.calls.push(DeviceCall::Clear);
    }
}

impl DisplayPort for MockDevice {
    fn apply_led_config(&mut self, led: &LedConfig) {
        self.calls.push(DeviceCall::ApplyLed(*led));
    }

    fn refresh_now(&mut self) {
        self.calls.push(DeviceCall::Refresh);
    }
}

impl UpdateSourcePort for MockDevice {
    fn latest(&mut self, _asset_name: &str) -> Result<Option<ReleaseInfo>, UpdateError> {
        self.calls.push(DeviceCall::Latest);
        self.latest.clone()
    }

    fn install(&mut self, release: &ReleaseInfo) -> Result<(), UpdateError> {
        self.calls.push(DeviceCall::Install(release.version.to_string()));
        self.install
    }
}

impl SystemPort for MockDevice {
    fn restart(&mut self) {
        self.calls.push(DeviceCall::Restart);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

/// Service plus mocks, driven through the HTTP router.
pub struct Harness {
    pub svc: AppService<NvsAdapter>,
    pub dev: MockDevice,
    pub sink: RecordingSink,
    pub now: u64,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(variant: HardwareVariant, role: AppRole) -> Self {
        Self::with_storage(NvsAdapter::new().unwrap(), variant, role)
    }

    pub fn with_storage(nvs: NvsAdapter, variant: HardwareVariant, role: AppRole) -> Self {
        let profile = FirmwareProfile::new(variant, role);
        let store = ConfigStore::open(nvs, profile);
        let mut h = Self {
            svc: AppService::new(store, AdminGate::new(USER, PASS)),
            dev: MockDevice::new(),
            sink: RecordingSink::default(),
            now: 0,
        };
        h.svc.start(&mut h.dev, &mut h.sink);
        h
    }

    /// A classic-ESP32 lamp.
    pub fn lamp() -> Self {
        Self::new(HardwareVariant::Esp32, AppRole::Lamp)
    }

    /// Stamp the unit for its own role through the provisioning route.
    pub fn provisioned(mut self) -> Self {
        let role = self.svc.profile().role.token();
        let routed = self.admin_post("/admin/provision", &format!("role={role}&provisioned=on"));
        assert_eq!(routed.response.status, 200, "{}", routed.response.body);
        self.sink.events.clear();
        self.dev.calls.clear();
        self
    }

    pub fn send(&mut self, req: &HttpRequest) -> Routed {
        http::dispatch(&mut self.svc, req, self.now, &mut self.dev, &mut self.sink)
    }

    pub fn get(&mut self, uri: &str) -> Routed {
        self.send(&HttpRequest::get(uri))
    }

    pub fn post(&mut self, uri: &str, body: &str) -> Routed {
        self.send(&HttpRequest::post(uri, body))
    }

    pub fn admin_get(&mut self, uri: &str) -> Routed {
        self.send(&HttpRequest::get(uri).with_authorization(&auth_header()))
    }

    pub fn admin_post(&mut self, uri: &str, body: &str) -> Routed {
        self.send(&HttpRequest::post(uri, body).with_authorization(&auth_header()))
    }

    /// Run the routed follow-up, as the server does after replying.
    pub fn finish(&mut self, routed: &Routed) {
        if let Some(follow_up) = routed.follow_up {
            self.svc.run_follow_up(follow_up, &mut self.dev, &mut self.sink);
        }
    }

    pub fn tick_at(&mut self, now: u64) {
        self.now = now;
        self.svc.tick(now, &mut self.dev, &mut self.sink);
    }
}

pub fn auth_header() -> String {
    Credentials::new(USER, PASS).to_basic_header()
}
