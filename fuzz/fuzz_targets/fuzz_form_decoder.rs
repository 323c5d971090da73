//! Fuzz target: `FormData::parse` and the router behind it
//!
//! Feeds arbitrary bytes as a POST body to `/save` and `/admin/led/save`.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Decoded pairs never outnumber the `&`-separated parts
//! - A rejected submission leaves the live record untouched
//!
//! cargo fuzz run fuzz_form_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use lightworks::adapters::device::DeviceAdapter;
use lightworks::adapters::log_sink::LogEventSink;
use lightworks::adapters::nvs::NvsAdapter;
use lightworks::adapters::strip::LedStrip;
use lightworks::adapters::update_source::GithubUpdateSource;
use lightworks::app::admin_gate::{AdminGate, Credentials};
use lightworks::app::config_store::ConfigStore;
use lightworks::app::service::AppService;
use lightworks::http::form::FormData;
use lightworks::http::{dispatch, HttpRequest};
use lightworks::platform::{AppRole, FirmwareProfile, HardwareVariant};

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    let form = FormData::parse(&body);
    assert!(form.len() <= body.split('&').count());

    let profile = FirmwareProfile::new(HardwareVariant::Esp32C3, AppRole::Lamp);
    let Ok(nvs) = NvsAdapter::new() else { return };
    let store = ConfigStore::open(nvs, profile);
    let mut dev = DeviceAdapter::new(
        LedStrip::new(store.current().led),
        GithubUpdateSource::new("http://local/releases", profile.version),
    );
    let mut svc = AppService::new(store, AdminGate::new("admin", "north"));
    let mut sink = LogEventSink::new();
    let auth = Credentials::new("admin", "north").to_basic_header();

    for path in ["/save", "/admin/led/save"] {
        let before = svc.config().clone();
        let req = HttpRequest::post(path, &body).with_authorization(&auth);
        let routed = dispatch(&mut svc, &req, 0, &mut dev, &mut sink);
        if routed.response.status >= 400 {
            assert_eq!(svc.config(), &before);
        }
    }
});
