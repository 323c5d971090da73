//! Admin LED and maintenance routes end to end.

use lightworks::app::events::{AppEvent, RestartReason};
use lightworks::app::fields::Field;
use lightworks::config::{ColorOrder, LedConfig};
use lightworks::platform::{AppRole, HardwareVariant};

use super::mock_hw::{DeviceCall, Harness};

#[test]
fn led_save_commits_and_reapplies_wiring() {
    let mut h = Harness::lamp();
    let routed = h.admin_post("/admin/led/save", "pin=4&count=12&order=grb");

    assert_eq!(routed.response.status, 200);
    assert_eq!(routed.response.body, "Saved");
    let expected = LedConfig {
        pin: 4,
        count: 12,
        order: ColorOrder::Grb,
    };
    assert_eq!(h.svc.config().led, expected);
    assert_eq!(h.dev.calls.last(), Some(&DeviceCall::ApplyLed(expected)));
    assert!(h.sink.contains(&AppEvent::ConfigCommitted));
}

#[test]
fn flash_bus_pin_is_refused_on_classic_esp32() {
    let mut h = Harness::lamp();
    let before = h.svc.config().clone();
    h.dev.calls.clear();

    let routed = h.admin_post("/admin/led/save", "pin=6&count=12&order=grb");

    assert_eq!(routed.response.status, 400);
    assert!(routed.response.body.starts_with("Invalid led pin"), "{}", routed.response.body);
    assert_eq!(h.svc.config(), &before);
    assert!(h.dev.calls.is_empty());
    assert!(h
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::ConfigRejected(v) if v.field == Field::LedPin)));
}

#[test]
fn c3_usb_pins_are_refused_but_gpio5_is_fine() {
    let mut h = Harness::new(HardwareVariant::Esp32C3, AppRole::Lamp);
    assert_eq!(h.admin_post("/admin/led/save", "pin=19&order=rgb").response.status, 400);
    assert_eq!(h.admin_post("/admin/led/save", "pin=5&order=rgb").response.status, 200);
}

#[test]
fn led_save_requires_pin_and_order() {
    let mut h = Harness::lamp();
    let routed = h.admin_post("/admin/led/save", "pin=4&count=3");
    assert_eq!(routed.response.status, 400);
    assert!(routed.response.body.contains("required"));
    assert_eq!(h.svc.config().led.count, 1);
}

#[test]
fn led_count_is_bounded_per_role() {
    let mut lamp = Harness::lamp();
    assert_eq!(lamp.admin_post("/admin/led/save", "pin=4&count=300&order=rgb").response.status, 200);
    assert_eq!(lamp.admin_post("/admin/led/save", "pin=4&count=301&order=rgb").response.status, 400);

    let mut map = Harness::new(HardwareVariant::Esp32, AppRole::Map);
    assert_eq!(map.admin_post("/admin/led/save", "pin=4&count=251&order=rgb").response.status, 200);
    assert_eq!(map.svc.config().led.count, 1);
}

#[test]
fn wiring_test_drives_pure_primaries() {
    let mut h = Harness::lamp();
    h.dev.calls.clear();

    assert_eq!(h.admin_get("/admin/led/test?c=Red").response.body, "OK");
    assert_eq!(h.dev.calls.last(), Some(&DeviceCall::SetColor { r: 255, g: 0, b: 0 }));
    h.admin_get("/admin/led/test?c=blue");
    assert_eq!(h.dev.calls.last(), Some(&DeviceCall::SetColor { r: 0, g: 0, b: 255 }));
    h.admin_get("/admin/led/test?c=off");
    assert_eq!(h.dev.calls.last(), Some(&DeviceCall::Clear));

    let routed = h.admin_get("/admin/led/test?c=purple");
    assert_eq!(routed.response.status, 400);
    assert_eq!(h.dev.calls.len(), 3);
}

#[test]
fn led_setup_page_offers_only_safe_pins() {
    let mut h = Harness::new(HardwareVariant::Esp32C3, AppRole::Lamp);
    let body = h.admin_get("/admin/led").response.body;
    assert!(body.contains("GPIO21"));
    assert!(!body.contains("GPIO18<"));
    assert!(!body.contains("GPIO19<"));
}

#[test]
fn reboot_replies_before_restarting() {
    let mut h = Harness::lamp();
    let routed = h.admin_get("/reboot");

    assert_eq!(routed.response.body, "Rebooting...");
    assert_eq!(h.dev.restarts(), 0, "restart must wait for the reply");

    h.finish(&routed);
    assert_eq!(h.dev.restarts(), 1);
    assert!(h.sink.contains(&AppEvent::RestartScheduled(RestartReason::AdminRequest)));
}

#[test]
fn ota_settings_clamp_the_interval() {
    let mut h = Harness::lamp();

    h.admin_get("/ota/settings?auto=on&days=0");
    assert!(h.svc.config().ota.auto_update);
    assert_eq!(h.svc.config().ota.interval_days, 1);

    h.admin_get("/ota/settings?auto=ON&days=365");
    assert_eq!(h.svc.config().ota.interval_days, 60);

    h.admin_get("/ota/settings?days=14");
    assert!(!h.svc.config().ota.auto_update);
    assert_eq!(h.svc.config().ota.interval_days, 14);

    h.admin_get("/ota/settings?auto=yes&days=junk");
    assert!(!h.svc.config().ota.auto_update, "only 'on' enables auto-update");
    assert_eq!(h.svc.config().ota.interval_days, 1);
}

#[test]
fn unknown_paths_redirect_home() {
    let mut h = Harness::lamp();
    for uri in ["/favicon.ico", "/admin/", "/generate_204"] {
        let routed = h.get(uri);
        assert_eq!(routed.response.status, 302, "{uri}");
        assert_eq!(routed.response.header("Location"), Some("/"));
    }
}
