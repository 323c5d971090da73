//! Factory mode → provisioned flow through the setup and admin routes.

use lightworks::app::events::AppEvent;
use lightworks::app::provisioning::DeviceMode;
use lightworks::platform::{AppRole, HardwareVariant};

use super::mock_hw::{DeviceCall, Harness};

#[test]
fn factory_unit_serves_setup_page_but_refuses_display_changes() {
    let mut h = Harness::lamp();
    assert_eq!(h.svc.mode(), DeviceMode::Factory);

    let home = h.get("/");
    assert_eq!(home.response.status, 200);
    assert!(home.response.body.contains("Factory mode"));

    let before = h.svc.config().clone();
    let save = h.post("/save", "airport=KMCO");
    assert_eq!(save.response.status, 403);
    assert_eq!(save.response.body, "Not provisioned");
    assert_eq!(h.get("/refresh").response.status, 403);

    assert_eq!(h.svc.config(), &before);
    assert!(!h.dev.calls.contains(&DeviceCall::Refresh));
    assert!(h.sink.contains(&AppEvent::NotProvisioned));
}

#[test]
fn provisioning_unlocks_the_display_routes() {
    let mut h = Harness::lamp();

    let routed = h.admin_post("/admin/provision", "role=LAMP&provisioned=on&name=Kitchen+Lamp");
    assert_eq!(routed.response.body, "Provisioned");
    assert_eq!(h.svc.mode(), DeviceMode::Configured);
    assert_eq!(h.svc.config().role, "lamp");
    assert_eq!(h.svc.config().identity.device_name, "Kitchen Lamp");

    assert_eq!(h.post("/save", "airport=kmco").response.status, 302);
    assert_eq!(h.get("/refresh").response.body, "OK");
    assert_eq!(h.dev.count(&DeviceCall::Refresh), 2);
}

#[test]
fn stamp_for_another_role_stays_in_factory_mode() {
    let mut h = Harness::lamp();

    let routed = h.admin_post("/admin/provision", "role=map&provisioned=on");
    assert_eq!(routed.response.status, 200);
    assert_eq!(routed.response.body, "Saved (factory mode)");
    assert_eq!(h.svc.mode(), DeviceMode::Factory);
    assert_eq!(h.post("/save", "airport=KMCO").response.status, 403);
}

#[test]
fn secrets_in_the_query_string_are_not_accepted() {
    let mut h = Harness::lamp();
    let routed = h.admin_get("/admin/provision?role=lamp&provisioned=on&pass=runway-27");
    assert_eq!(routed.response.status, 302);
    assert!(!h.svc.config().provisioned);
    assert_eq!(h.svc.config().identity.wifi_pass, "");

    let page = h.admin_get("/admin").response.body;
    assert!(page.contains("<form method='POST' action='/admin/provision'>"));
}

#[test]
fn unknown_role_token_is_rejected() {
    let mut h = Harness::lamp();
    let routed = h.admin_post("/admin/provision", "role=toaster&provisioned=on");
    assert_eq!(routed.response.status, 400);
    assert!(!h.svc.config().provisioned);
}

#[test]
fn unchecked_box_deprovisions() {
    let mut h = Harness::new(HardwareVariant::Esp32, AppRole::Map).provisioned();
    assert_eq!(h.svc.mode(), DeviceMode::Configured);

    h.admin_post("/admin/provision", "role=map");
    assert_eq!(h.svc.mode(), DeviceMode::Factory);
}

#[test]
fn wifi_credentials_are_stored_and_blank_secrets_kept() {
    let mut h = Harness::lamp();

    h.admin_post("/admin/provision", "role=lamp&provisioned=on&ssid=Hangar&pass=runway-27&token=abc123");
    let id = h.svc.config().identity.clone();
    assert_eq!((id.wifi_ssid.as_str(), id.wifi_pass.as_str()), ("Hangar", "runway-27"));
    assert_eq!(id.weather_token, "abc123");

    h.admin_post("/admin/provision", "role=lamp&provisioned=on&ssid=Hangar2&pass=&token=");
    let id = h.svc.config().identity.clone();
    assert_eq!(id.wifi_ssid, "Hangar2");
    assert_eq!(id.wifi_pass, "runway-27");
    assert_eq!(id.weather_token, "abc123");
}

#[test]
fn short_wifi_password_is_refused_at_provisioning() {
    let mut h = Harness::lamp();

    let routed = h.admin_post("/admin/provision", "role=lamp&provisioned=on&ssid=Hangar&pass=1234567");

    assert_eq!(routed.response.status, 400);
    assert!(routed.response.body.contains("WiFi password"), "{}", routed.response.body);
    assert!(!h.svc.config().provisioned);
    assert_eq!(h.svc.config().identity.wifi_ssid, "");
}

#[test]
fn home_page_shows_the_role_form_once_provisioned() {
    let mut lamp = Harness::lamp().provisioned();
    let body = lamp.get("/").response.body;
    assert!(body.contains("name='airport'"));
    assert!(!body.contains("map_list"));

    let mut map = Harness::new(HardwareVariant::Esp32C3, AppRole::Map).provisioned();
    let body = map.get("/").response.body;
    assert!(body.contains("map_list"));
    assert!(!body.contains("name='airport'"));
}
