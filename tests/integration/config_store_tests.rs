//! Validate-then-commit behaviour seen from the routes, plus persistence
//! across a simulated reboot.

use lightworks::adapters::nvs::NvsAdapter;
use lightworks::app::config_store::{CONFIG_KEY, CONFIG_NAMESPACE, ConfigStore, MAX_DOCUMENT_SIZE};
use lightworks::app::events::AppEvent;
use lightworks::app::fields::{Field, FieldSet};
use lightworks::app::ports::{StorageError, StoragePort};
use lightworks::config::DeviceConfig;
use lightworks::error::PersistError;
use lightworks::platform::{AppRole, FirmwareProfile, HardwareVariant};

use super::mock_hw::{DeviceCall, Harness};

/// Copy the persisted document into a fresh store, as a reboot would see it.
fn reboot(h: &Harness) -> Harness {
    let mut buf = vec![0u8; MAX_DOCUMENT_SIZE];
    let n = h
        .svc
        .config_store()
        .storage()
        .read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf)
        .unwrap();
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.write(CONFIG_NAMESPACE, CONFIG_KEY, &buf[..n]).unwrap();
    let profile = h.svc.profile();
    Harness::with_storage(nvs, profile.variant, profile.role)
}

#[test]
fn one_bad_field_rejects_the_whole_display_form() {
    let mut h = Harness::lamp().provisioned();
    let before = h.svc.config().clone();

    let routed = h.post("/save", "airport=kmco&brightness=500&tz=EST5EDT");

    assert_eq!(routed.response.status, 400);
    assert!(routed.response.body.contains("brightness"));
    assert_eq!(h.svc.config(), &before);
    assert!(!h.dev.calls.contains(&DeviceCall::Refresh));
}

#[test]
fn display_form_commits_normalised_values() {
    let mut h = Harness::lamp().provisioned();

    let routed = h.post(
        "/save",
        "airport=+kmco+&brightness=40&sched=on&sh=6&sm=30&eh=22&em=0&tz=EST5EDT&mode=2&fp_icao=a1b2c3&fp_tail=n123ab",
    );

    assert_eq!(routed.response.status, 302);
    let lamp = h.svc.config().lamp().unwrap().clone();
    assert_eq!(lamp.airport_code, "KMCO");
    assert_eq!(lamp.brightness, 40);
    assert!(lamp.schedule.enabled);
    assert_eq!((lamp.schedule.start_hour, lamp.schedule.start_minute), (6, 30));
    assert!(!lamp.flight_pulse.enabled, "unchecked box turns the pulse off");
    assert_eq!(lamp.flight_pulse.icao, "A1B2C3");
    assert_eq!(h.dev.calls.last(), Some(&DeviceCall::Refresh));
    assert!(h.sink.contains(&AppEvent::DisplayRefresh));
}

#[test]
fn map_token_list_sets_the_strip_length() {
    let mut h = Harness::new(HardwareVariant::Esp32, AppRole::Map).provisioned();

    let routed = h.post("/save", "map_list=ktix,+kmco,VFR,,skip&brightness=80");

    assert_eq!(routed.response.status, 302);
    assert_eq!(h.svc.config().map().unwrap().tokens, "KTIX,KMCO,VFR,SKIP");
    assert_eq!(h.svc.config().led.count, 4);
    assert_eq!(h.svc.config().brightness(), 80);

    assert_eq!(h.post("/save", "map_list=KTIX,NOT-A-STATION").response.status, 400);
    assert_eq!(h.svc.config().led.count, 4);
}

#[test]
fn map_led_save_keeps_the_derived_count() {
    let mut h = Harness::new(HardwareVariant::Esp32, AppRole::Map).provisioned();
    assert_eq!(h.post("/save", "map_list=KTIX,KMCO,KSFB").response.status, 302);
    assert_eq!(h.svc.config().led.count, 3);

    let routed = h.admin_post("/admin/led/save", "pin=4&count=200&order=grb");

    assert_eq!(routed.response.status, 200);
    assert_eq!(h.svc.config().led.pin, 4);
    assert_eq!(h.svc.config().led.count, 3);
    assert_eq!(reboot(&h).svc.config().led.count, 3);
}

#[test]
fn committed_record_survives_a_reboot() {
    let mut h = Harness::lamp().provisioned();
    h.admin_post("/admin/led/save", "pin=4&count=60&order=bgr");
    h.post("/save", "airport=KSFB&brightness=70");

    let after = reboot(&h);
    assert_eq!(after.svc.config(), h.svc.config());
    assert_eq!(after.svc.config().led.count, 60);
    assert_eq!(after.dev.calls.first(), Some(&DeviceCall::ApplyLed(h.svc.config().led)));
}

#[test]
fn failed_write_keeps_the_previous_record() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.fail_writes(true);
    let mut h = Harness::with_storage(nvs, HardwareVariant::Esp32, AppRole::Lamp);
    let before = h.svc.config().clone();
    h.dev.calls.clear();

    let routed = h.admin_post("/admin/led/save", "pin=4&count=12&order=grb");

    assert_eq!(routed.response.status, 500);
    assert!(routed.response.body.starts_with("Save failed"));
    assert_eq!(h.svc.config(), &before);
    assert!(h.dev.calls.is_empty(), "wiring must not change when the save failed");
    assert!(h
        .sink
        .contains(&AppEvent::PersistFailed(PersistError::Storage(StorageError::IoError))));
}

#[test]
fn document_for_another_role_falls_back_to_default() {
    let mut nvs = NvsAdapter::new().unwrap();
    let map_doc = serde_json::to_vec(&DeviceConfig::factory_default(AppRole::Map)).unwrap();
    nvs.write(CONFIG_NAMESPACE, CONFIG_KEY, &map_doc).unwrap();

    let store = ConfigStore::open(nvs, FirmwareProfile::new(HardwareVariant::Esp32, AppRole::Lamp));
    assert_eq!(store.current(), &DeviceConfig::factory_default(AppRole::Lamp));
}

#[test]
fn direct_commit_failure_reports_storage_error() {
    let profile = FirmwareProfile::new(HardwareVariant::Esp32C3, AppRole::Lamp);
    let mut store = ConfigStore::open(NvsAdapter::new().unwrap(), profile);
    store.storage_mut().fail_writes(true);

    let staged = store
        .validate_and_stage(&FieldSet::new().with(Field::LedCount, "8"))
        .unwrap();
    assert_eq!(
        store.commit(staged),
        Err(PersistError::Storage(StorageError::IoError))
    );
    assert_eq!(store.current().led.count, 1);
    assert_eq!(store.load(), DeviceConfig::factory_default(AppRole::Lamp));
}
