//! OTA check / install through the admin routes and the tick policy.

use lightworks::app::events::{AppEvent, RestartReason};
use lightworks::app::ota::{OtaState, SECS_PER_DAY};
use lightworks::app::ports::UpdateError;
use lightworks::app::service::{INSTALLING_TEXT, NO_UPDATE_TEXT};

use super::mock_hw::Harness;

#[test]
fn manual_check_reports_up_to_date() {
    let mut h = Harness::lamp();
    let routed = h.admin_get("/ota/check");

    assert_eq!(routed.response.status, 200);
    assert!(routed.response.body.starts_with("Up to date"), "{}", routed.response.body);
    assert_eq!(h.svc.ota().state(), OtaState::UpToDate);
    assert!(h.sink.contains(&AppEvent::OtaStateChanged {
        from: OtaState::Idle,
        to: OtaState::UpToDate
    }));
}

#[test]
fn install_replies_first_then_flashes_and_restarts() {
    let mut h = Harness::lamp();
    h.dev.offer("v9.0.0");

    let routed = h.admin_get("/ota/install");
    assert_eq!(routed.response.body, INSTALLING_TEXT);
    assert_eq!(h.dev.installs(), 0, "nothing is written before the reply");

    h.finish(&routed);
    assert_eq!(h.dev.installs(), 1);
    assert_eq!(h.dev.restarts(), 1);
    assert!(h.sink.contains(&AppEvent::RestartScheduled(RestartReason::FirmwareInstalled)));
}

#[test]
fn check_between_reply_and_install_keeps_the_promise() {
    let mut h = Harness::lamp();
    h.dev.offer("v9.0.0");
    let routed = h.admin_get("/ota/install");
    assert_eq!(routed.response.body, INSTALLING_TEXT);

    h.dev.latest = Ok(None);
    let check = h.admin_get("/ota/check");
    assert_eq!(check.response.status, 409);
    assert_eq!(h.svc.ota().state(), OtaState::Available);
    assert_eq!(h.dev.lookups(), 1);

    h.finish(&routed);
    assert_eq!(h.dev.installs(), 1);
    assert_eq!(h.dev.restarts(), 1);
}

#[test]
fn install_without_newer_release_does_nothing() {
    let mut h = Harness::lamp();
    let routed = h.admin_get("/ota/install");

    assert_eq!(routed.response.body, NO_UPDATE_TEXT);
    assert!(routed.follow_up.is_none());
    assert_eq!(h.dev.installs(), 0);
}

#[test]
fn unreachable_source_marks_failure() {
    let mut h = Harness::lamp();
    h.dev.latest = Err(UpdateError::Network);

    let routed = h.admin_get("/ota/check");
    assert_eq!(routed.response.status, 500);
    assert!(routed.response.body.contains("network error"));
    assert_eq!(h.svc.ota().state(), OtaState::Failed);

    // Failed is settled: the next check may run.
    h.dev.latest = Ok(None);
    assert_eq!(h.admin_get("/ota/check").response.status, 200);
}

#[test]
fn failed_install_does_not_restart() {
    let mut h = Harness::lamp();
    h.dev.offer("v9.0.0");
    h.dev.install = Err(UpdateError::Verify);

    let routed = h.admin_get("/ota/install");
    h.finish(&routed);

    assert_eq!(h.dev.installs(), 1);
    assert_eq!(h.dev.restarts(), 0);
    assert_eq!(h.svc.ota().state(), OtaState::Failed);
    assert!(h.svc.ota().status().message.starts_with("Install failed"));
}

#[test]
fn boot_check_runs_once_without_installing() {
    let mut h = Harness::lamp();
    h.dev.offer("v9.0.0");

    h.tick_at(3);
    h.tick_at(4);

    assert_eq!(h.dev.lookups(), 1);
    assert_eq!(h.svc.ota().state(), OtaState::Available);
    assert_eq!(h.dev.installs(), 0, "auto-update is off by default");
}

#[test]
fn auto_check_waits_for_the_interval() {
    let mut h = Harness::lamp();
    h.admin_get("/ota/settings?auto=on&days=7");

    h.tick_at(10); // boot check
    assert_eq!(h.dev.lookups(), 1);

    h.tick_at(10 + 7 * SECS_PER_DAY - 1);
    assert_eq!(h.dev.lookups(), 1);

    h.tick_at(10 + 7 * SECS_PER_DAY);
    assert_eq!(h.dev.lookups(), 2);
    assert_eq!(h.svc.ota().status().last_check, Some(10 + 7 * SECS_PER_DAY));
}

#[test]
fn auto_check_installs_what_it_finds() {
    let mut h = Harness::lamp();
    h.admin_get("/ota/settings?auto=on&days=1");
    h.tick_at(5);
    assert_eq!(h.dev.installs(), 0);

    h.dev.offer("v9.0.0");
    h.tick_at(5 + SECS_PER_DAY);
    assert_eq!(h.dev.installs(), 1);
    assert_eq!(h.dev.restarts(), 1);
}

#[test]
fn auto_off_never_checks_after_boot() {
    let mut h = Harness::lamp();
    h.tick_at(1);
    h.tick_at(365 * SECS_PER_DAY);
    assert_eq!(h.dev.lookups(), 1);
}
