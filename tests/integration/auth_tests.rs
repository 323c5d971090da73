//! Admin gate as seen through the router: every privileged route answers
//! 401 with a challenge and runs nothing without the exact credential.

use lightworks::app::admin_gate::Credentials;
use lightworks::app::events::AppEvent;
use lightworks::http::HttpRequest;

use super::mock_hw::{DeviceCall, Harness, USER};

const PRIVILEGED: [&str; 8] = [
    "/admin",
    "/admin/led",
    "/admin/led/test?c=red",
    "/admin/reboot",
    "/reboot",
    "/ota/check",
    "/ota/install",
    "/ota/settings?auto=on&days=3",
];

#[test]
fn privileged_routes_challenge_without_credentials() {
    let mut h = Harness::lamp();
    let before = h.svc.config().clone();
    h.dev.calls.clear();

    for uri in PRIVILEGED {
        let routed = h.get(uri);
        assert_eq!(routed.response.status, 401, "{uri}");
        assert!(routed.follow_up.is_none(), "{uri}");
        let challenge = routed.response.header("WWW-Authenticate").unwrap();
        assert!(challenge.starts_with("Basic realm="), "{challenge}");
    }
    let routed = h.post("/admin/provision", "role=lamp&provisioned=on");
    assert_eq!(routed.response.status, 401);

    assert!(h.dev.calls.is_empty(), "no side effect may run: {:?}", h.dev.calls);
    assert_eq!(h.svc.config(), &before);
    assert_eq!(
        h.sink.events.iter().filter(|e| **e == AppEvent::AuthRejected).count(),
        PRIVILEGED.len() + 1
    );
}

#[test]
fn wrong_password_changes_nothing() {
    let mut h = Harness::lamp();
    let before = h.svc.config().clone();
    let bad = Credentials::new(USER, "hangar-43").to_basic_header();

    let routed = h.send(&HttpRequest::post("/admin/led/save", "pin=4&order=grb").with_authorization(&bad));

    assert_eq!(routed.response.status, 401);
    assert_eq!(h.svc.config(), &before);
    assert!(!h.dev.calls.iter().any(|c| matches!(c, DeviceCall::ApplyLed(l) if l.pin == 4)));
}

#[test]
fn malformed_authorization_is_rejected() {
    let mut h = Harness::lamp();
    for header in ["Bearer abc", "Basic !!!", "Basic YWRtaW4=", ""] {
        let routed = h.send(&HttpRequest::get("/admin").with_authorization(header));
        assert_eq!(routed.response.status, 401, "{header:?}");
    }
}

#[test]
fn exact_credentials_open_the_status_page() {
    let mut h = Harness::lamp();
    let routed = h.admin_get("/admin");
    assert_eq!(routed.response.status, 200);
    assert!(routed.response.content_type.starts_with("text/html"));
    assert!(routed.response.body.contains("OTA Updates"));
}

#[test]
fn guessing_is_rate_limited() {
    let mut h = Harness::lamp();
    let bad = Credentials::new(USER, "guess").to_basic_header();
    for _ in 0..50 {
        h.send(&HttpRequest::get("/admin").with_authorization(&bad));
    }

    // The bucket is drained, so even the right password bounces for a while.
    let rejected = (0..20)
        .filter(|_| h.admin_get("/admin").response.status == 401)
        .count();
    assert!(rejected > 0, "a drained bucket must refuse some attempts");
}
