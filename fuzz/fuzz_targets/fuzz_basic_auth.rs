//! Fuzz target: `Credentials::from_basic_header` and `AdminGate::authorize`
//!
//! Invariants checked:
//! - No panics under any header value
//! - Only the exact configured pair is ever authorized
//!
//! cargo fuzz run fuzz_basic_auth

#![no_main]

use libfuzzer_sys::fuzz_target;
use lightworks::app::admin_gate::{AdminGate, Credentials};

fuzz_target!(|data: &[u8]| {
    let header = String::from_utf8_lossy(data);
    let Some(creds) = Credentials::from_basic_header(&header) else {
        return;
    };

    let mut gate = AdminGate::new("admin", "north");
    let exact = creds.username == "admin" && creds.password == "north";
    if gate.authorize(Some(&creds)) {
        assert!(exact, "authorized a non-matching credential: {creds:?}");
    }

    // Re-encoding what was decoded must decode to the same pair.
    let again = Credentials::from_basic_header(&creds.to_basic_header());
    assert_eq!(again.as_ref(), Some(&creds));
});
