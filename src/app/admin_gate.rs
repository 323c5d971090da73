//! Admin credential gate — HTTP Basic auth against one shared credential.
//!
//! Every privileged route asks [`AdminGate::authorize`] first, on every
//! request.  A `false` answer means the route body never runs; the HTTP
//! layer answers `401` with a `WWW-Authenticate` challenge so the browser
//! re-prompts.
//!
//! The password is never kept in clear: the gate stores
//! `HMAC-SHA256(key, password)` and checks candidates with the
//! constant-time `hmac_sha256::HMAC::verify`.  Failed attempts draw from
//! a token bucket; once it runs dry the gate refuses every credential,
//! the right one included, for [`LOCKOUT`].  Successful logins cost
//! nothing, so a busy admin session is never throttled.

use base64::Engine as _;
use burster::Limiter;
use core::time::Duration;
use log::warn;

/// Realm shown in the browser's login prompt.
pub const ADMIN_REALM: &str = "METAR Lightworks Admin";
/// Factory username.
pub const DEFAULT_ADMIN_USER: &str = "admin";
/// Factory password.
pub const DEFAULT_ADMIN_PASS: &str = "north";

/// Key for the stored password tag. Only used to avoid holding the
/// password itself; the tag is not a secret in its own right.
const PASSWORD_TAG_KEY: &[u8] = b"lightworks-admin-v1";

/// How long the gate stays shut after the failure budget is spent.
pub const LOCKOUT: Duration = Duration::from_secs(5);

/// Longest username the gate will hold.
const MAX_USER_LEN: usize = 32;

/// Username/password pair presented by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization: Basic <base64(user:pass)>` header value.
    ///
    /// Returns `None` for any other scheme or a malformed payload.
    pub fn from_basic_header(value: &str) -> Option<Self> {
        let value = value.trim();
        let (scheme, payload) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("Basic") {
            return None;
        }
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?;
        let text = String::from_utf8(decoded).ok()?;
        let (user, pass) = text.split_once(':')?;
        Some(Self::new(user, pass))
    }

    /// Encode as an `Authorization` header value (used by tests and tools).
    pub fn to_basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }
}

/// The single shared admin credential.
pub struct AdminGate {
    username: heapless::String<MAX_USER_LEN>,
    password_tag: [u8; 32],
    limiter: burster::TokenBucket<fn() -> Duration>,
    locked_until: Option<Duration>,
}

impl AdminGate {
    /// Build a gate for `username` / `password`.
    ///
    /// Usernames longer than 32 bytes are truncated at a char boundary.
    pub fn new(username: &str, password: &str) -> Self {
        let mut user = heapless::String::new();
        for c in username.chars() {
            if user.push(c).is_err() {
                break;
            }
        }
        Self {
            username: user,
            password_tag: hmac_sha256::HMAC::mac(password.as_bytes(), PASSWORD_TAG_KEY),
            limiter: burster::TokenBucket::new_with_time_provider(
                10,
                10, // 10 failures per second, 10 burst capacity
                platform_now as fn() -> Duration,
            ),
            locked_until: None,
        }
    }

    /// Factory credential (`admin` / `north`).
    pub fn with_factory_credentials() -> Self {
        Self::new(DEFAULT_ADMIN_USER, DEFAULT_ADMIN_PASS)
    }

    /// `true` only for the exact configured credential.
    ///
    /// Missing credentials are a plain `false` (the browser's first request
    /// never carries any) and do not count as a failure.
    pub fn authorize(&mut self, credentials: Option<&Credentials>) -> bool {
        let Some(creds) = credentials else {
            return false;
        };
        let now = platform_now();
        if self.locked_until.is_some_and(|until| now < until) {
            warn!("auth: locked out, rejecting attempt");
            return false;
        }
        self.locked_until = None;

        let user_ok = creds.username == self.username.as_str();
        let pass_ok =
            hmac_sha256::HMAC::verify(creds.password.as_bytes(), PASSWORD_TAG_KEY, &self.password_tag);
        if user_ok & pass_ok {
            return true;
        }

        warn!("auth: bad credentials for user '{}'", creds.username);
        if self.limiter.try_consume(1).is_err() {
            warn!("auth: failure budget spent, locking for {:?}", LOCKOUT);
            self.locked_until = Some(now + LOCKOUT);
        }
        false
    }

    /// Value for the `WWW-Authenticate` response header.
    pub fn challenge(&self) -> String {
        format!("Basic realm=\"{ADMIN_REALM}\"")
    }
}

// ── Platform time for rate limiter ───────────────────────────

#[cfg(target_os = "espidf")]
fn platform_now() -> Duration {
    // SAFETY: esp_timer_get_time only reads the monotonic system timer,
    // which ESP-IDF starts before app_main.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(target_os = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_credentials() {
        let mut gate = AdminGate::with_factory_credentials();
        assert!(gate.authorize(Some(&Credentials::new("admin", "north"))));
    }

    #[test]
    fn rejects_wrong_or_missing_credentials() {
        let mut gate = AdminGate::with_factory_credentials();
        assert!(!gate.authorize(None));
        assert!(!gate.authorize(Some(&Credentials::new("admin", "south"))));
        assert!(!gate.authorize(Some(&Credentials::new("Admin", "north"))));
        assert!(!gate.authorize(Some(&Credentials::new("admin", ""))));
    }

    #[test]
    fn basic_header_roundtrip() {
        let creds = Credentials::new("admin", "no:rth");
        let header = creds.to_basic_header();
        assert_eq!(header, "Basic YWRtaW46bm86cnRo");
        assert_eq!(Credentials::from_basic_header(&header), Some(creds));
    }

    #[test]
    fn basic_header_rejects_other_schemes_and_garbage() {
        assert_eq!(Credentials::from_basic_header("Bearer abc"), None);
        assert_eq!(Credentials::from_basic_header("Basic !!!"), None);
        assert_eq!(Credentials::from_basic_header("Basic"), None);
        // "adminnorth" without a colon
        assert_eq!(Credentials::from_basic_header("Basic YWRtaW5ub3J0aA=="), None);
        assert!(Credentials::from_basic_header("basic YWRtaW46bm9ydGg=").is_some());
    }

    #[test]
    fn good_logins_are_never_throttled() {
        let mut gate = AdminGate::with_factory_credentials();
        let good = Credentials::new("admin", "north");
        for _ in 0..50 {
            assert!(gate.authorize(Some(&good)));
        }
    }

    #[test]
    fn spent_failure_budget_locks_out_everyone() {
        let mut gate = AdminGate::with_factory_credentials();
        let bad = Credentials::new("admin", "south");
        for _ in 0..11 {
            assert!(!gate.authorize(Some(&bad)));
        }
        assert!(gate.locked_until.is_some());
        assert!(!gate.authorize(Some(&Credentials::new("admin", "north"))));
    }

    #[test]
    fn lockout_expires() {
        let mut gate = AdminGate::with_factory_credentials();
        gate.locked_until = Some(platform_now());
        assert!(gate.authorize(Some(&Credentials::new("admin", "north"))));
        assert!(gate.locked_until.is_none());
    }

    #[test]
    fn challenge_names_realm() {
        let gate = AdminGate::with_factory_credentials();
        assert_eq!(gate.challenge(), "Basic realm=\"METAR Lightworks Admin\"");
    }
}
