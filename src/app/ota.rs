//! OTA update controller — check / install lifecycle plus the periodic
//! auto-check policy.
//!
//! ```text
//!            check()                 newer release
//!   Idle ────────────▶ Checking ─────────────────────▶ Available
//!   UpToDate ──────▶     │  │                             │ install()
//!   Failed ────────▶     │  └── none newer ──▶ UpToDate   ▼
//!   Available ─────▶     └───── error ──────▶ Failed ◀── Installing ──▶ restart
//! ```
//!
//! `Checking` and `Installing` are blocking states: the update source call
//! runs to a terminal outcome before the controller returns.  Installation
//! is only reachable from `Available`; anything else is rejected without
//! touching the update source.  Status is not persisted; a reboot starts
//! over in `Idle`.

use core::fmt;
use core::fmt::Write as _;

use log::{info, warn};

use crate::config::OtaPrefs;
use crate::platform::{AssetName, FirmwareProfile};

use super::ports::{ReleaseInfo, UpdateError, UpdateSourcePort};

/// Seconds per day for the auto-check interval.
pub const SECS_PER_DAY: u64 = 86_400;

/// Status line capacity.
pub const STATUS_LINE_LEN: usize = 96;

/// Human-readable status shown on the admin page.
pub type StatusLine = heapless::String<STATUS_LINE_LEN>;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    /// Install requested without a pending release.
    NoUpdateAvailable,
    /// A check or install is already running.
    Busy(OtaState),
    /// The update source failed.
    Source(UpdateError),
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUpdateAvailable => write!(f, "no update available"),
            Self::Busy(state) => write!(f, "busy ({state})"),
            Self::Source(e) => write!(f, "{e}"),
        }
    }
}

// ── State machine ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaState {
    Idle,
    Checking,
    Available,
    UpToDate,
    Installing,
    Failed,
}

impl OtaState {
    /// States the auto-check policy may start from.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Idle | Self::UpToDate | Self::Failed)
    }

    /// States a manual check may start from.
    pub fn accepts_check(self) -> bool {
        self.is_settled() || self == Self::Available
    }
}

impl fmt::Display for OtaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Available => "update available",
            Self::UpToDate => "up to date",
            Self::Installing => "installing",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Snapshot read by the admin pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaStatus {
    pub state: OtaState,
    /// Uptime seconds at the end of the last completed check.
    pub last_check: Option<u64>,
    pub asset_name: AssetName,
    pub message: StatusLine,
}

// ── Controller ────────────────────────────────────────────────

/// Owner of the one [`OtaStatus`].
pub struct OtaController {
    status: OtaStatus,
    current_version: &'static str,
    pending: Option<ReleaseInfo>,
    /// An install was promised to a client and has not run yet.
    install_queued: bool,
}

impl OtaController {
    pub fn new(profile: &FirmwareProfile) -> Self {
        let mut message = StatusLine::new();
        let _ = write!(message, "Not checked yet (running v{})", profile.version);
        Self {
            status: OtaStatus {
                state: OtaState::Idle,
                last_check: None,
                asset_name: profile.asset_name(),
                message,
            },
            current_version: profile.version,
            pending: None,
            install_queued: false,
        }
    }

    pub fn status(&self) -> &OtaStatus {
        &self.status
    }

    pub fn state(&self) -> OtaState {
        self.status.state
    }

    /// Release found by the last successful check, if any.
    pub fn pending_release(&self) -> Option<&ReleaseInfo> {
        self.pending.as_ref()
    }

    /// Reserve the pending release for a deferred [`install`](Self::install).
    ///
    /// Checks are refused until the install runs, so the release the
    /// client was promised cannot be replaced or dropped in between.
    pub fn queue_install(&mut self) -> Result<(), OtaError> {
        if self.status.state != OtaState::Available || self.pending.is_none() {
            return Err(OtaError::NoUpdateAvailable);
        }
        self.install_queued = true;
        Ok(())
    }

    pub fn install_queued(&self) -> bool {
        self.install_queued
    }

    /// Query `source` for a newer release of this image's asset.
    ///
    /// Blocks until the source answers. `last_check` is stamped with `now`
    /// whatever the outcome.
    pub fn check(
        &mut self,
        now: u64,
        source: &mut impl UpdateSourcePort,
    ) -> Result<OtaState, OtaError> {
        let from = self.status.state;
        if self.install_queued || !from.accepts_check() {
            warn!("OTA: check rejected while {}", from);
            return Err(OtaError::Busy(from));
        }

        self.status.state = OtaState::Checking;
        self.pending = None;
        info!("OTA: checking for {}", self.status.asset_name);

        let result = source.latest(self.status.asset_name.as_str());
        self.status.last_check = Some(now);
        let running = self.current_version;

        match result {
            Ok(Some(release)) => {
                self.set_message(format_args!(
                    "Update available: {} (running v{})",
                    release.version, running
                ));
                info!("OTA: {} available at {}", release.version, release.url);
                self.pending = Some(release);
                self.status.state = OtaState::Available;
                Ok(OtaState::Available)
            }
            Ok(None) => {
                self.set_message(format_args!("Up to date (v{})", running));
                info!("OTA: up to date");
                self.status.state = OtaState::UpToDate;
                Ok(OtaState::UpToDate)
            }
            Err(e) => {
                self.set_message(format_args!("Check failed: {}", e));
                warn!("OTA: check failed: {}", e);
                self.status.state = OtaState::Failed;
                Err(OtaError::Source(e))
            }
        }
    }

    /// Install the pending release.
    ///
    /// Only legal from `Available`.  On `Ok` the new image is bootable and
    /// the caller is expected to restart; the controller stays in
    /// `Installing` until then.
    pub fn install(&mut self, source: &mut impl UpdateSourcePort) -> Result<(), OtaError> {
        self.install_queued = false;
        let release = match (self.status.state, self.pending.take()) {
            (OtaState::Available, Some(release)) => release,
            (state, pending) => {
                self.pending = pending;
                warn!("OTA: install rejected while {}", state);
                return Err(OtaError::NoUpdateAvailable);
            }
        };

        self.status.state = OtaState::Installing;
        self.set_message(format_args!("Installing {}...", release.version));
        info!("OTA: installing {} ({} bytes)", release.version, release.size);

        match source.install(&release) {
            Ok(()) => {
                self.set_message(format_args!("Installed {}, restarting", release.version));
                info!("OTA: {} written, boot partition switched", release.version);
                Ok(())
            }
            Err(e) => {
                self.set_message(format_args!("Install failed: {}", e));
                warn!("OTA: install failed: {}", e);
                self.status.state = OtaState::Failed;
                Err(OtaError::Source(e))
            }
        }
    }

    /// Whether the periodic policy wants a check at uptime `now`.
    ///
    /// A missing `last_check` counts from boot (uptime 0).
    pub fn auto_check_due(&self, prefs: &OtaPrefs, now: u64) -> bool {
        if !prefs.auto_update || !self.status.state.is_settled() {
            return false;
        }
        let since = self.status.last_check.unwrap_or(0);
        let interval = u64::from(prefs.interval_days) * SECS_PER_DAY;
        now.saturating_sub(since) >= interval
    }

    /// Whether the one-shot boot check is still owed.
    pub fn boot_check_due(&self, prefs: &OtaPrefs) -> bool {
        prefs.check_on_boot
            && self.status.last_check.is_none()
            && self.status.state == OtaState::Idle
    }

    fn set_message(&mut self, args: fmt::Arguments<'_>) {
        let text = args.to_string();
        self.status.message.clear();
        if self.status.message.push_str(&text).is_err() {
            let end = floor_char_boundary(&text, STATUS_LINE_LEN - 3);
            let _ = self.status.message.push_str(&text[..end]);
            let _ = self.status.message.push_str("...");
        }
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AppRole, HardwareVariant};

    /// Scripted source that counts calls.
    struct Script {
        latest: Result<Option<ReleaseInfo>, UpdateError>,
        install: Result<(), UpdateError>,
        latest_calls: u32,
        install_calls: u32,
    }

    impl Script {
        fn new(latest: Result<Option<ReleaseInfo>, UpdateError>) -> Self {
            Self {
                latest,
                install: Ok(()),
                latest_calls: 0,
                install_calls: 0,
            }
        }
    }

    impl UpdateSourcePort for Script {
        fn latest(&mut self, _asset: &str) -> Result<Option<ReleaseInfo>, UpdateError> {
            self.latest_calls += 1;
            self.latest.clone()
        }
        fn install(&mut self, _release: &ReleaseInfo) -> Result<(), UpdateError> {
            self.install_calls += 1;
            self.install
        }
    }

    fn release() -> ReleaseInfo {
        ReleaseInfo {
            version: "v9.0.0".try_into().unwrap(),
            url: "https://example.invalid/fw.bin".into(),
            size: 1024,
        }
    }

    fn controller() -> OtaController {
        OtaController::new(&FirmwareProfile::new(HardwareVariant::Esp32C3, AppRole::Map))
    }

    fn prefs(auto: bool, days: u8) -> OtaPrefs {
        OtaPrefs {
            auto_update: auto,
            interval_days: days,
            check_on_boot: false,
        }
    }

    #[test]
    fn starts_idle_with_asset_name() {
        let c = controller();
        assert_eq!(c.state(), OtaState::Idle);
        assert_eq!(c.status().asset_name.as_str(), "metar-map-esp32c3.bin");
        assert_eq!(c.status().last_check, None);
    }

    #[test]
    fn check_outcomes() {
        let mut c = controller();
        assert_eq!(c.check(10, &mut Script::new(Ok(Some(release())))), Ok(OtaState::Available));
        assert!(c.status().message.contains("v9.0.0"));

        let mut c = controller();
        assert_eq!(c.check(10, &mut Script::new(Ok(None))), Ok(OtaState::UpToDate));

        let mut c = controller();
        assert_eq!(
            c.check(10, &mut Script::new(Err(UpdateError::Network))),
            Err(OtaError::Source(UpdateError::Network))
        );
        assert_eq!(c.state(), OtaState::Failed);
        assert_eq!(c.status().last_check, Some(10));
    }

    #[test]
    fn install_requires_available() {
        let mut c = controller();
        let mut src = Script::new(Ok(None));
        assert_eq!(c.install(&mut src), Err(OtaError::NoUpdateAvailable));
        assert_eq!(src.install_calls, 0);
        assert_eq!(c.status().last_check, None);

        c.check(5, &mut src).unwrap();
        assert_eq!(c.install(&mut src), Err(OtaError::NoUpdateAvailable));
        assert_eq!(src.install_calls, 0);
        assert_eq!(c.status().last_check, Some(5));
    }

    #[test]
    fn install_success_and_failure() {
        let mut c = controller();
        let mut src = Script::new(Ok(Some(release())));
        c.check(1, &mut src).unwrap();
        assert_eq!(c.install(&mut src), Ok(()));
        assert_eq!(c.state(), OtaState::Installing);
        assert_eq!(src.install_calls, 1);

        let mut c = controller();
        src.install = Err(UpdateError::Write);
        c.check(1, &mut src).unwrap();
        assert_eq!(c.install(&mut src), Err(OtaError::Source(UpdateError::Write)));
        assert_eq!(c.state(), OtaState::Failed);
        assert!(c.pending_release().is_none());
        // recoverable
        assert_eq!(c.check(2, &mut src), Ok(OtaState::Available));
    }

    #[test]
    fn check_rejected_while_installing() {
        let mut c = controller();
        let mut src = Script::new(Ok(Some(release())));
        c.check(1, &mut src).unwrap();
        c.install(&mut src).unwrap();
        assert_eq!(c.check(2, &mut src), Err(OtaError::Busy(OtaState::Installing)));
        assert_eq!(src.latest_calls, 1);
    }

    #[test]
    fn queued_install_blocks_checks_until_it_runs() {
        let mut c = controller();
        let mut src = Script::new(Ok(Some(release())));
        c.check(1, &mut src).unwrap();
        c.queue_install().unwrap();

        src.latest = Ok(None);
        assert_eq!(c.check(2, &mut src), Err(OtaError::Busy(OtaState::Available)));
        assert_eq!(src.latest_calls, 1);
        assert!(c.pending_release().is_some());

        assert_eq!(c.install(&mut src), Ok(()));
        assert!(!c.install_queued());
        assert_eq!(src.install_calls, 1);
    }

    #[test]
    fn queue_needs_a_pending_release() {
        let mut c = controller();
        assert_eq!(c.queue_install(), Err(OtaError::NoUpdateAvailable));
        assert!(!c.install_queued());
    }

    #[test]
    fn auto_check_interval() {
        let mut c = controller();
        let p = prefs(true, 7);
        assert!(!c.auto_check_due(&p, 7 * SECS_PER_DAY - 1));
        assert!(c.auto_check_due(&p, 7 * SECS_PER_DAY));

        c.check(100, &mut Script::new(Ok(None))).unwrap();
        assert!(!c.auto_check_due(&p, 100 + 7 * SECS_PER_DAY - 1));
        assert!(c.auto_check_due(&p, 100 + 7 * SECS_PER_DAY));
        assert!(!c.auto_check_due(&prefs(false, 7), 100 + 30 * SECS_PER_DAY));
    }

    #[test]
    fn auto_check_never_from_available_or_installing() {
        let mut c = controller();
        let mut src = Script::new(Ok(Some(release())));
        c.check(0, &mut src).unwrap();
        let p = prefs(true, 1);
        assert!(!c.auto_check_due(&p, 10 * SECS_PER_DAY));
        c.install(&mut src).unwrap();
        assert!(!c.auto_check_due(&p, 10 * SECS_PER_DAY));
    }

    #[test]
    fn boot_check_owed_once() {
        let mut c = controller();
        let p = OtaPrefs::default();
        assert!(c.boot_check_due(&p));
        c.check(3, &mut Script::new(Ok(None))).unwrap();
        assert!(!c.boot_check_due(&p));
        assert!(!controller().boot_check_due(&prefs(false, 7)));
    }

    #[test]
    fn long_messages_are_truncated() {
        let mut c = controller();
        let long = "x".repeat(200);
        c.set_message(format_args!("{}", long));
        assert_eq!(c.status().message.len(), STATUS_LINE_LEN);
        assert!(c.status().message.ends_with("..."));
    }
}
