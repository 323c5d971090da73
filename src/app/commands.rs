//! Inbound commands to the application service and what it answers.
//!
//! These represent actions requested by the outside world (the HTTP
//! router today) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.  Replies stay transport-neutral; the HTTP
//! layer turns them into status codes and pages.

use super::events::RestartReason;
use super::fields::FieldSet;

/// Privileged commands. Every one passes the admin gate first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Status page.
    Status,

    /// LED wiring form.
    LedSetup,

    /// Commit pin / count / order. Pin and order are required.
    SaveLed(FieldSet),

    /// Drive the strip with a test symbol (raw, unparsed).
    TestLed(String),

    /// Restart after replying.
    Reboot,

    /// Stamp the provisioning flag and role.
    Provision(FieldSet),

    /// Query the update source now.
    OtaCheck,

    /// Check, then install if a newer release exists.
    OtaInstall,

    /// Store auto-update preferences. `days` is clamped to 1–60.
    OtaSettings { auto: bool, days: i64 },
}

/// Device-function commands, gated by provisioning rather than auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Landing page (setup page in factory mode).
    Home,

    /// Commit display settings and redraw.
    SaveDisplay(FieldSet),

    /// Redraw with fresh weather data.
    Refresh,
}

/// Pages the transport knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    AdminStatus,
    LedSetup,
}

/// Body of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Page(PageKind),
    Text(String),
    Redirect(&'static str),
}

/// Work to run after the reply has been delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    Restart(RestartReason),
    /// Install the pending release, then restart on success.
    InstallUpdate,
}

/// Reply plus optional follow-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: Reply,
    pub follow_up: Option<FollowUp>,
}

impl Outcome {
    pub fn page(kind: PageKind) -> Self {
        Self {
            reply: Reply::Page(kind),
            follow_up: None,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(body.into()),
            follow_up: None,
        }
    }

    pub fn redirect(location: &'static str) -> Self {
        Self {
            reply: Reply::Redirect(location),
            follow_up: None,
        }
    }

    #[must_use]
    pub fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}
