//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the config store, the admin gate, the provisioning
//! gate and the OTA controller.  Every request and every control tick goes
//! through it, so each of those has exactly one writer.  All I/O flows
//! through port traits injected at call sites, making the whole service
//! testable with mock adapters.
//!
//! ```text
//!   AdminCommand ──▶ AdminGate ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  DeviceCommand ──▶ Provisioning ─│        AppService        │
//!           tick ─────────────────▶│ ConfigStore · OtaControl │ ──▶ DevicePorts
//!                                  └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::DeviceConfig;
use crate::error::{Error, ValidationError};
use crate::platform::FirmwareProfile;

use super::admin_gate::{AdminGate, Credentials};
use super::commands::{AdminCommand, DeviceCommand, FollowUp, Outcome, PageKind};
use super::config_store::ConfigStore;
use super::events::{AppEvent, RestartReason};
use super::fields::{Field, FieldSet};
use super::led_test;
use super::ota::{OtaController, OtaState};
use super::ports::{DevicePorts, EventSink, StoragePort, UpdateSourcePort};
use super::provisioning::{DeviceMode, ProvisioningGate};

/// Reply to `/ota/install` when the check found nothing newer.
pub const NO_UPDATE_TEXT: &str = "No update available";
/// Reply to `/ota/install` right before the install runs.
pub const INSTALLING_TEXT: &str = "Installing update... device will reboot.";

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<S: StoragePort> {
    config: ConfigStore<S>,
    admin: AdminGate,
    provisioning: ProvisioningGate,
    ota: OtaController,
}

impl<S: StoragePort> AppService<S> {
    pub fn new(config: ConfigStore<S>, admin: AdminGate) -> Self {
        let profile = *config.profile();
        Self {
            provisioning: ProvisioningGate::new(profile.role),
            ota: OtaController::new(&profile),
            config,
            admin,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Push the loaded LED wiring to the display and announce the mode.
    pub fn start(&mut self, dev: &mut impl DevicePorts, sink: &mut impl EventSink) {
        dev.apply_led_config(&self.config.current().led);
        let profile = self.profile();
        let mode = self.mode();
        sink.emit(&AppEvent::Started {
            mode,
            role: profile.role,
            variant: profile.variant,
        });
        info!(
            "AppService started: {} on {} in {:?} mode",
            profile.role, profile.variant, mode
        );
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &DeviceConfig {
        self.config.current()
    }

    pub fn config_store(&self) -> &ConfigStore<S> {
        &self.config
    }

    pub fn ota(&self) -> &OtaController {
        &self.ota
    }

    pub fn profile(&self) -> FirmwareProfile {
        *self.config.profile()
    }

    pub fn mode(&self) -> DeviceMode {
        self.provisioning.mode(self.config.current())
    }

    /// `WWW-Authenticate` value for a rejected admin request.
    pub fn auth_challenge(&self) -> String {
        self.admin.challenge()
    }

    // ── Privileged commands ───────────────────────────────────

    /// Run an admin command. Nothing happens unless `credentials` pass.
    pub fn handle_admin(
        &mut self,
        cmd: AdminCommand,
        credentials: Option<&Credentials>,
        now: u64,
        dev: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) -> Result<Outcome, Error> {
        if !self.admin.authorize(credentials) {
            sink.emit(&AppEvent::AuthRejected);
            return Err(Error::AuthRequired);
        }

        match cmd {
            AdminCommand::Status => Ok(Outcome::page(PageKind::AdminStatus)),
            AdminCommand::LedSetup => Ok(Outcome::page(PageKind::LedSetup)),
            AdminCommand::SaveLed(fields) => {
                for required in [Field::LedPin, Field::ColorOrder] {
                    if !fields.contains(required) {
                        let e = ValidationError::new(required, "required");
                        sink.emit(&AppEvent::ConfigRejected(e));
                        return Err(e.into());
                    }
                }
                self.stage_and_commit(&fields, sink)?;
                dev.apply_led_config(&self.config.current().led);
                Ok(Outcome::text("Saved"))
            }
            AdminCommand::TestLed(raw) => {
                let symbol = led_test::apply(&raw, dev)?;
                sink.emit(&AppEvent::LedTest(symbol));
                Ok(Outcome::text("OK"))
            }
            AdminCommand::Reboot => {
                Ok(Outcome::text("Rebooting...").then(FollowUp::Restart(RestartReason::AdminRequest)))
            }
            AdminCommand::Provision(fields) => {
                self.stage_and_commit(&fields, sink)?;
                Ok(Outcome::text(match self.mode() {
                    DeviceMode::Configured => "Provisioned",
                    DeviceMode::Factory => "Saved (factory mode)",
                }))
            }
            AdminCommand::OtaCheck => {
                self.run_check(now, dev, sink)?;
                Ok(Outcome::text(self.ota.status().message.as_str()))
            }
            AdminCommand::OtaInstall => {
                if !self.ota.install_queued() {
                    self.run_check(now, dev, sink)?;
                }
                if self.ota.queue_install().is_ok() {
                    Ok(Outcome::text(INSTALLING_TEXT).then(FollowUp::InstallUpdate))
                } else {
                    Ok(Outcome::text(NO_UPDATE_TEXT))
                }
            }
            AdminCommand::OtaSettings { auto, days } => {
                let fields = FieldSet::new()
                    .with(Field::OtaAutoUpdate, if auto { "on" } else { "off" })
                    .with(Field::OtaIntervalDays, days.clamp(1, 60).to_string());
                self.stage_and_commit(&fields, sink)?;
                Ok(Outcome::text("Saved"))
            }
        }
    }

    // ── Device-function commands ──────────────────────────────

    /// Run a display command. Mutating ones need a provisioned unit.
    pub fn handle_device(
        &mut self,
        cmd: DeviceCommand,
        dev: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) -> Result<Outcome, Error> {
        match cmd {
            DeviceCommand::Home => Ok(Outcome::page(PageKind::Home)),
            DeviceCommand::SaveDisplay(fields) => {
                self.require_operational(sink)?;
                self.stage_and_commit(&fields, sink)?;
                dev.refresh_now();
                sink.emit(&AppEvent::DisplayRefresh);
                Ok(Outcome::redirect("/"))
            }
            DeviceCommand::Refresh => {
                self.require_operational(sink)?;
                dev.refresh_now();
                sink.emit(&AppEvent::DisplayRefresh);
                Ok(Outcome::text("OK"))
            }
        }
    }

    // ── Follow-ups ────────────────────────────────────────────

    /// Run work deferred until after the reply was sent.
    pub fn run_follow_up(
        &mut self,
        follow_up: FollowUp,
        dev: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        match follow_up {
            FollowUp::Restart(reason) => {
                sink.emit(&AppEvent::RestartScheduled(reason));
                dev.restart();
            }
            FollowUp::InstallUpdate => {
                let from = self.ota.state();
                let result = self.ota.install(dev);
                self.emit_ota_change(from, sink);
                match result {
                    Ok(()) => {
                        sink.emit(&AppEvent::RestartScheduled(RestartReason::FirmwareInstalled));
                        dev.restart();
                    }
                    Err(e) => warn!("OTA: install aborted: {}", e),
                }
            }
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Evaluate the boot check and the auto-check policy.
    ///
    /// With auto-update on, a check that finds a newer release installs it
    /// and restarts straight away.
    pub fn tick(&mut self, now: u64, dev: &mut impl DevicePorts, sink: &mut impl EventSink) {
        let prefs = self.config.current().ota;
        let trigger = if self.ota.boot_check_due(&prefs) {
            "boot"
        } else if self.ota.auto_check_due(&prefs, now) {
            "schedule"
        } else {
            return;
        };

        info!("OTA: {} check at uptime {}s", trigger, now);
        let result = self.run_check(now, dev, sink);
        if prefs.auto_update && result == Ok(OtaState::Available) {
            info!("OTA: auto-update enabled, installing");
            self.run_follow_up(FollowUp::InstallUpdate, dev, sink);
        }
    }

    // ── Internals ─────────────────────────────────────────────

    fn stage_and_commit(&mut self, fields: &FieldSet, sink: &mut impl EventSink) -> Result<(), Error> {
        let staged = self.config.validate_and_stage(fields).inspect_err(|e| {
            warn!("config rejected: {}", e);
            sink.emit(&AppEvent::ConfigRejected(*e));
        })?;
        self.config.commit(staged).inspect_err(|e| {
            sink.emit(&AppEvent::PersistFailed(*e));
        })?;
        sink.emit(&AppEvent::ConfigCommitted);
        Ok(())
    }

    fn require_operational(&self, sink: &mut impl EventSink) -> Result<(), Error> {
        self.provisioning
            .require_operational(self.config.current())
            .inspect_err(|_| sink.emit(&AppEvent::NotProvisioned))
    }

    fn run_check(
        &mut self,
        now: u64,
        source: &mut impl UpdateSourcePort,
        sink: &mut impl EventSink,
    ) -> Result<OtaState, Error> {
        let from = self.ota.state();
        let result = self.ota.check(now, source);
        self.emit_ota_change(from, sink);
        result.map_err(Error::from)
    }

    fn emit_ota_change(&self, from: OtaState, sink: &mut impl EventSink) {
        let to = self.ota.state();
        if from != to {
            sink.emit(&AppEvent::OtaStateChanged { from, to });
        }
    }
}
