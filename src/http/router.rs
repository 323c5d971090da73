//! Route table and status mapping.
//!
//! | Route                         | Command                        |
//! |-------------------------------|--------------------------------|
//! | `GET  /`                      | `DeviceCommand::Home`          |
//! | `POST /save`                  | `DeviceCommand::SaveDisplay`   |
//! | `GET  /refresh`               | `DeviceCommand::Refresh`       |
//! | `GET  /admin`                 | `AdminCommand::Status`         |
//! | `GET  /admin/led`             | `AdminCommand::LedSetup`       |
//! | `POST /admin/led/save`        | `AdminCommand::SaveLed`        |
//! | `GET  /admin/led/test`        | `AdminCommand::TestLed`        |
//! | `GET  /admin/reboot, /reboot` | `AdminCommand::Reboot`         |
//! | `POST /admin/provision`       | `AdminCommand::Provision`      |
//! | `GET  /ota/check`             | `AdminCommand::OtaCheck`       |
//! | `GET  /ota/install`           | `AdminCommand::OtaInstall`     |
//! | `GET  /ota/settings`          | `AdminCommand::OtaSettings`    |
//! | anything else                 | `302 Location: /`              |

use crate::app::admin_gate::Credentials;
use crate::app::commands::{AdminCommand, DeviceCommand, FollowUp, Outcome, Reply};
use crate::app::fields::{Field, FieldSet};
use crate::app::ports::{DevicePorts, EventSink, StoragePort};
use crate::app::service::AppService;
use crate::error::Error;
use crate::platform::AppRole;

use super::form::FormData;
use super::pages::{self, PageContext};
use super::request::{HttpRequest, HttpResponse, Method};

/// Response to write now, plus work to run once it is on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub response: HttpResponse,
    pub follow_up: Option<FollowUp>,
}

enum Route {
    Device(DeviceCommand),
    Admin(AdminCommand),
    NotFound,
}

/// Route `req` through the service and build the reply.
pub fn dispatch<S: StoragePort>(
    svc: &mut AppService<S>,
    req: &HttpRequest,
    now: u64,
    dev: &mut impl DevicePorts,
    sink: &mut impl EventSink,
) -> Routed {
    let role = svc.profile().role;
    let result = match resolve(req, role) {
        Route::Device(cmd) => svc.handle_device(cmd, dev, sink),
        Route::Admin(cmd) => {
            let creds = req
                .authorization
                .as_deref()
                .and_then(Credentials::from_basic_header);
            svc.handle_admin(cmd, creds.as_ref(), now, dev, sink)
        }
        Route::NotFound => Ok(Outcome::redirect("/")),
    };

    match result {
        Ok(outcome) => Routed {
            response: reply_response(svc, outcome.reply, now),
            follow_up: outcome.follow_up,
        },
        Err(e) => Routed {
            response: error_response(svc, e),
            follow_up: None,
        },
    }
}

fn resolve(req: &HttpRequest, role: AppRole) -> Route {
    let params = req.params();
    match (req.method, req.path.as_str()) {
        (Method::Get, "/") => Route::Device(DeviceCommand::Home),
        (Method::Post, "/save") => Route::Device(DeviceCommand::SaveDisplay(display_fields(&params, role))),
        (Method::Get, "/refresh") => Route::Device(DeviceCommand::Refresh),
        (Method::Get, "/admin") => Route::Admin(AdminCommand::Status),
        (Method::Get, "/admin/led") => Route::Admin(AdminCommand::LedSetup),
        (Method::Post, "/admin/led/save") => Route::Admin(AdminCommand::SaveLed(led_fields(&params, role))),
        (Method::Get, "/admin/led/test") => {
            Route::Admin(AdminCommand::TestLed(params.get("c").unwrap_or("").to_owned()))
        }
        (Method::Get, "/admin/reboot" | "/reboot") => Route::Admin(AdminCommand::Reboot),
        (Method::Post, "/admin/provision") => Route::Admin(AdminCommand::Provision(provision_fields(&params))),
        (Method::Get, "/ota/check") => Route::Admin(AdminCommand::OtaCheck),
        (Method::Get, "/ota/install") => Route::Admin(AdminCommand::OtaInstall),
        (Method::Get, "/ota/settings") => Route::Admin(AdminCommand::OtaSettings {
            auto: params
                .get("auto")
                .is_some_and(|a| a.trim().eq_ignore_ascii_case("on")),
            days: lenient_int(params.get("days").unwrap_or("")),
        }),
        _ => Route::NotFound,
    }
}

// ── Form → FieldSet ───────────────────────────────────────────

fn copy(fields: &mut FieldSet, params: &FormData, name: &str, field: Field) {
    if let Some(v) = params.get(name) {
        fields.insert(field, v);
    }
}

/// LED wiring form. The map strip length follows its token list, so a
/// map form's `count` is ignored.
fn led_fields(params: &FormData, role: AppRole) -> FieldSet {
    let mut fields = FieldSet::new();
    copy(&mut fields, params, "pin", Field::LedPin);
    if role == AppRole::Lamp && params.get("count").is_some_and(|c| !c.trim().is_empty()) {
        copy(&mut fields, params, "count", Field::LedCount);
    }
    copy(&mut fields, params, "order", Field::ColorOrder);
    fields
}

/// Display form fields for `role`. Names the other role uses are ignored.
///
/// Browsers omit unchecked checkboxes, so a full lamp form (one carrying
/// `airport`) without `sched` or `fp` turns those switches off.
fn display_fields(params: &FormData, role: AppRole) -> FieldSet {
    let mut fields = FieldSet::new();
    match role {
        AppRole::Lamp => {
            const LAMP: [(&str, Field); 12] = [
                ("airport", Field::AirportCode),
                ("brightness", Field::Brightness),
                ("sched", Field::ScheduleEnabled),
                ("sh", Field::StartHour),
                ("sm", Field::StartMinute),
                ("eh", Field::EndHour),
                ("em", Field::EndMinute),
                ("tz", Field::Timezone),
                ("mode", Field::DisplayMode),
                ("fp", Field::FlightPulseEnabled),
                ("fp_icao", Field::FlightPulseIcao),
                ("fp_tail", Field::FlightPulseTail),
            ];
            for (name, field) in LAMP {
                copy(&mut fields, params, name, field);
            }
            if params.contains("airport") {
                for (name, field) in [("sched", Field::ScheduleEnabled), ("fp", Field::FlightPulseEnabled)] {
                    if !params.contains(name) {
                        fields.insert(field, "off");
                    }
                }
            }
        }
        AppRole::Map => {
            copy(&mut fields, params, "map_list", Field::MapTokens);
            copy(&mut fields, params, "brightness", Field::Brightness);
        }
    }
    fields
}

/// Provisioning form. Blank secrets keep the stored value.
fn provision_fields(params: &FormData) -> FieldSet {
    let mut fields = FieldSet::new();
    copy(&mut fields, params, "role", Field::Role);
    fields.insert(Field::Provisioned, params.get("provisioned").unwrap_or("off"));
    copy(&mut fields, params, "name", Field::DeviceName);
    copy(&mut fields, params, "ssid", Field::WifiSsid);
    for (name, field) in [("pass", Field::WifiPass), ("token", Field::WeatherToken)] {
        if params.get(name).is_some_and(|v| !v.is_empty()) {
            copy(&mut fields, params, name, field);
        }
    }
    fields
}

/// Leading optional sign and digits; anything else reads as 0.
fn lenient_int(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    sign * value
}

// ── Outcome → HttpResponse ────────────────────────────────────

fn reply_response<S: StoragePort>(svc: &AppService<S>, reply: Reply, now: u64) -> HttpResponse {
    match reply {
        Reply::Page(kind) => {
            let ctx = PageContext {
                config: svc.config(),
                profile: svc.profile(),
                mode: svc.mode(),
                ota: svc.ota().status(),
                uptime_secs: now,
            };
            HttpResponse::html(pages::render(kind, &ctx))
        }
        Reply::Text(body) => HttpResponse::text(200, body),
        Reply::Redirect(location) => HttpResponse::redirect(location),
    }
}

/// Map a core error onto status and body.
pub fn error_response<S: StoragePort>(svc: &AppService<S>, err: Error) -> HttpResponse {
    match err {
        Error::AuthRequired => HttpResponse::text(401, "Authentication required")
            .with_header("WWW-Authenticate", svc.auth_challenge()),
        Error::Validation(e) => HttpResponse::text(400, format!("Invalid {e}")),
        Error::Persist(e) => HttpResponse::text(500, format!("Save failed: {e}")),
        Error::NotProvisioned => HttpResponse::text(403, "Not provisioned"),
        Error::OtaTransition(e) => HttpResponse::text(409, e.to_string()),
        Error::OtaNetwork(_) => HttpResponse::text(500, svc.ota().status().message.as_str()),
        Error::InvalidSymbol => HttpResponse::text(400, err.to_string()),
    }
}
