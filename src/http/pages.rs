//! Minimal HTML pages for the setup and admin surface.
//!
//! Every value that came from a user or from flash goes through [`escape`]
//! before it is interpolated.

use core::fmt::Write as _;

use crate::adapters::time::format_uptime;
use crate::app::commands::PageKind;
use crate::app::ota::OtaStatus;
use crate::app::provisioning::DeviceMode;
use crate::config::{ColorOrder, DeviceConfig, DisplaySettings, LampSettings, MapSettings};
use crate::platform::{AppRole, FirmwareProfile};
use crate::safety;

/// Everything a page may show.
pub struct PageContext<'a> {
    pub config: &'a DeviceConfig,
    pub profile: FirmwareProfile,
    pub mode: DeviceMode,
    pub ota: &'a OtaStatus,
    pub uptime_secs: u64,
}

const STYLE: &str = "body{font-family:sans-serif;max-width:40em;margin:1em auto;padding:0 1em}\
label{display:block;margin-top:.6em}input,select{width:100%}\
.badge{background:#eee;padding:.2em .5em;border-radius:.3em}.small{font-size:.85em;color:#555}";

/// HTML-escape `s` for text and double-quoted attribute positions.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn render(kind: PageKind, ctx: &PageContext<'_>) -> String {
    let title = escape(&page_title(ctx));
    let mut body = String::new();
    match kind {
        PageKind::Home => home(&mut body, ctx),
        PageKind::AdminStatus => admin_status(&mut body, ctx),
        PageKind::LedSetup => led_setup(&mut body, ctx),
    }
    format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'>\
         <meta name='viewport' content='width=device-width,initial-scale=1'>\
         <title>{title}</title><style>{STYLE}</style></head><body><h2>{title}</h2>{body}</body></html>"
    )
}

fn page_title(ctx: &PageContext<'_>) -> String {
    let name = ctx.config.identity.device_name.trim();
    if name.is_empty() {
        ctx.profile.role.product_name().to_owned()
    } else {
        name.to_owned()
    }
}

// ── Home ──────────────────────────────────────────────────────

fn home(out: &mut String, ctx: &PageContext<'_>) {
    if ctx.mode == DeviceMode::Factory {
        let _ = write!(
            out,
            "<p><span class='badge'>Factory mode</span></p>\
             <p>This {} is not provisioned yet. SoftAP is running so you can reach this page.</p>\
             <p>Open <a href='/admin'>Admin</a> to set WiFi, wiring and the provisioning stamp.</p>",
            escape(ctx.profile.role.product_name())
        );
        return;
    }

    out.push_str("<form method='POST' action='/save'>");
    match &ctx.config.display {
        DisplaySettings::Lamp(lamp) => lamp_form(out, lamp),
        DisplaySettings::Map(map) => map_form(out, map),
    }
    out.push_str(
        "<p><button type='submit'>Save</button></p></form>\
         <p><a href='/refresh'>Refresh now</a> | <a href='/admin'>Admin</a></p>",
    );
}

fn number(out: &mut String, label: &str, name: &str, value: u8, min: u8, max: u8) {
    let _ = write!(
        out,
        "<label>{label}<input name='{name}' type='number' min='{min}' max='{max}' value='{value}'></label>"
    );
}

fn text(out: &mut String, label: &str, name: &str, value: &str) {
    let _ = write!(
        out,
        "<label>{label}<input name='{name}' value=\"{}\"></label>",
        escape(value)
    );
}

fn checkbox(out: &mut String, label: &str, name: &str, on: bool) {
    let checked = if on { " checked" } else { "" };
    let _ = write!(
        out,
        "<label><input name='{name}' type='checkbox' value='on' style='width:auto'{checked}> {label}</label>"
    );
}

fn lamp_form(out: &mut String, lamp: &LampSettings) {
    text(out, "Airport", "airport", &lamp.airport_code);
    number(out, "Brightness (%)", "brightness", lamp.brightness, 3, 100);
    checkbox(out, "Use on/off schedule", "sched", lamp.schedule.enabled);
    number(out, "On hour", "sh", lamp.schedule.start_hour, 0, 23);
    number(out, "On minute", "sm", lamp.schedule.start_minute, 0, 59);
    number(out, "Off hour", "eh", lamp.schedule.end_hour, 0, 23);
    number(out, "Off minute", "em", lamp.schedule.end_minute, 0, 59);
    text(out, "Timezone (POSIX TZ)", "tz", &lamp.timezone);
    number(out, "Display mode", "mode", lamp.display_mode, 0, 5);
    checkbox(out, "Flight pulse", "fp", lamp.flight_pulse.enabled);
    text(out, "Aircraft ICAO hex", "fp_icao", &lamp.flight_pulse.icao);
    text(out, "Aircraft tail number", "fp_tail", &lamp.flight_pulse.tail);
}

fn map_form(out: &mut String, map: &MapSettings) {
    let _ = write!(
        out,
        "<label>Stations, one per LED (comma separated)\
         <textarea name='map_list' rows='6' style='width:100%'>{}</textarea></label>",
        escape(&map.tokens)
    );
    number(out, "Brightness", "brightness", map.brightness, 1, 255);
}

// ── Admin ─────────────────────────────────────────────────────

fn admin_status(out: &mut String, ctx: &PageContext<'_>) {
    let cfg = ctx.config;
    let ota = ctx.ota;
    let _ = write!(
        out,
        "<p class='small'>Firmware v{} | {} on {} | uptime {}</p>\
         <p>Mode: <b>{:?}</b> (role stamp '{}')</p>\
         <p>LED: GPIO{} x{} {} | <a href='/admin/led'>LED setup</a></p>",
        escape(ctx.profile.version),
        ctx.profile.role,
        ctx.profile.variant,
        format_uptime(ctx.uptime_secs),
        ctx.mode,
        escape(&cfg.role),
        cfg.led.pin,
        cfg.led.count,
        cfg.led.order,
    );

    let _ = write!(
        out,
        "<h3>OTA Updates</h3><p><span class='badge'>{}</span></p>\
         <p class='small'>Asset: {} | Auto-update: <b>{}</b> | Interval: <b>{} days</b></p>\
         <form action='/ota/settings'>\
         <label>Auto-update<select name='auto'>\
         <option value='off'{}>OFF</option><option value='on'{}>ON</option></select></label>\
         <label>Check interval (days)<input name='days' type='number' min='1' max='60' value='{}'></label>\
         <p><button type='submit'>Save OTA Settings</button></p></form>\
         <p><a href='/ota/check'>Check now</a> | <a href='/ota/install'>Install update</a></p>",
        escape(ota.message.as_str()),
        escape(ota.asset_name.as_str()),
        if cfg.ota.auto_update { "ON" } else { "OFF" },
        cfg.ota.interval_days,
        if cfg.ota.auto_update { "" } else { " selected" },
        if cfg.ota.auto_update { " selected" } else { "" },
        cfg.ota.interval_days,
    );

    let _ = write!(
        out,
        "<h3>Provisioning</h3><form method='POST' action='/admin/provision'>\
         <label>Device name<input name='name' value=\"{}\"></label>\
         <label>WiFi SSID<input name='ssid' value=\"{}\"></label>\
         <label>WiFi password (blank keeps current)<input name='pass' type='password'></label>\
         <label>Weather token (blank keeps current)<input name='token' type='password'></label>\
         <input type='hidden' name='role' value='{}'>",
        escape(&cfg.identity.device_name),
        escape(&cfg.identity.wifi_ssid),
        ctx.profile.role.token(),
    );
    checkbox(out, "Provisioned", "provisioned", cfg.provisioned);
    out.push_str(
        "<p><button type='submit'>Save</button></p></form>\
         <p><a href='/admin/reboot'>Reboot</a> | <a href='/'>Home</a></p>",
    );
}

fn led_setup(out: &mut String, ctx: &PageContext<'_>) {
    let led = &ctx.config.led;
    let _ = write!(
        out,
        "<form method='POST' action='/admin/led/save'>\
         <label>Data pin<select name='pin'>"
    );
    for pin in safety::safe_pins(ctx.profile.variant) {
        let sel = if pin == led.pin { " selected" } else { "" };
        let _ = write!(out, "<option value='{pin}'{sel}>GPIO{pin}</option>");
    }
    out.push_str("</select></label>");
    match ctx.profile.role {
        AppRole::Lamp => {
            let _ = write!(
                out,
                "<label>LED count<input name='count' type='number' min='1' max='{}' value='{}'></label>",
                ctx.profile.role.max_led_count(),
                led.count,
            );
        }
        AppRole::Map => {
            let _ = write!(
                out,
                "<label>LED count<input type='number' value='{}' disabled></label>\
                 <p class='small'>Set by the map list on the home page.</p>",
                led.count,
            );
        }
    }
    out.push_str("<label>Color order<select name='order'>");
    for order in ColorOrder::ALL {
        let sel = if order == led.order { " selected" } else { "" };
        let _ = write!(out, "<option{sel}>{order}</option>");
    }
    out.push_str(
        "</select></label><p><button type='submit'>Save</button></p></form>\
         <p>Wiring test: <a href='/admin/led/test?c=red'>red</a> \
         <a href='/admin/led/test?c=green'>green</a> \
         <a href='/admin/led/test?c=blue'>blue</a> \
         <a href='/admin/led/test?c=off'>off</a></p>\
         <p class='small'>A red test showing green means the order is swapped.</p>\
         <p><a href='/admin'>Back</a></p>",
    );
}
