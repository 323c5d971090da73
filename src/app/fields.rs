//! Editable configuration fields and their rules.
//!
//! A submission is a [`FieldSet`]: an ordered list of `(Field, raw string)`
//! pairs.  Each raw value is parsed and normalised into a *new* typed value
//! (trimmed, case-folded) and only then written into a candidate record.
//! The same rules re-check a record loaded from flash, so a hand-edited or
//! stale document can never bypass them.
//!
//! ```text
//!   raw "  grb " ──parse──▶ ColorOrder::Grb ──check──▶ candidate.led.order
//! ```

use core::fmt;

use crate::config::{ColorOrder, DeviceConfig, DisplaySettings, LampSettings, MapSettings};
use crate::error::ValidationError;
use crate::platform::{AppRole, FirmwareProfile};
use crate::safety;

/// Longest accepted map token list (keeps the NVS document small).
pub const MAX_TOKEN_LIST_LEN: usize = 1500;
/// Longest accepted POSIX TZ string.
pub const MAX_TIMEZONE_LEN: usize = 47;
/// Highest display animation index.
pub const MAX_DISPLAY_MODE: u8 = 5;
/// Longest accepted weather API token.
pub const MAX_TOKEN_LEN: usize = 128;
/// WPA2 passphrase length. An empty password means an open network.
pub const WIFI_PASS_LEN: core::ops::RangeInclusive<usize> = 8..=64;
/// Update interval bounds in days.
pub const OTA_INTERVAL_DAYS: core::ops::RangeInclusive<u8> = 1..=60;

/// Legend tokens a map node can show instead of an airport.
const LEGEND_TOKENS: [&str; 4] = ["VFR", "MVFR", "IFR", "LIFR"];
const SKIP_TOKEN: &str = "SKIP";

// ───────────────────────────────────────────────────────────────
// Field identifiers
// ───────────────────────────────────────────────────────────────

/// Every field an admin or display form can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    LedPin,
    LedCount,
    ColorOrder,
    Brightness,
    AirportCode,
    MapTokens,
    ScheduleEnabled,
    StartHour,
    StartMinute,
    EndHour,
    EndMinute,
    Timezone,
    DisplayMode,
    FlightPulseEnabled,
    FlightPulseIcao,
    FlightPulseTail,
    OtaAutoUpdate,
    OtaIntervalDays,
    OtaCheckOnBoot,
    Provisioned,
    Role,
    DeviceName,
    WifiSsid,
    WifiPass,
    WeatherToken,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Self::LedPin => "led pin",
            Self::LedCount => "led count",
            Self::ColorOrder => "color order",
            Self::Brightness => "brightness",
            Self::AirportCode => "airport",
            Self::MapTokens => "map list",
            Self::ScheduleEnabled => "schedule",
            Self::StartHour => "start hour",
            Self::StartMinute => "start minute",
            Self::EndHour => "end hour",
            Self::EndMinute => "end minute",
            Self::Timezone => "timezone",
            Self::DisplayMode => "display mode",
            Self::FlightPulseEnabled => "flight pulse",
            Self::FlightPulseIcao => "flight pulse ICAO",
            Self::FlightPulseTail => "flight pulse tail",
            Self::OtaAutoUpdate => "auto-update",
            Self::OtaIntervalDays => "update interval",
            Self::OtaCheckOnBoot => "check on boot",
            Self::Provisioned => "provisioned",
            Self::Role => "role",
            Self::DeviceName => "device name",
            Self::WifiSsid => "WiFi SSID",
            Self::WifiPass => "WiFi password",
            Self::WeatherToken => "weather token",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// FieldSet
// ───────────────────────────────────────────────────────────────

/// Ordered set of raw submissions. Later inserts replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(Field, String)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, field: Field, raw: impl Into<String>) -> Self {
        self.insert(field, raw);
        self
    }

    pub fn insert(&mut self, field: Field, raw: impl Into<String>) {
        let raw = raw.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = raw,
            None => self.entries.push((field, raw)),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.entries.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Applying a raw field to a candidate record
// ───────────────────────────────────────────────────────────────

/// Parse `raw`, check it, and write it into `candidate`.
///
/// `candidate` is always a private clone; on error the caller discards it.
pub fn apply_field(
    candidate: &mut DeviceConfig,
    field: Field,
    raw: &str,
    profile: &FirmwareProfile,
) -> Result<(), ValidationError> {
    let role = profile.role;
    match field {
        Field::LedPin => {
            let pin = parse_int::<i32>(field, raw)?;
            candidate.led.pin = check_pin(profile, pin)?;
        }
        Field::LedCount => {
            if role == AppRole::Map {
                return Err(ValidationError::new(field, "set by the map list"));
            }
            let count = parse_int::<i64>(field, raw)?;
            candidate.led.count = check_count(role, count)?;
        }
        Field::ColorOrder => {
            candidate.led.order = raw
                .parse::<ColorOrder>()
                .map_err(|_| ValidationError::new(field, "must be one of RGB, RBG, GRB, GBR, BRG, BGR"))?;
        }
        Field::Brightness => {
            let level = check_brightness(role, parse_int::<i64>(field, raw)?)?;
            match &mut candidate.display {
                DisplaySettings::Lamp(s) => s.brightness = level,
                DisplaySettings::Map(s) => s.brightness = level,
            }
        }
        Field::AirportCode => lamp_mut(candidate, field)?.airport_code = check_airport(raw)?,
        Field::MapTokens => {
            let (tokens, count) = check_tokens(raw)?;
            map_mut(candidate, field)?.tokens = tokens;
            candidate.led.count = count;
        }
        Field::ScheduleEnabled => lamp_mut(candidate, field)?.schedule.enabled = parse_flag(field, raw)?,
        Field::StartHour => lamp_mut(candidate, field)?.schedule.start_hour = check_hour(field, raw)?,
        Field::StartMinute => lamp_mut(candidate, field)?.schedule.start_minute = check_minute(field, raw)?,
        Field::EndHour => lamp_mut(candidate, field)?.schedule.end_hour = check_hour(field, raw)?,
        Field::EndMinute => lamp_mut(candidate, field)?.schedule.end_minute = check_minute(field, raw)?,
        Field::Timezone => lamp_mut(candidate, field)?.timezone = check_timezone(raw)?,
        Field::DisplayMode => {
            let mode = parse_int::<i64>(field, raw)?;
            lamp_mut(candidate, field)?.display_mode = check_display_mode(mode)?;
        }
        Field::FlightPulseEnabled => {
            lamp_mut(candidate, field)?.flight_pulse.enabled = parse_flag(field, raw)?;
        }
        Field::FlightPulseIcao => lamp_mut(candidate, field)?.flight_pulse.icao = check_icao_hex(raw)?,
        Field::FlightPulseTail => lamp_mut(candidate, field)?.flight_pulse.tail = check_tail(raw)?,
        Field::OtaAutoUpdate => candidate.ota.auto_update = parse_flag(field, raw)?,
        Field::OtaIntervalDays => {
            candidate.ota.interval_days = check_interval_days(parse_int::<i64>(field, raw)?)?;
        }
        Field::OtaCheckOnBoot => candidate.ota.check_on_boot = parse_flag(field, raw)?,
        Field::Provisioned => candidate.provisioned = parse_flag(field, raw)?,
        Field::Role => candidate.role = check_role(raw)?,
        Field::DeviceName => candidate.identity.device_name = check_text(field, raw, 32)?,
        Field::WifiSsid => candidate.identity.wifi_ssid = check_text(field, raw, 32)?,
        Field::WifiPass => candidate.identity.wifi_pass = check_wifi_pass(raw)?,
        Field::WeatherToken => candidate.identity.weather_token = check_text(field, raw, MAX_TOKEN_LEN)?,
    }
    Ok(())
}

/// Re-check a whole record, e.g. one just read back from flash.
pub fn validate_record(cfg: &DeviceConfig, profile: &FirmwareProfile) -> Result<(), ValidationError> {
    check_pin(profile, cfg.led.pin)?;
    check_count(profile.role, i64::from(cfg.led.count))?;
    check_role(&cfg.role)?;
    check_interval_days(i64::from(cfg.ota.interval_days))?;
    check_brightness(profile.role, i64::from(cfg.brightness()))?;

    match (&cfg.display, profile.role) {
        (DisplaySettings::Lamp(lamp), AppRole::Lamp) => {
            if check_airport(&lamp.airport_code)? != lamp.airport_code {
                return Err(ValidationError::new(Field::AirportCode, "not normalised"));
            }
            let s = &lamp.schedule;
            check_hour(Field::StartHour, &s.start_hour.to_string())?;
            check_minute(Field::StartMinute, &s.start_minute.to_string())?;
            check_hour(Field::EndHour, &s.end_hour.to_string())?;
            check_minute(Field::EndMinute, &s.end_minute.to_string())?;
            check_timezone(&lamp.timezone)?;
            check_display_mode(i64::from(lamp.display_mode))?;
            check_icao_hex(&lamp.flight_pulse.icao)?;
            check_tail(&lamp.flight_pulse.tail)?;
        }
        (DisplaySettings::Map(map), AppRole::Map) => {
            check_tokens(&map.tokens)?;
        }
        _ => {
            return Err(ValidationError::new(
                Field::Role,
                "display settings belong to another firmware role",
            ));
        }
    }
    Ok(())
}

fn lamp_mut(cfg: &mut DeviceConfig, field: Field) -> Result<&mut LampSettings, ValidationError> {
    match &mut cfg.display {
        DisplaySettings::Lamp(s) => Ok(s),
        DisplaySettings::Map(_) => Err(ValidationError::new(field, "not used by this display")),
    }
}

fn map_mut(cfg: &mut DeviceConfig, field: Field) -> Result<&mut MapSettings, ValidationError> {
    match &mut cfg.display {
        DisplaySettings::Map(s) => Ok(s),
        DisplaySettings::Lamp(_) => Err(ValidationError::new(field, "not used by this display")),
    }
}

// ───────────────────────────────────────────────────────────────
// Primitive parsers
// ───────────────────────────────────────────────────────────────

fn parse_int<T: core::str::FromStr>(field: Field, raw: &str) -> Result<T, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(field, "required"));
    }
    raw.parse::<T>()
        .map_err(|_| ValidationError::new(field, "not a number"))
}

/// `on/true/1/yes` or `off/false/0/no/""`, case-insensitive.
pub fn parse_flag(field: Field, raw: &str) -> Result<bool, ValidationError> {
    let raw = raw.trim();
    const TRUE: [&str; 4] = ["on", "true", "1", "yes"];
    const FALSE: [&str; 5] = ["off", "false", "0", "no", ""];
    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(raw)) {
        Ok(true)
    } else if FALSE.iter().any(|t| t.eq_ignore_ascii_case(raw)) {
        Ok(false)
    } else {
        Err(ValidationError::new(field, "must be on or off"))
    }
}

// ───────────────────────────────────────────────────────────────
// Rules
// ───────────────────────────────────────────────────────────────

fn check_pin(profile: &FirmwareProfile, pin: i32) -> Result<i32, ValidationError> {
    match safety::classify(profile.variant, pin) {
        safety::PinVerdict::Safe => Ok(pin),
        verdict => Err(ValidationError::new(Field::LedPin, verdict.reason())),
    }
}

fn check_count(role: AppRole, count: i64) -> Result<u16, ValidationError> {
    let max = i64::from(role.max_led_count());
    if (1..=max).contains(&count) {
        Ok(count as u16)
    } else {
        Err(ValidationError::new(
            Field::LedCount,
            match role {
                AppRole::Lamp => "out of range 1-300",
                AppRole::Map => "out of range 1-250",
            },
        ))
    }
}

fn check_brightness(role: AppRole, level: i64) -> Result<u8, ValidationError> {
    let range = role.brightness_range();
    match u8::try_from(level) {
        Ok(v) if range.contains(&v) => Ok(v),
        _ => Err(ValidationError::new(
            Field::Brightness,
            match role {
                AppRole::Lamp => "out of range 3-100",
                AppRole::Map => "out of range 1-255",
            },
        )),
    }
}

fn is_station_id(token: &str) -> bool {
    (3..=4).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn check_airport(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim().to_ascii_uppercase();
    if is_station_id(&code) {
        Ok(code)
    } else {
        Err(ValidationError::new(Field::AirportCode, "must be a 3-4 letter station id"))
    }
}

/// Normalised token list plus the LED count it implies.
fn check_tokens(raw: &str) -> Result<(String, u16), ValidationError> {
    if raw.len() > MAX_TOKEN_LIST_LEN {
        return Err(ValidationError::new(Field::MapTokens, "list too long"));
    }
    let mut normalised = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let token = token.to_ascii_uppercase();
        let known = token == SKIP_TOKEN || LEGEND_TOKENS.contains(&token.as_str()) || is_station_id(&token);
        if !known {
            return Err(ValidationError::new(
                Field::MapTokens,
                "tokens must be station ids, VFR, MVFR, IFR, LIFR or SKIP",
            ));
        }
        normalised.push(token);
    }
    if normalised.is_empty() {
        return Err(ValidationError::new(Field::MapTokens, "at least one token required"));
    }
    let count = normalised.len().min(usize::from(AppRole::Map.max_led_count())) as u16;
    Ok((normalised.join(","), count))
}

fn check_hour(field: Field, raw: &str) -> Result<u8, ValidationError> {
    match parse_int::<i64>(field, raw)? {
        h @ 0..=23 => Ok(h as u8),
        _ => Err(ValidationError::new(field, "hour must be 0-23")),
    }
}

fn check_minute(field: Field, raw: &str) -> Result<u8, ValidationError> {
    match parse_int::<i64>(field, raw)? {
        m @ 0..=59 => Ok(m as u8),
        _ => Err(ValidationError::new(field, "minute must be 0-59")),
    }
}

fn check_timezone(raw: &str) -> Result<String, ValidationError> {
    let tz = raw.trim();
    if tz.is_empty() || tz.len() > MAX_TIMEZONE_LEN || !tz.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(ValidationError::new(Field::Timezone, "must be a POSIX TZ string"));
    }
    Ok(tz.to_owned())
}

/// Identity strings are stored as given, bounded and printable only.
fn check_text(field: Field, raw: &str, max: usize) -> Result<String, ValidationError> {
    if raw.len() > max {
        return Err(ValidationError::new(field, "too long"));
    }
    if !raw.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(ValidationError::new(field, "printable ASCII only"));
    }
    Ok(raw.to_owned())
}

fn check_wifi_pass(raw: &str) -> Result<String, ValidationError> {
    let pass = check_text(Field::WifiPass, raw, *WIFI_PASS_LEN.end())?;
    if !pass.is_empty() && !WIFI_PASS_LEN.contains(&pass.len()) {
        return Err(ValidationError::new(Field::WifiPass, "must be 8-64 characters"));
    }
    Ok(pass)
}

fn check_display_mode(mode: i64) -> Result<u8, ValidationError> {
    match u8::try_from(mode) {
        Ok(m) if m <= MAX_DISPLAY_MODE => Ok(m),
        _ => Err(ValidationError::new(Field::DisplayMode, "out of range 0-5")),
    }
}

fn check_icao_hex(raw: &str) -> Result<String, ValidationError> {
    let hex = raw.trim().to_ascii_uppercase();
    if hex.is_empty() || (hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit())) {
        Ok(hex)
    } else {
        Err(ValidationError::new(Field::FlightPulseIcao, "must be 6 hex digits"))
    }
}

fn check_tail(raw: &str) -> Result<String, ValidationError> {
    let tail = raw.trim().to_ascii_uppercase();
    if tail.is_empty() {
        return Ok(tail);
    }
    let rest = tail.strip_prefix('N').unwrap_or("");
    if (1..=5).contains(&rest.len()) && rest.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(tail)
    } else {
        Err(ValidationError::new(Field::FlightPulseTail, "must be an N-number"))
    }
}

fn check_interval_days(days: i64) -> Result<u8, ValidationError> {
    match u8::try_from(days) {
        Ok(d) if OTA_INTERVAL_DAYS.contains(&d) => Ok(d),
        _ => Err(ValidationError::new(Field::OtaIntervalDays, "out of range 1-60")),
    }
}

fn check_role(raw: &str) -> Result<String, ValidationError> {
    let role = raw.trim().to_ascii_lowercase();
    if role.is_empty() || role == AppRole::Lamp.token() || role == AppRole::Map.token() {
        Ok(role)
    } else {
        Err(ValidationError::new(Field::Role, "must be lamp or map"))
    }
}
