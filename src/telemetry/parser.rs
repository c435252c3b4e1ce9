use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;

use crate::telemetry::types::*;

/// One complete status line: `<tag> PS=... Bat=... Sol=... Temp=...\r\n`.
/// The payload must start with `PS` followed by anything but another `S`,
/// which keeps a `PS=` field from being taken as the tag.
static LINE_RE: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?-u)^\s*(.*?)\s+(PS[^S].*)\r\n").expect("valid telemetry line regex"));

/// `key=value` where values may contain spaces (`Bat=13.20V, 2.50A`)
static PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S[^=]*)=\s*([^=]*[^= ])(\s+|$)").expect("valid field regex"));

static BAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+)V,\s+(\S+)A$").expect("valid battery regex"));

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid {field} value {value:?}")]
    InvalidField { field: &'static str, value: String },
}

fn invalid(field: &'static str, value: &str) -> TelemetryError {
    TelemetryError::InvalidField { field, value: value.to_string() }
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, TelemetryError> {
    value.trim().parse::<f64>().map_err(|_| invalid(field, value))
}

fn parse_volts(field: &'static str, value: &str) -> Result<f64, TelemetryError> {
    parse_number(field, value.strip_suffix('V').unwrap_or(value))
}

/// Split the field section of a status line into key/value pairs
pub fn parse_fields(payload: &str) -> HashMap<&str, &str> {
    PAIR_RE
        .captures_iter(payload)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect()
}

/// Build a reading from a status tag and its field section.
pub fn parse_line(tag: &str, payload: &str) -> Result<Reading, TelemetryError> {
    let fields = parse_fields(payload);
    let mut reading = Reading {
        power_state: PowerState::from_tag(tag),
        ..Reading::default()
    };

    if let Some(ps) = fields.get("PS") {
        reading.ps_volts = parse_volts("PS", ps)?;
    }

    if let Some(bat) = fields.get("Bat") {
        let caps = BAT_RE.captures(bat).ok_or_else(|| invalid("Bat", bat))?;
        reading.battery_volts = parse_number("Bat volts", &caps[1])?;
        reading.charge_amps = parse_number("Bat amps", &caps[2])?;
        reading.charge_power = reading.charge_amps * reading.battery_volts;
    }

    if let Some(sol) = fields.get("Sol") {
        reading.solar_volts = parse_volts("Sol", sol)?;
    }

    if let Some(temp) = fields.get("Temp") {
        reading.temp_f = parse_number("Temp", temp)?;
    }

    Ok(reading)
}

/// Try to take one status line off the front of `buffer`.
///
/// Returns the reading (if the line was well formed) and how many bytes the
/// line occupied. A line with an unparsable field is logged and dropped but
/// still reported as consumed, so the caller moves past it. Zero consumed
/// means no complete status line is at the front of the buffer.
pub fn try_parse(buffer: &[u8]) -> (Option<Reading>, usize) {
    let Some(caps) = LINE_RE.captures(buffer) else {
        return (None, 0);
    };
    let consumed = caps.get(0).map_or(0, |m| m.end());
    let tag = String::from_utf8_lossy(caps.get(1).map_or(&[][..], |m| m.as_bytes()));
    let payload = String::from_utf8_lossy(caps.get(2).map_or(&[][..], |m| m.as_bytes()));

    match parse_line(&tag, &payload) {
        Ok(reading) => (Some(reading), consumed),
        Err(e) => {
            log::warn!("Dropping telemetry line {:?}: {}", payload, e);
            (None, consumed)
        }
    }
}
