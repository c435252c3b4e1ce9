use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Charger operating state reported at the start of each telemetry line.
///
/// Variant order matters: window summaries reduce with `max`, so the derived
/// `Ord` (declaration order) decides which state a mixed window reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PowerState {
    #[default]
    Unknown,
    PowerSupplyOff,
    BadTemperature,
    /// Actively charging via maximum power point tracking
    Mppt,
    Trickle,
    Charged,
}

impl PowerState {
    /// Map the console's status tag. Matching is exact and case-sensitive;
    /// anything unrecognised is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "MPPT" => PowerState::Mppt,
            "PS Off" => PowerState::PowerSupplyOff,
            "Trickle" => PowerState::Trickle,
            "Charged" => PowerState::Charged,
            "Bad temp" => PowerState::BadTemperature,
            _ => PowerState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::Unknown => "unknown",
            PowerState::PowerSupplyOff => "ps_off",
            PowerState::BadTemperature => "bad_temp",
            PowerState::Mppt => "mppt",
            PowerState::Trickle => "trickle",
            PowerState::Charged => "charged",
        }
    }
}

/// One parsed telemetry line. Fields the line did not carry stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    pub power_state: PowerState,
    /// Power supply input (V)
    pub ps_volts: f64,
    /// Battery terminal voltage (V)
    pub battery_volts: f64,
    /// Charge current into the battery (A)
    pub charge_amps: f64,
    /// Solar panel voltage (V)
    pub solar_volts: f64,
    /// `charge_amps * battery_volts` (W)
    pub charge_power: f64,
    /// Controller temperature (°F)
    pub temp_f: f64,
}

/// A reading stamped with the wall-clock time it came off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedReading {
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: Reading,
}

impl TimedReading {
    pub fn new(reading: Reading, received_at: DateTime<Utc>) -> Self {
        Self { received_at, reading }
    }

    pub fn now(reading: Reading) -> Self {
        Self::new(reading, Utc::now())
    }
}
