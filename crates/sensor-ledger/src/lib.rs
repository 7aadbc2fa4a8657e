//! Sensor Ledger
//!
//! Consumer side of the published payloads. Each payload is reshaped into a
//! per-sensor entry and merged into a ledger document that keeps the latest
//! reading of every sensor kind:
//!
//! ```text
//! {"type":"temp","ts":1700000000,"tempF":69.8}
//!   -> {"temp":{"ts":1700000000,"tempF":69.8}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

/// Ledger error types
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Latest temperature entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<Value>,
    #[serde(rename = "tempF", default, skip_serializing_if = "Option::is_none")]
    pub temp_f: Option<Value>,
}

/// Latest acceleration entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InertialEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Value>,
}

/// A reshaped payload ready to merge into the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerUpdate {
    Temp(TemperatureEntry),
    Imu(InertialEntry),
}

impl LedgerUpdate {
    /// Reshape a published payload.
    ///
    /// Returns `Ok(None)` for payloads of an unknown `type`. Fields absent
    /// from the payload are left out of the entry.
    pub fn from_event_data(data: &str) -> Result<Option<Self>, LedgerError> {
        let payload: Value = serde_json::from_str(data).map_err(|e| {
            error!("Invalid JSON {}", data);
            e
        })?;

        let field = |name: &str| payload.get(name).cloned();

        let update = match payload.get("type").and_then(Value::as_str) {
            Some("temp") => LedgerUpdate::Temp(TemperatureEntry {
                ts: field("ts"),
                temp_f: field("tempF"),
            }),
            Some("imu") => LedgerUpdate::Imu(InertialEntry {
                ts: field("ts"),
                x: field("x"),
                y: field("y"),
                z: field("z"),
            }),
            other => {
                debug!("Skipping payload of type {:?}", other);
                return Ok(None);
            }
        };
        Ok(Some(update))
    }

    fn key(&self) -> &'static str {
        match self {
            LedgerUpdate::Temp(_) => "temp",
            LedgerUpdate::Imu(_) => "imu",
        }
    }

    fn entry(&self) -> Result<Value, LedgerError> {
        Ok(match self {
            LedgerUpdate::Temp(entry) => serde_json::to_value(entry)?,
            LedgerUpdate::Imu(entry) => serde_json::to_value(entry)?,
        })
    }
}

/// Document holding the latest entry per sensor kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorLedger {
    data: Map<String, Value>,
}

impl SensorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an update; entries for other sensor kinds are kept
    pub fn merge(&mut self, update: &LedgerUpdate) -> Result<(), LedgerError> {
        self.data.insert(update.key().to_string(), update.entry()?);
        Ok(())
    }

    /// Reshape and merge a published payload.
    ///
    /// Returns `true` if the ledger changed.
    pub fn apply_event_data(&mut self, data: &str) -> Result<bool, LedgerError> {
        match LedgerUpdate::from_event_data(data)? {
            Some(update) => {
                self.merge(&update)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Whole ledger as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_temperature_reformat() {
        let update = LedgerUpdate::from_event_data(r#"{"type":"temp","ts":1700000000,"tempF":69.8}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            update,
            LedgerUpdate::Temp(TemperatureEntry {
                ts: Some(json!(1700000000)),
                temp_f: Some(json!(69.8)),
            })
        );
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        assert_eq!(LedgerUpdate::from_event_data(r#"{"type":"gps","ts":1}"#).unwrap(), None);
        assert_eq!(LedgerUpdate::from_event_data(r#"{"ts":1}"#).unwrap(), None);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            LedgerUpdate::from_event_data("{\"type\":"),
            Err(LedgerError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_merge_keeps_other_sensor() {
        let mut ledger = SensorLedger::new();
        assert!(ledger
            .apply_event_data(r#"{"type":"imu","ts":10,"x":0.0,"y":0.0,"z":1.0}"#)
            .unwrap());
        assert!(ledger
            .apply_event_data(r#"{"type":"temp","ts":11,"tempF":69.8}"#)
            .unwrap());

        assert_eq!(
            ledger.to_value(),
            json!({
                "imu": {"ts": 10, "x": 0.0, "y": 0.0, "z": 1.0},
                "temp": {"ts": 11, "tempF": 69.8}
            })
        );
    }

    #[test]
    fn test_merge_replaces_same_sensor() {
        let mut ledger = SensorLedger::new();
        ledger.apply_event_data(r#"{"type":"temp","ts":1,"tempF":50.0}"#).unwrap();
        ledger.apply_event_data(r#"{"type":"temp","ts":2,"tempF":51.5}"#).unwrap();

        assert_eq!(ledger.get("temp"), Some(&json!({"ts": 2, "tempF": 51.5})));
        assert!(!ledger.apply_event_data(r#"{"type":"other"}"#).unwrap());
    }

    #[test]
    fn test_missing_fields_are_left_out() {
        let update = LedgerUpdate::from_event_data(r#"{"type":"imu","ts":3,"x":1.0}"#)
            .unwrap()
            .unwrap();
        match &update {
            LedgerUpdate::Imu(entry) => {
                assert_eq!(entry.x, Some(json!(1.0)));
                assert_eq!(entry.y, None);
            }
            other => panic!("unexpected update {:?}", other),
        }

        let mut ledger = SensorLedger::new();
        ledger.merge(&update).unwrap();
        assert_eq!(ledger.get("imu"), Some(&json!({"ts": 3, "x": 1.0})));
    }

    #[test]
    fn test_explicit_null_is_kept() {
        let mut ledger = SensorLedger::new();
        ledger.apply_event_data(r#"{"type":"temp","ts":4,"tempF":null}"#).unwrap();
        assert_eq!(ledger.get("temp"), Some(&json!({"ts": 4, "tempF": null})));
    }
}
