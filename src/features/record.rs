//! Raw prediction records
//!
//! A prediction request is a flat JSON object keyed by the human field names
//! used in the results dataset. Nothing about it is guaranteed: fields may be
//! missing, mistyped or carry unseen categories. Accessors here never fail and
//! substitute the documented defaults instead.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::category::CategoricalGroup;

pub const YEAR_FIELD: &str = "Year";
pub const DISTANCE_FIELD: &str = "Distance (in meters)";

/// Year assumed when a request omits it
pub const DEFAULT_YEAR: f64 = 2024.0;
/// Distance assumed when a request omits it
pub const DEFAULT_DISTANCE: &str = "100m";

/// Unordered mapping of field names to untyped scalar values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Competition year; numeric strings are accepted
    pub fn year(&self) -> f64 {
        let year = match self.get(YEAR_FIELD) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        year.filter(|y| y.is_finite()).unwrap_or_else(|| {
            debug!("Year missing or not numeric, using {}", DEFAULT_YEAR);
            DEFAULT_YEAR
        })
    }

    /// Raw distance descriptor
    pub fn distance(&self) -> String {
        self.scalar_text(DISTANCE_FIELD)
            .unwrap_or_else(|| DEFAULT_DISTANCE.to_string())
    }

    /// Raw (not yet canonical) category value for `group`
    pub fn category(&self, group: CategoricalGroup) -> String {
        self.scalar_text(group.field())
            .unwrap_or_else(|| group.default_value().to_string())
    }

    fn scalar_text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => {
                debug!("Field '{}' is not a scalar, using default", field);
                None
            }
        }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
