//! Per-application settings store

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Settings {
    values: RwLock<HashMap<String, Value>>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        tracing::debug!(key = %key, value = %value, "Setting updated");
        self.values.write().insert(key.to_string(), value);
    }

    pub fn enable(&self, key: &str) {
        self.set(key, true);
    }

    pub fn disable(&self, key: &str) {
        self.set(key, false);
    }

    /// Truthiness of the stored value; missing keys are disabled
    pub fn enabled(&self, key: &str) -> bool {
        self.get(key).map(|v| truthy(&v)).unwrap_or(false)
    }

    pub fn disabled(&self, key: &str) -> bool {
        !self.enabled(key)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
