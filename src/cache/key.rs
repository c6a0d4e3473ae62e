//! Structured cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::CacheError;

/// A single key field value.
///
/// Serialised with its variant tag, so `Flag(false)`, `Absent` and
/// `Text("false")` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum KeyValue {
    Text(String),
    Flag(bool),
    Int(i64),
    Absent,
}

/// Fingerprint of a synthesis request for one provider.
///
/// Field order is part of the key; providers must push fields in a fixed
/// order so that identical requests always hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheKey {
    provider: String,
    fields: Vec<(&'static str, KeyValue)>,
}

impl CacheKey {
    /// Start a key for `provider` (the discriminator, e.g. `"coqui"`).
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            fields: Vec::new(),
        }
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, KeyValue::Text(value.into())));
        self
    }

    pub fn opt_text(mut self, name: &'static str, value: Option<&str>) -> Self {
        let value = value.map_or(KeyValue::Absent, |v| KeyValue::Text(v.to_string()));
        self.fields.push((name, value));
        self
    }

    pub fn flag(mut self, name: &'static str, value: bool) -> Self {
        self.fields.push((name, KeyValue::Flag(value)));
        self
    }

    pub fn int(mut self, name: &'static str, value: i64) -> Self {
        self.fields.push((name, KeyValue::Int(value)));
        self
    }

    /// Speed multipliers are keyed in hundredths so float noise does not split slots.
    pub fn speed(mut self, name: &'static str, value: Option<f32>) -> Self {
        let value = value.map_or(KeyValue::Absent, |s| {
            KeyValue::Int((f64::from(s) * 100.0).round() as i64)
        });
        self.fields.push((name, value));
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Canonical byte form fed to the hash.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CacheError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Lower-case hex digest of the canonical form.
    pub fn digest(&self) -> Result<String, CacheError> {
        let hash = Sha256::digest(self.canonical_bytes()?);
        Ok(format!("{:x}", hash))
    }
}
