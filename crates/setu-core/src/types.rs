//! Records returned by the Setu API.
//!
//! Only the identifying fields are typed; everything else the server sends is
//! kept verbatim in `extra` so nothing is lost when a record is displayed or
//! merged. Fields such as `status` have no fixed JSON type across responses,
//! so they are read through accessors instead of typed struct fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extra fields merged into the `POST /signature` body after `documentId`.
pub type SignatureOptions = Map<String, Value>;

/// A document created by `POST /documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Server-issued identifier.
    pub document_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// The `status` field, when it is a string.
    pub fn status(&self) -> Option<&str> {
        self.extra.get("status").and_then(Value::as_str)
    }

    /// The `url` field as sent: a link, or just a flag that one exists.
    pub fn url(&self) -> Option<&Value> {
        self.extra.get("url").filter(|v| !v.is_null())
    }
}

/// A signature workflow created by `POST /signature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    /// Server-issued identifier.
    pub signature_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignatureRequest {
    /// Page the signer completes the e-signature on.
    pub fn signature_url(&self) -> Option<&str> {
        self.extra.get("signatureUrl").and_then(Value::as_str)
    }

    /// The `status` field, when it is a string.
    pub fn status(&self) -> Option<&str> {
        self.extra.get("status").and_then(Value::as_str)
    }

    /// Shallow-merge a status response into this request.
    ///
    /// Every top-level key of `update` replaces the current value; keys the
    /// update does not mention are kept.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the merged object no longer describes a
    /// signature request (for instance `signatureId` set to a number). `self`
    /// is left untouched in that case.
    pub fn merge(&mut self, update: &StatusUpdate) -> Result<(), serde_json::Error> {
        let mut merged = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in &update.0 {
            merged.insert(key.clone(), value.clone());
        }
        *self = serde_json::from_value(Value::Object(merged))?;
        Ok(())
    }
}

/// Body of `GET /signature/{id}/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusUpdate(pub Map<String, Value>);

impl StatusUpdate {
    /// The `status` field, when it is a string.
    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }
}
