//! API credentials and their persistence.
//!
//! The three credential fields are stored together as one JSON record under
//! [`CREDENTIALS_KEY`]. A missing, unreadable or corrupt record is treated as
//! "not configured": [`CredentialStore::load`] never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use setu_storage::{StorageBackend, StorageError};
use tracing::{debug, warn};

use crate::error::EsignError;

/// Storage key the credential record lives under.
pub const CREDENTIALS_KEY: &str = "setuCredentials";

/// The secret bundle required by every Setu API call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Sent as `x-client-id`.
    pub client_id: String,
    /// Sent as `x-client-secret`.
    pub client_secret: String,
    /// Sent as `x-product-instance-id`.
    pub product_instance_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("product_instance_id", &self.product_instance_id)
            .finish()
    }
}

impl Credentials {
    /// Bundle the three credential fields.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        product_instance_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            product_instance_id: product_instance_id.into(),
        }
    }

    /// Names of the fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
            ("productInstanceId", &self.product_instance_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Whether all three fields are populated.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Fail with [`EsignError::Validation`] unless all three fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`EsignError::Validation`] naming every empty field.
    pub fn ensure_complete(&self) -> Result<(), EsignError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EsignError::Validation(format!(
                "credentials are incomplete: missing {}",
                missing.join(", ")
            )))
        }
    }

    /// The client secret with all but the last four characters masked.
    pub fn masked_secret(&self) -> String {
        let chars: Vec<char> = self.client_secret.chars().collect();
        let visible = chars.len().saturating_sub(4).max(chars.len() / 2);
        let tail: String = chars[visible..].iter().collect();
        format!("{}{tail}", "*".repeat(visible))
    }
}

/// Persistence boundary for [`Credentials`], generic over the storage backend.
#[derive(Debug, Clone)]
pub struct CredentialStore<B> {
    backend: B,
}

impl<B: StorageBackend> CredentialStore<B> {
    /// Wrap a storage backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Access the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read the stored credentials.
    ///
    /// Returns `None` when nothing is stored, when the backend is unavailable
    /// or fails, and when the record is not a valid credentials document.
    pub async fn load(&self) -> Option<Credentials> {
        if !self.backend.is_available().await {
            debug!("credential storage unavailable, treating as not configured");
            return None;
        }

        let raw = match self.backend.get(CREDENTIALS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read stored credentials");
                return None;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(creds) => Some(creds),
            Err(e) => {
                warn!(error = %e, "stored credentials are corrupt, ignoring them");
                None
            }
        }
    }

    /// Serialize and persist `creds`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend is unavailable or the write
    /// fails.
    pub async fn save(&self, creds: &Credentials) -> Result<(), StorageError> {
        let json = serde_json::to_vec(creds).map_err(|e| StorageError::Write {
            key: CREDENTIALS_KEY.to_owned(),
            reason: e.to_string(),
        })?;
        self.backend.put(CREDENTIALS_KEY, &json).await?;
        debug!("credentials saved");
        Ok(())
    }

    /// Remove the stored record. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails to delete an existing
    /// record.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.backend.delete(CREDENTIALS_KEY).await?;
        debug!("credentials cleared");
        Ok(())
    }

    /// Whether a credential record is present, without parsing it.
    pub async fn is_configured(&self) -> bool {
        self.backend
            .exists(CREDENTIALS_KEY)
            .await
            .unwrap_or(false)
    }
}
