//! HTTP client for the Setu documents and signature APIs.
//!
//! Every call carries the three credential headers. Credentials and ids are
//! checked before anything goes on the wire; a non-2xx response becomes the
//! operation's own error variant with the status and raw body attached.
//! Nothing is retried.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{EsignError, HttpFailure};
use crate::types::{Document, SignatureOptions, SignatureRequest, StatusUpdate};
use crate::validation::PdfFile;

pub const HEADER_CLIENT_ID: &str = "x-client-id";
pub const HEADER_CLIENT_SECRET: &str = "x-client-secret";
pub const HEADER_PRODUCT_INSTANCE_ID: &str = "x-product-instance-id";

const JSON: &str = "application/json";

/// Setu API client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Client for the default sandbox endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EsignError::Network`] if the TLS backend cannot be set up.
    pub fn new() -> Result<Self, EsignError> {
        Self::with_config(ClientConfig::default())
    }

    /// Client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EsignError::Network`] if the TLS backend cannot be set up.
    pub fn with_config(config: ClientConfig) -> Result<Self, EsignError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a PDF as multipart field `file` to `POST /documents`.
    ///
    /// # Errors
    ///
    /// - [`EsignError::Validation`] if a credential field is empty
    /// - [`EsignError::Upload`] on a non-2xx response
    /// - [`EsignError::Network`] / [`EsignError::Decode`] on transport or body failures
    pub async fn upload_document(
        &self,
        file: &PdfFile,
        creds: &Credentials,
    ) -> Result<Document, EsignError> {
        creds.ensure_complete()?;

        let name = file.name();
        let mime_type = file.mime_type();
        let size = file.size();
        let part = Part::stream_with_length(file.body(), size)
            .file_name(name.to_owned())
            .mime_str(mime_type)
            .map_err(|e| EsignError::Validation(format!("invalid MIME type '{mime_type}': {e}")))?;
        let form = Form::new().part("file", part);

        debug!(file = %name, size, "POST /documents");
        let resp = authenticated(self.http.post(self.url("/documents")), creds)
            .multipart(form)
            .send()
            .await?;

        let doc: Document = decode(resp, EsignError::Upload).await?;
        debug!(document_id = %doc.document_id, "document uploaded");
        Ok(doc)
    }

    /// Start a signature workflow with `POST /signature`.
    ///
    /// The body is `{"documentId": ..}` followed by `options`; an option with
    /// the same key replaces the document id.
    ///
    /// # Errors
    ///
    /// - [`EsignError::Validation`] if `document_id` or a credential field is empty
    /// - [`EsignError::Signature`] on a non-2xx response
    /// - [`EsignError::Network`] / [`EsignError::Decode`] on transport or body failures
    pub async fn initiate_signature(
        &self,
        document_id: &str,
        creds: &Credentials,
        options: Option<&SignatureOptions>,
    ) -> Result<SignatureRequest, EsignError> {
        if document_id.trim().is_empty() {
            return Err(EsignError::Validation(
                "Document ID and credentials are required".to_owned(),
            ));
        }
        creds.ensure_complete()?;

        let mut body = Map::new();
        body.insert("documentId".to_owned(), Value::String(document_id.to_owned()));
        if let Some(options) = options {
            body.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        debug!(document_id, "POST /signature");
        let resp = authenticated(self.http.post(self.url("/signature")), creds)
            .header(CONTENT_TYPE, JSON)
            .json(&body)
            .send()
            .await?;

        let sig: SignatureRequest = decode(resp, EsignError::Signature).await?;
        debug!(signature_id = %sig.signature_id, "signature initiated");
        Ok(sig)
    }

    /// Fetch `GET /signature/{signatureId}/status`.
    ///
    /// # Errors
    ///
    /// - [`EsignError::Validation`] if `signature_id` or a credential field is empty
    /// - [`EsignError::Status`] on a non-2xx response
    /// - [`EsignError::Network`] / [`EsignError::Decode`] on transport or body failures
    pub async fn get_signature_status(
        &self,
        signature_id: &str,
        creds: &Credentials,
    ) -> Result<StatusUpdate, EsignError> {
        if signature_id.trim().is_empty() {
            return Err(EsignError::Validation(
                "Signature ID and credentials are required".to_owned(),
            ));
        }
        creds.ensure_complete()?;

        let path = format!("/signature/{}/status", urlencoding::encode(signature_id));
        debug!(signature_id, "GET {path}");
        let resp = authenticated(self.http.get(self.url(&path)), creds)
            .header(CONTENT_TYPE, JSON)
            .send()
            .await?;

        decode(resp, EsignError::Status).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn authenticated(req: RequestBuilder, creds: &Credentials) -> RequestBuilder {
    req.header(HEADER_CLIENT_ID, &creds.client_id)
        .header(HEADER_CLIENT_SECRET, &creds.client_secret)
        .header(HEADER_PRODUCT_INSTANCE_ID, &creds.product_instance_id)
}

async fn decode<T: DeserializeOwned>(
    resp: Response,
    on_failure: fn(HttpFailure) -> EsignError,
) -> Result<T, EsignError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "setu API returned an error");
        return Err(on_failure(HttpFailure {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        }));
    }

    Ok(serde_json::from_str(&body)?)
}
