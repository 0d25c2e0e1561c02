//! Core library for the Setu eSign client.
//!
//! - [`CredentialStore`] persists the three-field [`Credentials`] bundle in any
//!   [`setu_storage::StorageBackend`]
//! - [`ApiClient`] performs the authenticated upload, signature and status calls
//! - [`Submission`] tracks one upload → initiate → poll sequence as an explicit
//!   state machine
//! - [`validate_pdf_file`] checks type and size before anything is sent
//!
//! # Example
//!
//! ```rust,no_run
//! use setu_core::{ApiClient, CredentialStore, PdfFile, Submission};
//! use setu_storage::FileBackend;
//!
//! # async fn example() -> Result<(), setu_core::EsignError> {
//! let store = CredentialStore::new(FileBackend::new("/home/me/.setu-esign"));
//! let Some(creds) = store.load().await else {
//!     return Ok(());
//! };
//!
//! let client = ApiClient::new()?;
//! let mut submission = Submission::new();
//! submission.select_file(Some(PdfFile::from_path("contract.pdf")?))?;
//! let signature = submission.upload_and_initiate(&client, &creds, None).await?;
//! println!("sign at {:?}", signature.signature_url());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod credentials;
mod error;
mod types;
mod validation;
mod workflow;

pub use client::{ApiClient, HEADER_CLIENT_ID, HEADER_CLIENT_SECRET, HEADER_PRODUCT_INSTANCE_ID};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use credentials::{CREDENTIALS_KEY, CredentialStore, Credentials};
pub use error::{EsignError, HttpFailure, TransitionError};
pub use types::{Document, SignatureOptions, SignatureRequest, StatusUpdate};
pub use validation::{
    MAX_PDF_SIZE, NO_FILE_MESSAGE, PDF_MIME_TYPE, PdfFile, PdfValidation, TOO_LARGE_MESSAGE,
    WRONG_TYPE_MESSAGE, validate_pdf_file,
};
pub use workflow::{
    INITIATING_MESSAGE, Phase, REFRESHED_MESSAGE, REFRESHING_MESSAGE, SUBMITTED_MESSAGE,
    Submission, UPLOADING_MESSAGE,
};
