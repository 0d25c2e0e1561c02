//! Client-side state machine for one signing submission.
//!
//! ```text
//! NoFile → FileSelected → Uploading → DocumentReady → InitiatingSignature
//!        → SignatureReady ⇄ StatusRefreshing
//! ```
//!
//! Transition functions are pure; the async drivers wrap them around
//! [`ApiClient`] calls. A failed call returns to the phase it started from
//! and records the message, keeping whatever earlier steps produced. Nothing
//! here is persisted and nothing is retried.

use tracing::{debug, info};

use crate::client::ApiClient;
use crate::credentials::Credentials;
use crate::error::{EsignError, TransitionError};
use crate::types::{Document, SignatureOptions, SignatureRequest, StatusUpdate};
use crate::validation::{PdfFile, PdfValidation, validate_pdf_file};

pub const UPLOADING_MESSAGE: &str = "Uploading document...";
pub const INITIATING_MESSAGE: &str = "Initiating signature request...";
pub const SUBMITTED_MESSAGE: &str =
    "Document uploaded and signature request initiated successfully!";
pub const REFRESHING_MESSAGE: &str = "Refreshing status...";
pub const REFRESHED_MESSAGE: &str = "Status updated successfully!";

/// Where a submission is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NoFile,
    FileSelected,
    Uploading,
    DocumentReady,
    InitiatingSignature,
    SignatureReady,
    StatusRefreshing,
}

impl Phase {
    /// Human-readable description, used in [`TransitionError`].
    pub fn describe(self) -> &'static str {
        match self {
            Self::NoFile => "no file is selected",
            Self::FileSelected => "a file is selected",
            Self::Uploading => "uploading",
            Self::DocumentReady => "the document is ready",
            Self::InitiatingSignature => "initiating a signature",
            Self::SignatureReady => "the signature is ready",
            Self::StatusRefreshing => "refreshing status",
        }
    }

    /// Whether a request is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Uploading | Self::InitiatingSignature | Self::StatusRefreshing
        )
    }
}

/// One upload → initiate → poll sequence.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    phase: Phase,
    resume: Phase,
    file: Option<PdfFile>,
    document: Option<Document>,
    signature: Option<SignatureRequest>,
    message: Option<String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn file(&self) -> Option<&PdfFile> {
        self.file.as_ref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn signature(&self) -> Option<&SignatureRequest> {
        self.signature.as_ref()
    }

    /// Latest progress, success or error message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // ── Pure transitions ─────────────────────────────────────────────

    /// Pick a file, starting the submission over.
    ///
    /// An invalid file leaves the submission in [`Phase::NoFile`] with the
    /// validation message.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] while a request is in flight.
    pub fn select_file(&mut self, file: Option<PdfFile>) -> Result<PdfValidation, TransitionError> {
        self.guard_idle("select a file")?;

        let validation = validate_pdf_file(file.as_ref());
        self.document = None;
        self.signature = None;
        if validation.is_valid {
            self.file = file;
            self.message = None;
            self.set_phase(Phase::FileSelected);
        } else {
            self.file = None;
            self.message.clone_from(&validation.error);
            self.set_phase(Phase::NoFile);
        }
        Ok(validation)
    }

    /// Enter [`Phase::Uploading`], returning the file to send.
    ///
    /// Allowed whenever a valid file is held and nothing is in flight, so a
    /// finished submission can be uploaded again.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] without a file or while busy.
    pub fn begin_upload(&mut self) -> Result<PdfFile, TransitionError> {
        self.guard_idle("upload")?;
        let file = self
            .file
            .clone()
            .ok_or_else(|| self.refuse("upload"))?;
        self.start(Phase::Uploading, UPLOADING_MESSAGE);
        Ok(file)
    }

    /// Record a successful upload. A previous signature request belonged to
    /// the previous document and is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless uploading.
    pub fn complete_upload(&mut self, document: Document) -> Result<(), TransitionError> {
        self.expect_phase(Phase::Uploading, "complete an upload")?;
        info!(document_id = %document.document_id, "document ready");
        self.document = Some(document);
        self.signature = None;
        self.set_phase(Phase::DocumentReady);
        Ok(())
    }

    /// Enter [`Phase::InitiatingSignature`], returning the document id.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the document is ready.
    pub fn begin_initiate(&mut self) -> Result<String, TransitionError> {
        self.expect_phase(Phase::DocumentReady, "initiate a signature")?;
        let document_id = self
            .document
            .as_ref()
            .map(|d| d.document_id.clone())
            .ok_or_else(|| self.refuse("initiate a signature"))?;
        self.start(Phase::InitiatingSignature, INITIATING_MESSAGE);
        Ok(document_id)
    }

    /// Record a created signature request.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless initiating.
    pub fn complete_initiate(&mut self, signature: SignatureRequest) -> Result<(), TransitionError> {
        self.expect_phase(Phase::InitiatingSignature, "complete a signature request")?;
        info!(signature_id = %signature.signature_id, "signature request ready");
        self.signature = Some(signature);
        self.message = Some(SUBMITTED_MESSAGE.to_owned());
        self.set_phase(Phase::SignatureReady);
        Ok(())
    }

    /// Enter [`Phase::StatusRefreshing`], returning the signature id.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the signature is ready.
    pub fn begin_refresh(&mut self) -> Result<String, TransitionError> {
        self.expect_phase(Phase::SignatureReady, "refresh the status")?;
        let signature_id = self
            .signature
            .as_ref()
            .map(|s| s.signature_id.clone())
            .ok_or_else(|| self.refuse("refresh the status"))?;
        self.start(Phase::StatusRefreshing, REFRESHING_MESSAGE);
        Ok(signature_id)
    }

    /// Shallow-merge a status response into the signature request.
    ///
    /// # Errors
    ///
    /// Returns [`EsignError::Workflow`] unless refreshing, or
    /// [`EsignError::Decode`] if the update cannot be merged; the latter is
    /// handled like a failed call.
    pub fn complete_refresh(&mut self, update: &StatusUpdate) -> Result<(), EsignError> {
        self.expect_phase(Phase::StatusRefreshing, "complete a status refresh")?;
        let missing = self.refuse("complete a status refresh");
        let merged = match self.signature.as_mut() {
            Some(signature) => signature.merge(update).map_err(EsignError::from),
            None => Err(missing.into()),
        };
        match merged {
            Ok(()) => {
                self.message = Some(REFRESHED_MESSAGE.to_owned());
                self.set_phase(Phase::SignatureReady);
                Ok(())
            }
            Err(e) => {
                self.fail(&e)?;
                Err(e)
            }
        }
    }

    /// Record a failed call: return to the phase the call started from and
    /// surface the error. Earlier results are kept.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if no call is in flight.
    pub fn fail(&mut self, err: &EsignError) -> Result<(), TransitionError> {
        if !self.phase.is_busy() {
            return Err(self.refuse("record a failure"));
        }
        self.message = Some(if self.phase == Phase::StatusRefreshing {
            format!("Error refreshing status: {err}")
        } else {
            format!("Error: {err}")
        });
        info!(phase = ?self.phase, error = %err, "request failed");
        self.set_phase(self.resume);
        Ok(())
    }

    // ── Async drivers ────────────────────────────────────────────────

    /// Upload the selected file.
    ///
    /// # Errors
    ///
    /// Returns the transition or API error; the submission is rolled back.
    pub async fn upload(
        &mut self,
        client: &ApiClient,
        creds: &Credentials,
    ) -> Result<Document, EsignError> {
        let file = self.begin_upload()?;
        match client.upload_document(&file, creds).await {
            Ok(document) => {
                self.complete_upload(document.clone())?;
                Ok(document)
            }
            Err(e) => {
                self.fail(&e)?;
                Err(e)
            }
        }
    }

    /// Request a signature for the uploaded document.
    ///
    /// # Errors
    ///
    /// Returns the transition or API error; the document is kept.
    pub async fn initiate_signature(
        &mut self,
        client: &ApiClient,
        creds: &Credentials,
        options: Option<&SignatureOptions>,
    ) -> Result<SignatureRequest, EsignError> {
        let document_id = self.begin_initiate()?;
        match client.initiate_signature(&document_id, creds, options).await {
            Ok(signature) => {
                self.complete_initiate(signature.clone())?;
                Ok(signature)
            }
            Err(e) => {
                self.fail(&e)?;
                Err(e)
            }
        }
    }

    /// Poll the signature status and merge it into the request.
    ///
    /// # Errors
    ///
    /// Returns the transition, API or merge error; the prior state is kept.
    pub async fn refresh_status(
        &mut self,
        client: &ApiClient,
        creds: &Credentials,
    ) -> Result<&SignatureRequest, EsignError> {
        let signature_id = self.begin_refresh()?;
        match client.get_signature_status(&signature_id, creds).await {
            Ok(update) => self.complete_refresh(&update)?,
            Err(e) => {
                self.fail(&e)?;
                return Err(e);
            }
        }
        self.signature
            .as_ref()
            .ok_or_else(|| self.refuse("read the signature").into())
    }

    /// Upload, then initiate a signature: the page's single submit action.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; a document obtained before a
    /// failed signature step stays on the submission.
    pub async fn upload_and_initiate(
        &mut self,
        client: &ApiClient,
        creds: &Credentials,
        options: Option<&SignatureOptions>,
    ) -> Result<SignatureRequest, EsignError> {
        self.upload(client, creds).await?;
        self.initiate_signature(client, creds, options).await
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn start(&mut self, busy: Phase, message: &str) {
        self.resume = self.phase;
        self.message = Some(message.to_owned());
        self.set_phase(busy);
    }

    fn set_phase(&mut self, next: Phase) {
        debug!(from = ?self.phase, to = ?next, "submission transition");
        self.phase = next;
    }

    fn guard_idle(&self, action: &'static str) -> Result<(), TransitionError> {
        if self.phase.is_busy() {
            Err(self.refuse(action))
        } else {
            Ok(())
        }
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), TransitionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.refuse(action))
        }
    }

    fn refuse(&self, action: &'static str) -> TransitionError {
        TransitionError {
            action,
            phase: self.phase.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validation::{PDF_MIME_TYPE, WRONG_TYPE_MESSAGE};

    fn pdf() -> PdfFile {
        PdfFile::new("contract.pdf", PDF_MIME_TYPE, vec![0; 2 * 1024 * 1024])
    }

    fn doc(id: &str) -> Document {
        serde_json::from_value(json!({"documentId": id})).unwrap()
    }

    fn sig(value: serde_json::Value) -> SignatureRequest {
        serde_json::from_value(value).unwrap()
    }

    fn ready_submission() -> Submission {
        let mut s = Submission::new();
        s.select_file(Some(pdf())).unwrap();
        s.begin_upload().unwrap();
        s.complete_upload(doc("doc_1")).unwrap();
        s.begin_initiate().unwrap();
        s.complete_initiate(sig(json!({
            "signatureId": "sig_1",
            "signatureUrl": "https://esign/sig_1"
        })))
        .unwrap();
        s
    }

    #[test]
    fn starts_without_file() {
        let s = Submission::new();
        assert_eq!(s.phase(), Phase::NoFile);
        assert!(s.message().is_none());
    }

    #[test]
    fn invalid_file_stays_in_no_file() {
        let mut s = Submission::new();
        let res = s
            .select_file(Some(PdfFile::new("a.png", "image/png", vec![1])))
            .unwrap();
        assert!(!res.is_valid);
        assert_eq!(s.phase(), Phase::NoFile);
        assert_eq!(s.message(), Some(WRONG_TYPE_MESSAGE));
        assert!(s.file().is_none());
    }

    #[test]
    fn happy_path_walks_every_phase() {
        let mut s = Submission::new();
        s.select_file(Some(pdf())).unwrap();
        assert_eq!(s.phase(), Phase::FileSelected);

        s.begin_upload().unwrap();
        assert_eq!(s.phase(), Phase::Uploading);
        assert_eq!(s.message(), Some(UPLOADING_MESSAGE));
        s.complete_upload(doc("doc_1")).unwrap();
        assert_eq!(s.phase(), Phase::DocumentReady);

        assert_eq!(s.begin_initiate().unwrap(), "doc_1");
        assert_eq!(s.phase(), Phase::InitiatingSignature);
        s.complete_initiate(sig(json!({"signatureId": "sig_1"}))).unwrap();
        assert_eq!(s.phase(), Phase::SignatureReady);
        assert_eq!(s.message(), Some(SUBMITTED_MESSAGE));

        assert_eq!(s.begin_refresh().unwrap(), "sig_1");
        assert_eq!(s.phase(), Phase::StatusRefreshing);
        s.complete_refresh(&serde_json::from_value(json!({"status": "pending"})).unwrap())
            .unwrap();
        assert_eq!(s.phase(), Phase::SignatureReady);
        assert_eq!(s.message(), Some(REFRESHED_MESSAGE));
        assert_eq!(s.signature().unwrap().status(), Some("pending"));
    }

    #[test]
    fn cannot_initiate_before_upload() {
        let mut s = Submission::new();
        s.select_file(Some(pdf())).unwrap();
        let err = s.begin_initiate().unwrap_err();
        assert_eq!(err.to_string(), "cannot initiate a signature while a file is selected");
        assert_eq!(s.phase(), Phase::FileSelected);
    }

    #[test]
    fn cannot_upload_without_file() {
        let mut s = Submission::new();
        assert!(s.begin_upload().is_err());
        assert_eq!(s.phase(), Phase::NoFile);
    }

    #[test]
    fn busy_submission_rejects_new_work() {
        let mut s = Submission::new();
        s.select_file(Some(pdf())).unwrap();
        s.begin_upload().unwrap();
        assert!(s.begin_upload().is_err());
        assert!(s.select_file(Some(pdf())).is_err());
        assert_eq!(s.phase(), Phase::Uploading);
    }

    #[test]
    fn failed_upload_returns_to_file_selected() {
        let mut s = Submission::new();
        s.select_file(Some(pdf())).unwrap();
        s.begin_upload().unwrap();
        s.fail(&EsignError::Validation("boom".to_owned())).unwrap();
        assert_eq!(s.phase(), Phase::FileSelected);
        assert_eq!(s.message(), Some("Error: boom"));
        assert!(s.file().is_some());
    }

    #[test]
    fn failed_signature_keeps_document() {
        let mut s = Submission::new();
        s.select_file(Some(pdf())).unwrap();
        s.begin_upload().unwrap();
        s.complete_upload(doc("doc_1")).unwrap();
        s.begin_initiate().unwrap();
        s.fail(&EsignError::Validation("nope".to_owned())).unwrap();

        assert_eq!(s.phase(), Phase::DocumentReady);
        assert_eq!(s.document().unwrap().document_id, "doc_1");
        assert!(s.signature().is_none());
    }

    #[test]
    fn failed_refresh_keeps_signature_and_prefixes_message() {
        let mut s = ready_submission();
        s.begin_refresh().unwrap();
        s.fail(&EsignError::Validation("offline".to_owned())).unwrap();
        assert_eq!(s.phase(), Phase::SignatureReady);
        assert_eq!(s.message(), Some("Error refreshing status: offline"));
        assert_eq!(
            s.signature().unwrap().signature_url(),
            Some("https://esign/sig_1")
        );
    }

    #[test]
    fn unmergeable_refresh_rolls_back() {
        let mut s = ready_submission();
        s.begin_refresh().unwrap();
        let update = serde_json::from_value(json!({"signatureId": false})).unwrap();
        let err = s.complete_refresh(&update).unwrap_err();
        assert!(matches!(err, EsignError::Decode(_)));
        assert_eq!(s.phase(), Phase::SignatureReady);
        assert_eq!(s.signature().unwrap().signature_id, "sig_1");
    }

    #[test]
    fn reupload_drops_stale_signature() {
        let mut s = ready_submission();
        s.begin_upload().unwrap();
        s.complete_upload(doc("doc_2")).unwrap();
        assert!(s.signature().is_none());
        assert_eq!(s.document().unwrap().document_id, "doc_2");
    }

    #[test]
    fn selecting_a_new_file_starts_over() {
        let mut s = ready_submission();
        s.select_file(Some(pdf())).unwrap();
        assert_eq!(s.phase(), Phase::FileSelected);
        assert!(s.document().is_none());
        assert!(s.signature().is_none());
    }

    #[test]
    fn fail_outside_a_call_is_rejected() {
        let mut s = Submission::new();
        assert!(s.fail(&EsignError::Validation("x".to_owned())).is_err());
    }
}
