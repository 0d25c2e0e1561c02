//! Local PDF checks run before anything is uploaded.

use std::io::Read;
use std::path::Path;

use bytes::Bytes;

use crate::error::EsignError;

/// Largest accepted upload: 10 MiB.
pub const MAX_PDF_SIZE: u64 = 10 * 1024 * 1024;

/// The only MIME type the documents endpoint accepts.
pub const PDF_MIME_TYPE: &str = "application/pdf";

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub const NO_FILE_MESSAGE: &str = "No file selected";
pub const WRONG_TYPE_MESSAGE: &str = "Please select a PDF file only";
pub const TOO_LARGE_MESSAGE: &str = "File size must be less than 10MB";

/// A file picked for upload.
///
/// Contents are reference-counted, so cloning a file does not copy them.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfFile {
    name: String,
    mime_type: String,
    bytes: Bytes,
}

impl std::fmt::Debug for PdfFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl PdfFile {
    /// A file with an explicit MIME type.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: Bytes::from(bytes),
        }
    }

    /// A file whose MIME type is inferred from its name's extension.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_type_for(&name).to_owned();
        Self {
            name,
            mime_type,
            bytes: Bytes::from(bytes),
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    ///
    /// The type and size are checked before the contents are read, and at
    /// most [`MAX_PDF_SIZE`] + 1 bytes are ever buffered.
    ///
    /// # Errors
    ///
    /// - [`EsignError::Validation`] if the name is not a PDF or the file is
    ///   larger than [`MAX_PDF_SIZE`]
    /// - [`EsignError::Io`] if the file cannot be read
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EsignError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| EsignError::Io {
            path: path.display().to_string(),
            source,
        };
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        if mime_type_for(&name) != PDF_MIME_TYPE {
            return Err(EsignError::Validation(WRONG_TYPE_MESSAGE.to_owned()));
        }

        let file = std::fs::File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        if len > MAX_PDF_SIZE {
            return Err(EsignError::Validation(TOO_LARGE_MESSAGE.to_owned()));
        }

        // The file may grow between the size check and the read.
        let mut bytes = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        file.take(MAX_PDF_SIZE + 1)
            .read_to_end(&mut bytes)
            .map_err(io_err)?;
        if bytes.len() as u64 > MAX_PDF_SIZE {
            return Err(EsignError::Validation(TOO_LARGE_MESSAGE.to_owned()));
        }
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// A shared handle to the contents, for use as a request body.
    pub(crate) fn body(&self) -> Bytes {
        self.bytes.clone()
    }
}

fn mime_type_for(name: &str) -> &'static str {
    let is_pdf = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf { PDF_MIME_TYPE } else { FALLBACK_MIME_TYPE }
}

/// Outcome of [`validate_pdf_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfValidation {
    pub is_valid: bool,
    /// User-facing reason, set whenever `is_valid` is false.
    pub error: Option<String>,
}

impl PdfValidation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn rejected(message: &str) -> Self {
        Self {
            is_valid: false,
            error: Some(message.to_owned()),
        }
    }

    /// Convert into a `Result`, mapping rejection to [`EsignError::Validation`].
    ///
    /// # Errors
    ///
    /// Returns the rejection message as [`EsignError::Validation`].
    pub fn into_result(self) -> Result<(), EsignError> {
        match self.error {
            Some(message) if !self.is_valid => Err(EsignError::Validation(message)),
            _ => Ok(()),
        }
    }
}

/// Check that a file is present, is a PDF, and is at most [`MAX_PDF_SIZE`].
///
/// Pure: performs no I/O.
pub fn validate_pdf_file(file: Option<&PdfFile>) -> PdfValidation {
    let Some(file) = file else {
        return PdfValidation::rejected(NO_FILE_MESSAGE);
    };
    if file.mime_type != PDF_MIME_TYPE {
        return PdfValidation::rejected(WRONG_TYPE_MESSAGE);
    }
    if file.size() > MAX_PDF_SIZE {
        return PdfValidation::rejected(TOO_LARGE_MESSAGE);
    }
    PdfValidation::ok()
}
