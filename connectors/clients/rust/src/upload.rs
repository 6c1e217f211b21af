// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Upload preparation shared by drawing analysis and sheet ingestion.
//!
//! Both endpoints accept either PDF bytes or the hash of a PDF the server has
//! already cached. When the caller hands over a file without a hash, the SDK
//! hashes it, probes the cache, and sends only the hash on a hit.

use std::fmt;
use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::client::StruAiClient;
use crate::error::{Result, StruAiError};

/// Number of hex characters of the SHA-256 digest the server keys its cache on.
pub const FILE_HASH_LEN: usize = 16;

const DEFAULT_FILE_NAME: &str = "document.pdf";
const PDF_MIME: &str = "application/pdf";

/// Server-compatible content hash: the first 16 hex characters of SHA-256.
pub fn compute_file_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hash = hex::encode(digest);
    hash.truncate(FILE_HASH_LEN);
    hash
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// A PDF to send to the API.
#[derive(Debug, Clone)]
pub enum Upload {
    /// Read from disk when the request is prepared.
    Path(PathBuf),
    /// In-memory bytes with the file name to report.
    Bytes { file_name: String, data: Vec<u8> },
}

impl Upload {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// In-memory PDF reported as `document.pdf`.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            file_name: DEFAULT_FILE_NAME.to_string(),
            data: data.into(),
        }
    }

    pub fn named_bytes(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Read the content (if on disk) and resolve the reported file name.
    pub(crate) async fn load(self) -> Result<LoadedFile> {
        match self {
            Self::Path(path) => {
                let data = tokio::fs::read(&path).await?;
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();
                Ok(LoadedFile { file_name, data })
            }
            Self::Bytes { file_name, data } => Ok(LoadedFile { file_name, data }),
        }
    }

    /// Compute the server-compatible hash of this upload's content.
    pub async fn content_hash(&self) -> Result<String> {
        match self {
            Self::Path(path) => Ok(compute_file_hash(&tokio::fs::read(path).await?)),
            Self::Bytes { data, .. } => Ok(compute_file_hash(data)),
        }
    }
}

/// Upload content held in memory, ready for a multipart part.
#[derive(Debug)]
pub(crate) struct LoadedFile {
    file_name: String,
    data: Vec<u8>,
}

impl LoadedFile {
    fn hash(&self) -> String {
        compute_file_hash(&self.data)
    }

    fn into_part(self) -> Result<Part> {
        Part::bytes(self.data)
            .file_name(self.file_name)
            .mime_str(PDF_MIME)
            .map_err(|e| StruAiError::Validation(format!("Invalid upload content type: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Upload plan
// ---------------------------------------------------------------------------

/// What actually goes over the wire for the document.
#[derive(Debug)]
pub(crate) enum UploadPlan {
    /// Upload the bytes.
    File(LoadedFile),
    /// Reference already-cached content by hash.
    Hash(String),
}

impl UploadPlan {
    /// Add the `file` or `file_hash` field to `form`.
    pub(crate) fn apply(self, form: Form) -> Result<Form> {
        match self {
            Self::File(file) => Ok(form.part("file", file.into_part()?)),
            Self::Hash(hash) => Ok(form.text("file_hash", hash)),
        }
    }

    pub(crate) fn is_hash_only(&self) -> bool {
        matches!(self, Self::Hash(_))
    }
}

/// Check the "exactly one of file / file hash" contract without doing any I/O.
///
/// An empty or whitespace hash counts as absent.
pub(crate) fn validate_source(file: Option<&Upload>, file_hash: Option<&str>) -> Result<()> {
    let has_hash = file_hash.is_some_and(|h| !h.trim().is_empty());
    match (file.is_some(), has_hash) {
        (false, false) => Err(StruAiError::Validation("Provide file or file_hash".into())),
        (true, true) => Err(StruAiError::Validation(
            "Provide either file or file_hash, not both".into(),
        )),
        _ => Ok(()),
    }
}

/// Decide whether to upload bytes or send a cached hash.
///
/// A caller-supplied hash is sent as is. Otherwise the file is read once,
/// hashed, and the cache is probed; probe failures count as a miss.
pub(crate) async fn plan_upload(
    client: &StruAiClient,
    file: Option<Upload>,
    file_hash: Option<String>,
) -> Result<UploadPlan> {
    validate_source(file.as_ref(), file_hash.as_deref())?;

    let Some(file) = file else {
        let hash = file_hash.unwrap_or_default().trim().to_string();
        return Ok(UploadPlan::Hash(hash));
    };

    let loaded = file.load().await?;
    let hash = loaded.hash();
    if client.drawings().is_cached(&hash).await {
        debug!(file_hash = %hash, "Content already cached, skipping upload");
        Ok(UploadPlan::Hash(hash))
    } else {
        debug!(file_hash = %hash, bytes = loaded.data.len(), "Uploading file content");
        Ok(UploadPlan::File(loaded))
    }
}

// ---------------------------------------------------------------------------
// Page selector
// ---------------------------------------------------------------------------

/// Which page(s) of the PDF to process.
///
/// Text selectors (`"12"`, `"1,3,5-7"`, `"all"`) are forwarded verbatim; the
/// server owns their semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelector {
    Number(u32),
    Text(String),
}

impl PageSelector {
    /// The form value to send.
    ///
    /// # Errors
    ///
    /// Returns [`StruAiError::Validation`] for a blank text selector.
    pub fn to_form_value(&self) -> Result<String> {
        match self {
            Self::Number(page) => Ok(page.to_string()),
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Err(StruAiError::Validation("page is required".into()))
                } else {
                    Ok(trimmed.to_string())
                }
            }
        }
    }
}

impl Default for PageSelector {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl From<u32> for PageSelector {
    fn from(page: u32) -> Self {
        Self::Number(page)
    }
}

impl From<&str> for PageSelector {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PageSelector {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl fmt::Display for PageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(page) => write!(f, "{page}"),
            Self::Text(text) => f.write_str(text.trim()),
        }
    }
}
