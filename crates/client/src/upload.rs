//! Image hosting: fetch a remote image and re-upload it to the service.

use std::{io::Write, path::Path};

use {
    reqwest::{StatusCode, Url, blocking::multipart::Form},
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    session::Session,
};

const UPLOAD_PATH: &str = "/image/upload";
const DEFAULT_SUFFIX: &str = "jpg";

/// Result of a single upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Upload {
    /// Hosted URL of the uploaded image.
    Hosted(String),
    /// The service (or the image source) refused; nothing was posted.
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    file: Option<UploadedFile>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    url: String,
}

/// Download `source` into a scratch file under `scratch_dir` and upload it
/// as the `image` multipart field.
///
/// The scratch file is unique per call and removed when this returns,
/// whatever the outcome.
pub(crate) fn upload_image(session: &mut Session, source: &str, scratch_dir: &Path) -> Result<Upload> {
    let download = session.get(source)?;
    if !download.status().is_success() {
        let reason = format!("image download returned {}", download.status());
        warn!(source, %reason, "upload aborted");
        return Ok(Upload::Failed(reason));
    }
    let bytes = download
        .bytes()
        .map_err(|e| Error::http("failed to read image download", e))?;

    let mut scratch = tempfile::Builder::new()
        .prefix("hgpost-upload-")
        .suffix(&format!(".{}", image_suffix(source)))
        .tempfile_in(scratch_dir)
        .map_err(|e| Error::external("failed to create upload scratch file", e))?;
    scratch
        .write_all(&bytes)
        .and_then(|()| scratch.flush())
        .map_err(|e| Error::external("failed to write upload scratch file", e))?;
    debug!(source, path = %scratch.path().display(), size = bytes.len(), "image downloaded");

    let token = session.refresh()?.to_owned();
    let response = session.post_multipart(UPLOAD_PATH, &token, || {
        Form::new().file("image", scratch.path())
    })?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|e| Error::http("failed to read upload response", e))?;
    if status != StatusCode::OK {
        warn!(status = status.as_u16(), body = %body, "image upload rejected");
        return Ok(Upload::Failed(format!("upload returned {status}")));
    }

    let parsed: UploadResponse = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, body = %body, "unreadable upload response");
            return Ok(Upload::Failed(format!("unreadable upload response: {e}")));
        },
    };
    debug!(success = parsed.success, "upload result");

    match parsed {
        UploadResponse {
            success: true,
            file: Some(file),
            ..
        } => Ok(Upload::Hosted(file.url)),
        UploadResponse {
            success: true,
            file: None,
            ..
        } => {
            warn!(body = %body, "upload succeeded without a file url");
            Ok(Upload::Failed("upload response has no file url".into()))
        },
        UploadResponse { error, .. } => {
            let reason = match error {
                Some(serde_json::Value::String(msg)) => msg,
                Some(other) => other.to_string(),
                None => "upload rejected".into(),
            };
            warn!(%reason, "image upload failed");
            Ok(Upload::Failed(reason))
        },
    }
}

/// File extension for the scratch file, taken from the source URL path.
fn image_suffix(source: &str) -> String {
    Url::parse(source)
        .ok()
        .and_then(|url| {
            let name = url.path_segments()?.next_back()?.to_string();
            let (_, ext) = name.rsplit_once('.')?;
            let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
            valid.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_SUFFIX.into())
}
