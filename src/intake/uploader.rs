//! Batch upload coordinator
//!
//! Fans a selection of files out against the upload broker and the storage
//! bucket, then folds the results back into the form. Each file fails or
//! succeeds independently; a file removed mid-flight is skipped or its
//! completion lands as a no-op on the form.

use bytes::Bytes;
use futures::future::join_all;
use uuid::Uuid;

use crate::upload::{UploadGrant, UploadRequest};

use super::form::IntakeForm;
use super::transport::{IntakeTransport, TransportError};

/// Bytes and metadata for one file handed to the uploader.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub id: Uuid,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadError {
    #[error("upload grant request failed: {0}")]
    Broker(TransportError),
    #[error("upload grant was missing its URL or path")]
    IncompleteGrant,
    #[error("file transfer failed: {0}")]
    Put(TransportError),
}

/// Upload every payload whose file is still on the form, concurrently, and
/// record each outcome. Returns the per-file results in no particular order.
pub async fn upload_batch<T: IntakeTransport + ?Sized>(
    transport: &T,
    form: &mut IntakeForm,
    payloads: Vec<FilePayload>,
) -> Vec<(Uuid, Result<(), UploadError>)> {
    let mut pending = Vec::with_capacity(payloads.len());
    for payload in payloads {
        // Skip payloads for files removed between selection and upload
        let Some(name) = form.file_name(payload.id) else {
            continue;
        };
        if !form.mark_uploading(payload.id) {
            continue;
        }
        pending.push((payload, name));
    }

    let results = join_all(
        pending
            .into_iter()
            .map(|(payload, name)| async move {
                let id = payload.id;
                let outcome = upload_one(transport, &name, payload).await;
                (id, outcome)
            }),
    )
    .await;

    for (id, outcome) in &results {
        match outcome {
            Ok(path) => {
                form.complete_upload(*id, path.clone());
            }
            Err(error) => {
                tracing::warn!(file_id = %id, %error, "File upload failed");
                form.fail_upload(*id);
            }
        }
    }

    results
        .into_iter()
        .map(|(id, outcome)| (id, outcome.map(|_| ())))
        .collect()
}

/// Grant-then-PUT for a single file. Returns the object key on success.
async fn upload_one<T: IntakeTransport + ?Sized>(
    transport: &T,
    name: &str,
    payload: FilePayload,
) -> Result<String, UploadError> {
    let request = UploadRequest {
        filename: name.to_string(),
        content_type: Some(payload.content_type.clone()),
    };

    let grant: UploadGrant = transport
        .request_upload_url(&request)
        .await
        .map_err(UploadError::Broker)?;

    if grant.upload_url.is_empty() || grant.path.is_empty() {
        return Err(UploadError::IncompleteGrant);
    }

    transport
        .put_file(&grant.upload_url, &payload.content_type, payload.bytes)
        .await
        .map_err(UploadError::Put)?;

    Ok(grant.path)
}
