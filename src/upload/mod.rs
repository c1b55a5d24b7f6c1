// Upload broker - presigned upload URLs for questionnaire attachments
//
// The browser never streams file bytes through the gateway. It asks this
// broker for a short-lived presigned PUT URL, then uploads directly to the
// bucket. The broker's only jobs are filename hygiene, key construction and
// the signing call. Every request mints a fresh key; there is no idempotency.

pub mod sanitize;
pub mod signer;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::server::AppState;
use sanitize::sanitize_filename;
use signer::SignerError;

/// Request body for `POST /api/questionnaire/upload/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
}

/// Successful broker response: where to PUT the bytes, and the object key the
/// client echoes back on final submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadGrant {
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    pub path: String,
}

/// Broker failures, mapped onto the wire as `{ "error": ... }`
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("filename is required")]
    EmptyFilename,
    #[error(transparent)]
    Signer(#[from] SignerError),
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = match &self {
            BrokerError::EmptyFilename => StatusCode::BAD_REQUEST,
            BrokerError::Signer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();
        tracing::error!("Upload broker error: {} - {}", status, message);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Handler for `POST /api/questionnaire/upload/`
pub async fn handle_upload(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadGrant>, BrokerError> {
    if request.filename.trim().is_empty() {
        return Err(BrokerError::EmptyFilename);
    }

    let safe_name = sanitize_filename(&request.filename);
    let key = object_key(&state.config.storage.namespace, &safe_name, Uuid::new_v4());

    let upload_url = state
        .signer
        .signed_put_url(&key, request.content_type.as_deref())
        .await?;

    tracing::info!(key = %key, "Issued upload grant");

    Ok(Json(UploadGrant {
        upload_url,
        path: key,
    }))
}

/// Build the storage object key: `<namespace>/<UTC date>/<uuid>-<filename>`.
/// The date segment keeps the bucket browsable; the UUID makes collisions
/// between identical filenames a non-issue.
fn object_key(namespace: &str, safe_name: &str, id: Uuid) -> String {
    format!(
        "{}/{}/{}-{}",
        namespace,
        Utc::now().format("%Y-%m-%d"),
        id,
        safe_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_shape() {
        let id = Uuid::new_v4();
        let key = object_key("questionnaire", "floor-plan.pdf", id);

        let parts: Vec<&str> = key.splitn(3, '/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "questionnaire");
        // Date segment: YYYY-MM-DD
        assert_eq!(parts[1].len(), 10);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit() || c == '-'));
        assert_eq!(parts[2], format!("{}-floor-plan.pdf", id));
    }

    #[test]
    fn test_identical_filenames_get_distinct_keys() {
        let a = object_key("questionnaire", "plan.pdf", Uuid::new_v4());
        let b = object_key("questionnaire", "plan.pdf", Uuid::new_v4());
        assert_ne!(a, b);
    }

    #[test]
    fn test_grant_wire_format() {
        let grant = UploadGrant {
            upload_url: "https://storage.example.com/signed".to_string(),
            path: "questionnaire/2026-08-25/abc-plan.pdf".to_string(),
        };
        let value = serde_json::to_value(&grant).unwrap();
        assert_eq!(value["uploadUrl"], "https://storage.example.com/signed");
        assert_eq!(value["path"], "questionnaire/2026-08-25/abc-plan.pdf");
    }
}
