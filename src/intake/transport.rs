//! Network seam for the intake flow
//!
//! Everything the form needs from the outside world goes through one trait:
//! asking the broker for an upload grant, putting bytes to the signed URL,
//! and posting the finished submission. Tests drive the flow with a stub
//! implementation instead of a live stack.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::upload::{UploadGrant, UploadRequest};

use super::submit::QuestionnaireSubmission;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a usable response
    #[error("network error: {0}")]
    Network(String),
    /// The endpoint answered with a non-success status
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Acknowledgement from the submission endpoint:
/// `{ submission_id?: string }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionAck {
    pub submission_id: Option<String>,
}

#[async_trait]
pub trait IntakeTransport: Send + Sync {
    /// Ask the broker for a presigned PUT grant for one file.
    async fn request_upload_url(
        &self,
        request: &UploadRequest,
    ) -> Result<UploadGrant, TransportError>;

    /// Send the file bytes to the presigned URL.
    async fn put_file(
        &self,
        url: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), TransportError>;

    /// Post the assembled submission.
    async fn send_submission(
        &self,
        submission: &QuestionnaireSubmission,
    ) -> Result<SubmissionAck, TransportError>;
}

/// Production transport over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    upload_url: String,
    submission_url: String,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, upload_url: String, submission_url: String) -> Self {
        Self {
            client,
            upload_url,
            submission_url,
        }
    }
}

#[async_trait]
impl IntakeTransport for HttpTransport {
    async fn request_upload_url(
        &self,
        request: &UploadRequest,
    ) -> Result<UploadGrant, TransportError> {
        let response = self
            .client
            .post(&self.upload_url)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Rejected(format!(
                "upload broker returned {}",
                response.status()
            )));
        }

        response
            .json::<UploadGrant>()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    async fn put_file(
        &self,
        url: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .put(url)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Rejected(format!(
                "storage returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn send_submission(
        &self,
        submission: &QuestionnaireSubmission,
    ) -> Result<SubmissionAck, TransportError> {
        let response = self
            .client
            .post(&self.submission_url)
            .json(submission)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            // Empty message means "no displayable detail"; the caller shows
            // its locale's generic failure banner instead.
            return Err(TransportError::Rejected(
                rejection_message(&body).unwrap_or_default(),
            ));
        }

        // An empty or non-JSON body still counts as accepted.
        Ok(response.json::<SubmissionAck>().await.unwrap_or_default())
    }
}

/// Pull the displayable message out of a failure body. The endpoint answers
/// `{ error?: string }`; anything else carries nothing worth showing a user.
fn rejection_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_parses_submission_id_from_wire_json() {
        let ack: SubmissionAck =
            serde_json::from_str(r#"{ "submission_id": "sub-1001" }"#).unwrap();
        assert_eq!(ack.submission_id.as_deref(), Some("sub-1001"));
    }

    #[test]
    fn test_ack_tolerates_empty_body_object() {
        let ack: SubmissionAck = serde_json::from_str("{}").unwrap();
        assert_eq!(ack.submission_id, None);
    }

    #[test]
    fn test_rejection_message_extracts_error_field() {
        assert_eq!(
            rejection_message(r#"{"error":"mailbox quota exceeded"}"#).as_deref(),
            Some("mailbox quota exceeded")
        );
    }

    #[test]
    fn test_rejection_message_ignores_undisplayable_bodies() {
        assert_eq!(rejection_message(""), None);
        assert_eq!(rejection_message("<html>502 Bad Gateway</html>"), None);
        assert_eq!(rejection_message(r#"{"error":""}"#), None);
        assert_eq!(rejection_message(r#"{"detail":"nope"}"#), None);
    }
}
