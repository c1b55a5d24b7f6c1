//! Final submission step
//!
//! Validates, assembles the payload, posts it, and on success records the
//! correlation id and scheduler prefills in the session before handing back
//! the confirmation path for the redirect.

use std::collections::BTreeMap;

use serde::Serialize;

use super::attribution::Attribution;
use super::form::{IntakeForm, ValidationError};
use super::session::{SessionKey, SessionStore};
use super::transport::{IntakeTransport, TransportError};

/// Wire payload for `POST /api/questionnaire/send-email/`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSubmission {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub project_type: String,
    pub has_no_plans: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_status_other: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_full_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_virtual: Option<String>,
    pub referral_sources: Vec<String>,
    /// Only areas with a positive quantity, values as strings
    pub areas: BTreeMap<String, String>,
    pub files: Vec<SubmittedFile>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

/// One uploaded file echoed back on submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedFile {
    pub name: String,
    pub size: u64,
    pub path: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Submission attempted while a file upload is still running
    #[error("file uploads are still in progress")]
    UploadsInFlight,
    /// The endpoint failed; the message is already localized for display
    #[error("{0}")]
    Endpoint(String),
}

/// Successful submission: where to send the browser, and the correlation id
/// if the endpoint returned one.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub submission_id: Option<String>,
    pub redirect_to: &'static str,
}

/// Run the full submission flow for a validated form.
pub async fn submit_form<T: IntakeTransport + ?Sized>(
    transport: &T,
    form: &IntakeForm,
    attribution: &Attribution,
    session: &mut SessionStore,
) -> Result<SubmitOutcome, SubmitError> {
    if form.uploads_in_flight() {
        return Err(SubmitError::UploadsInFlight);
    }

    let submission = form.build_submission(attribution)?;

    let ack = match transport.send_submission(&submission).await {
        Ok(ack) => ack,
        Err(TransportError::Rejected(message)) => {
            tracing::warn!(%message, "Submission rejected");
            let message = if message.trim().is_empty() {
                form.strings().submit_failed.to_string()
            } else {
                message
            };
            return Err(SubmitError::Endpoint(message));
        }
        Err(TransportError::Network(error)) => {
            tracing::warn!(%error, "Submission request failed");
            return Err(SubmitError::Endpoint(form.strings().submit_failed.to_string()));
        }
    };

    if let Some(id) = &ack.submission_id {
        session.set(SessionKey::SubmissionId, id.clone());
    }
    // Prefills for the scheduling widget on the confirmation page
    if !submission.name.trim().is_empty() {
        session.set(SessionKey::SchedulerName, submission.name.clone());
    }
    if !submission.email.trim().is_empty() {
        session.set(SessionKey::SchedulerEmail, submission.email.clone());
    }

    tracing::info!(
        submission_id = ack.submission_id.as_deref().unwrap_or("-"),
        locale = form.strings().locale,
        "Questionnaire submitted"
    );

    Ok(SubmitOutcome {
        submission_id: ack.submission_id,
        redirect_to: form.strings().confirmation_path,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::intake::form::ProjectType;
    use crate::intake::locale::{ENGLISH, SPANISH};
    use crate::intake::transport::SubmissionAck;
    use crate::intake::uploader::{upload_batch, FilePayload};
    use crate::upload::{UploadGrant, UploadRequest};

    use super::*;

    /// Records everything sent through it; configurable submission response.
    struct RecordingTransport {
        reject_submission: Option<String>,
        submission_id: Option<String>,
        sent: Mutex<Vec<serde_json::Value>>,
    }

    impl RecordingTransport {
        fn accepting(submission_id: &str) -> Self {
            Self {
                reject_submission: None,
                submission_id: Some(submission_id.to_string()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(message: &str) -> Self {
            Self {
                reject_submission: Some(message.to_string()),
                submission_id: None,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn last_sent(&self) -> serde_json::Value {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl IntakeTransport for RecordingTransport {
        async fn request_upload_url(
            &self,
            request: &UploadRequest,
        ) -> Result<UploadGrant, TransportError> {
            Ok(UploadGrant {
                upload_url: format!("https://bucket.test/{}", request.filename),
                path: format!("questionnaire/2026-08-25/{}", request.filename),
            })
        }

        async fn put_file(
            &self,
            _url: &str,
            _content_type: &str,
            _bytes: Bytes,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send_submission(
            &self,
            submission: &QuestionnaireSubmission,
        ) -> Result<SubmissionAck, TransportError> {
            if let Some(message) = &self.reject_submission {
                return Err(TransportError::Rejected(message.clone()));
            }
            self.sent
                .lock()
                .unwrap()
                .push(serde_json::to_value(submission).unwrap());
            Ok(SubmissionAck {
                submission_id: self.submission_id.clone(),
            })
        }
    }

    // Full happy path: select files, upload them, submit, check the wire
    // payload and the session side effects.
    #[tokio::test]
    async fn test_english_full_service_flow_end_to_end() {
        let transport = RecordingTransport::accepting("sub-1001");
        let mut form = IntakeForm::new(&ENGLISH);
        form.contact.name = "Avery Quinn".to_string();
        form.contact.email = "avery@example.com".to_string();
        form.contact.phone = "555-0142".to_string();
        form.set_project_type(ProjectType::FullService);
        form.set_property_status(
            crate::intake::form::PropertyStatus::JustPurchased,
            None,
        );
        form.set_budget_full_service("50k-100k");
        form.toggle_referral_source("instagram", true);

        let ids = form
            .select_files(&[("floor-plan.pdf", 4096), ("survey.pdf", 2048)])
            .unwrap();
        upload_batch(
            &transport,
            &mut form,
            ids.iter()
                .map(|&id| FilePayload {
                    id,
                    content_type: "application/pdf".to_string(),
                    bytes: Bytes::from_static(b"%PDF"),
                })
                .collect(),
        )
        .await;

        let mut attribution = Attribution::from_landing(
            "utm_source=instagram&utm_campaign=spring",
            "https://instagram.com/",
            "/portfolio",
        );
        attribution.set_page_path("/questionnaire");
        let mut session = SessionStore::new();

        let outcome = submit_form(&transport, &form, &attribution, &mut session)
            .await
            .unwrap();

        assert_eq!(outcome.submission_id.as_deref(), Some("sub-1001"));
        assert_eq!(outcome.redirect_to, "/thank-you");
        assert_eq!(session.get(SessionKey::SubmissionId), Some("sub-1001"));
        assert_eq!(session.get(SessionKey::SchedulerName), Some("Avery Quinn"));
        assert_eq!(
            session.get(SessionKey::SchedulerEmail),
            Some("avery@example.com")
        );

        let sent = transport.last_sent();
        assert_eq!(sent["projectType"], "full-service");
        assert_eq!(sent["propertyStatus"], "just-purchased");
        assert_eq!(sent["budgetFullService"], "50k-100k");
        assert_eq!(sent["hasNoPlans"], false);
        assert_eq!(sent["utm_source"], "instagram");
        assert_eq!(sent["pagePath"], "/questionnaire");
        assert_eq!(sent["entry_page"], "/portfolio");
        assert_eq!(sent["language"], "en");
        assert_eq!(sent["files"].as_array().unwrap().len(), 2);
        assert!(sent["files"][0]["path"]
            .as_str()
            .unwrap()
            .starts_with("questionnaire/"));
        // Virtual budget was never set, so it must be absent on the wire
        assert!(sent.get("budgetVirtual").is_none());
    }

    // Spanish no-plans path: areas instead of files, no referral required,
    // Spanish confirmation path.
    #[tokio::test]
    async fn test_spanish_no_plans_flow_end_to_end() {
        let transport = RecordingTransport::accepting("sub-2002");
        let mut form = IntakeForm::new(&SPANISH);
        form.contact.name = "Lucía Márquez".to_string();
        form.contact.email = "lucia@example.com".to_string();
        form.set_project_type(ProjectType::Virtual);
        form.set_budget_virtual("tier-1");
        form.set_has_no_plans(true);
        form.set_area_quantity("area-living-room", 1).unwrap();
        form.set_area_quantity("area-bedroom", 3).unwrap();

        let attribution = Attribution::default();
        let mut session = SessionStore::new();

        let outcome = submit_form(&transport, &form, &attribution, &mut session)
            .await
            .unwrap();

        assert_eq!(outcome.redirect_to, "/es/gracias");

        let sent = transport.last_sent();
        assert_eq!(sent["hasNoPlans"], true);
        assert_eq!(sent["areas"]["area-living-room"], "1");
        assert_eq!(sent["areas"]["area-bedroom"], "3");
        assert_eq!(sent["language"], "es");
        assert_eq!(sent["locale"], "es-ES");
        assert!(sent["files"].as_array().unwrap().is_empty());
        assert!(sent["referralSources"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_surfaces_endpoint_message() {
        let transport = RecordingTransport::rejecting("mailbox quota exceeded");
        let mut form = IntakeForm::new(&ENGLISH);
        form.contact.email = "a@example.com".to_string();
        form.set_project_type(ProjectType::Virtual);
        form.set_budget_virtual("tier-1");
        form.set_has_no_plans(true);
        form.set_area_quantity("area-other", 1).unwrap();
        form.toggle_referral_source("press", true);

        let mut session = SessionStore::new();
        let err = submit_form(&transport, &form, &Attribution::default(), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Endpoint(ref m) if m == "mailbox quota exceeded"));
        assert_eq!(session.get(SessionKey::SubmissionId), None);
    }

    #[tokio::test]
    async fn test_rejection_without_message_shows_generic_banner() {
        let transport = RecordingTransport::rejecting("");
        let mut form = IntakeForm::new(&ENGLISH);
        form.contact.email = "a@example.com".to_string();
        form.set_project_type(ProjectType::Virtual);
        form.set_budget_virtual("tier-1");
        form.set_has_no_plans(true);
        form.set_area_quantity("area-other", 1).unwrap();
        form.toggle_referral_source("press", true);

        let mut session = SessionStore::new();
        let err = submit_form(&transport, &form, &Attribution::default(), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Endpoint(ref m) if m == ENGLISH.submit_failed));
    }

    #[tokio::test]
    async fn test_submission_blocked_while_uploads_running() {
        let transport = RecordingTransport::accepting("sub-x");
        let mut form = IntakeForm::new(&ENGLISH);
        form.contact.email = "a@example.com".to_string();
        form.set_project_type(ProjectType::Virtual);
        form.set_budget_virtual("tier-1");
        form.toggle_referral_source("press", true);
        let ids = form.select_files(&[("plan.pdf", 100)]).unwrap();
        form.mark_uploading(ids[0]);

        let mut session = SessionStore::new();
        let err = submit_form(&transport, &form, &Attribution::default(), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::UploadsInFlight));
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_the_wire() {
        let transport = RecordingTransport::accepting("sub-x");
        let form = IntakeForm::new(&ENGLISH);
        let mut session = SessionStore::new();

        let err = submit_form(&transport, &form, &Attribution::default(), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(_)));
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
