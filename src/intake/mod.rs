// Lead intake engine - the questionnaire state machine
//
// One engine replaces the two copy-pasted bilingual form variants: the state
// machine is parameterized over a locale table (labels, validation policy,
// confirmation path) injected at construction. It owns the per-file upload
// lifecycle, the conditional required-field rules, batch fan-out/fan-in
// against the upload broker, and final payload assembly for the send-email
// endpoint.

pub mod attribution;
pub mod form;
pub mod locale;
pub mod session;
pub mod submit;
pub mod transport;
pub mod uploader;

pub use attribution::Attribution;
pub use form::{FileEntry, FileStatus, IntakeForm, ProjectType, PropertyStatus};
pub use locale::{FormStrings, ENGLISH, SPANISH};
pub use session::{SessionKey, SessionStore};
pub use submit::{submit_form, QuestionnaireSubmission, SubmitError, SubmitOutcome};
pub use transport::{HttpTransport, IntakeTransport, TransportError};
pub use uploader::{upload_batch, FilePayload, UploadError};
