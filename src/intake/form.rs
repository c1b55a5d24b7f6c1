//! Questionnaire form state machine
//!
//! Owns the file-upload lifecycle and the conditional required-field rules.
//! Files are identified by a generated id, never by list position: an upload
//! completion that arrives after its file was removed simply finds no entry
//! and does nothing.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use super::attribution::Attribution;
use super::locale::FormStrings;
use super::submit::{QuestionnaireSubmission, SubmittedFile};

/// Maximum number of files per submission.
pub const MAX_FILES: usize = 10;

/// Maximum size of a single file, in bytes.
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum quantity per area field.
pub const MAX_AREA_QUANTITY: u8 = 10;

/// The nine fixed area-quantity fields offered when the user has no plans.
pub const AREA_IDS: [&str; 9] = [
    "area-living-room",
    "area-dining-room",
    "area-kitchen",
    "area-bedroom",
    "area-bathroom",
    "area-office",
    "area-terrace",
    "area-outdoor",
    "area-other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    FullService,
    Virtual,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::FullService => "full-service",
            ProjectType::Virtual => "virtual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyStatus {
    JustPurchased,
    Renovating,
    CurrentHome,
    Other,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::JustPurchased => "just-purchased",
            PropertyStatus::Renovating => "renovating",
            PropertyStatus::CurrentHome => "current-home",
            PropertyStatus::Other => "other",
        }
    }
}

/// Lifecycle of one attached file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Idle,
    Uploading,
    Uploaded,
    Error,
}

/// Client-local record of one attached file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub status: FileStatus,
    /// Object key in the storage bucket, present once uploaded
    pub path: Option<String>,
}

impl FileEntry {
    /// A file counts toward "ready to submit" only when uploaded with a path.
    pub fn is_ready(&self) -> bool {
        self.status == FileStatus::Uploaded
            && self.path.as_deref().map_or(false, |p| !p.is_empty())
    }
}

/// Contact block; at least one field must be set.
#[derive(Debug, Clone, Default)]
pub struct ContactFields {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ContactFields {
    fn any_set(&self) -> bool {
        [&self.name, &self.phone, &self.email, &self.address]
            .iter()
            .any(|f| !f.trim().is_empty())
    }
}

/// Rejected file selections. A count violation rejects the whole selection;
/// a size violation rejects the batch but leaves previously accepted files
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("a maximum of {MAX_FILES} files can be attached")]
    TooManyFiles { selected: usize, existing: usize },
    #[error("{name} is larger than the 10 MB per-file limit")]
    FileTooLarge { name: String, size: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AreaError {
    #[error("unknown area field: {0}")]
    UnknownArea(String),
    #[error("area quantity {0} is out of range (0-10)")]
    QuantityOutOfRange(u8),
}

/// First-invalid-field validation failure, carrying the human label the UI
/// surfaces in its error message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub label: &'static str,
    pub message: String,
}

/// The questionnaire state machine. One instance per form, parameterized over
/// a locale table.
#[derive(Debug)]
pub struct IntakeForm {
    strings: &'static FormStrings,
    pub contact: ContactFields,
    project_type: Option<ProjectType>,
    has_no_plans: bool,
    areas: BTreeMap<&'static str, u8>,
    referral_sources: BTreeSet<String>,
    property_status: Option<PropertyStatus>,
    property_status_other: Option<String>,
    budget_full_service: Option<String>,
    budget_virtual: Option<String>,
    files: Vec<FileEntry>,
}

impl IntakeForm {
    pub fn new(strings: &'static FormStrings) -> Self {
        Self {
            strings,
            contact: ContactFields::default(),
            project_type: None,
            has_no_plans: false,
            areas: BTreeMap::new(),
            referral_sources: BTreeSet::new(),
            property_status: None,
            property_status_other: None,
            budget_full_service: None,
            budget_virtual: None,
            files: Vec::new(),
        }
    }

    pub fn strings(&self) -> &'static FormStrings {
        self.strings
    }

    pub fn set_project_type(&mut self, project_type: ProjectType) {
        self.project_type = Some(project_type);
    }

    pub fn set_has_no_plans(&mut self, has_no_plans: bool) {
        self.has_no_plans = has_no_plans;
    }

    pub fn has_no_plans(&self) -> bool {
        self.has_no_plans
    }

    pub fn set_property_status(&mut self, status: PropertyStatus, other_detail: Option<String>) {
        self.property_status = Some(status);
        self.property_status_other = other_detail;
    }

    pub fn set_budget_full_service(&mut self, tier: impl Into<String>) {
        self.budget_full_service = Some(tier.into());
    }

    pub fn set_budget_virtual(&mut self, tier: impl Into<String>) {
        self.budget_virtual = Some(tier.into());
    }

    pub fn set_area_quantity(&mut self, area_id: &str, quantity: u8) -> Result<(), AreaError> {
        let Some(id) = AREA_IDS.iter().copied().find(|&id| id == area_id) else {
            return Err(AreaError::UnknownArea(area_id.to_string()));
        };
        if quantity > MAX_AREA_QUANTITY {
            return Err(AreaError::QuantityOutOfRange(quantity));
        }
        if quantity == 0 {
            self.areas.remove(id);
        } else {
            self.areas.insert(id, quantity);
        }
        Ok(())
    }

    pub fn toggle_referral_source(&mut self, source: &str, checked: bool) {
        if checked {
            self.referral_sources.insert(source.to_string());
        } else {
            self.referral_sources.remove(source);
        }
    }

    // ─── file lifecycle ──────────────────────────────────────────────────

    /// Add a selection of files. The whole selection is rejected when it
    /// would exceed the file count or when any single file is oversized;
    /// files accepted earlier stay untouched either way.
    pub fn select_files(
        &mut self,
        picks: &[(&str, u64)],
    ) -> Result<Vec<Uuid>, SelectionError> {
        if self.files.len() + picks.len() > MAX_FILES {
            return Err(SelectionError::TooManyFiles {
                selected: picks.len(),
                existing: self.files.len(),
            });
        }
        if let Some((name, size)) = picks.iter().find(|(_, size)| *size > MAX_FILE_SIZE_BYTES) {
            return Err(SelectionError::FileTooLarge {
                name: name.to_string(),
                size: *size,
            });
        }

        let mut ids = Vec::with_capacity(picks.len());
        for (name, size) in picks {
            let id = Uuid::new_v4();
            self.files.push(FileEntry {
                id,
                name: name.to_string(),
                size: *size,
                status: FileStatus::Idle,
                path: None,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    /// Remove a file in any state. In-flight network calls for it are not
    /// aborted; their completions become no-ops.
    pub fn remove_file(&mut self, id: Uuid) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id != id);
        self.files.len() != before
    }

    pub fn mark_uploading(&mut self, id: Uuid) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.status = FileStatus::Uploading;
                true
            }
            None => false,
        }
    }

    /// Record a successful upload. No-op (returns false) when the file was
    /// removed while its upload was in flight.
    pub fn complete_upload(&mut self, id: Uuid, path: String) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.status = FileStatus::Uploaded;
                entry.path = Some(path);
                true
            }
            None => false,
        }
    }

    /// Record a failed upload. No-op when the file was removed in flight.
    pub fn fail_upload(&mut self, id: Uuid) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.status = FileStatus::Error;
                entry.path = None;
                true
            }
            None => false,
        }
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn file_name(&self, id: Uuid) -> Option<String> {
        self.files.iter().find(|f| f.id == id).map(|f| f.name.clone())
    }

    pub fn uploads_in_flight(&self) -> bool {
        self.files
            .iter()
            .any(|f| f.status == FileStatus::Uploading)
    }

    fn entry_mut(&mut self, id: Uuid) -> Option<&mut FileEntry> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    // ─── validation and payload assembly ─────────────────────────────────

    /// Check every form-level rule, reporting the first invalid field's
    /// human label. Synchronous and idempotent: re-running on unchanged
    /// state yields the same result.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let labels = &self.strings.labels;

        if !self.contact.any_set() {
            return Err(self.invalid(labels.contact));
        }

        let Some(project_type) = self.project_type else {
            return Err(self.invalid(labels.project_type));
        };

        match project_type {
            ProjectType::FullService => {
                match self.property_status {
                    None => return Err(self.invalid(labels.property_status)),
                    Some(PropertyStatus::Other) => {
                        let detail_set = self
                            .property_status_other
                            .as_deref()
                            .map_or(false, |d| !d.trim().is_empty());
                        if !detail_set {
                            return Err(self.invalid(labels.property_status));
                        }
                    }
                    Some(_) => {}
                }
                if !is_set(&self.budget_full_service) {
                    return Err(self.invalid(labels.budget_full_service));
                }
            }
            ProjectType::Virtual => {
                if !is_set(&self.budget_virtual) {
                    return Err(self.invalid(labels.budget_virtual));
                }
            }
        }

        if self.has_no_plans {
            if !self.areas.values().any(|&q| q > 0) {
                return Err(self.invalid(labels.areas));
            }
        } else {
            let all_ready = !self.files.is_empty() && self.files.iter().all(FileEntry::is_ready);
            if !all_ready {
                return Err(self.invalid(labels.plans));
            }
        }

        if self.strings.require_referral && self.referral_sources.is_empty() {
            return Err(self.invalid(labels.referral));
        }

        Ok(())
    }

    /// Validate and assemble the submission payload.
    pub fn build_submission(
        &self,
        attribution: &Attribution,
    ) -> Result<QuestionnaireSubmission, ValidationError> {
        self.validate()?;

        let project_type = self
            .project_type
            .ok_or_else(|| self.invalid(self.strings.labels.project_type))?;

        // Only positive quantities travel on the wire, as strings.
        let areas: BTreeMap<String, String> = self
            .areas
            .iter()
            .filter(|(_, &q)| q > 0)
            .map(|(&id, &q)| (id.to_string(), q.to_string()))
            .collect();

        let files: Vec<SubmittedFile> = self
            .files
            .iter()
            .filter(|f| f.is_ready())
            .map(|f| SubmittedFile {
                name: f.name.clone(),
                size: f.size,
                path: f.path.clone().unwrap_or_default(),
            })
            .collect();

        let mut attribution = attribution.clone();
        attribution.language = self.strings.language.to_string();
        attribution.locale = self.strings.locale.to_string();

        Ok(QuestionnaireSubmission {
            name: self.contact.name.clone(),
            phone: self.contact.phone.clone(),
            email: self.contact.email.clone(),
            address: self.contact.address.clone(),
            project_type: project_type.as_str().to_string(),
            has_no_plans: self.has_no_plans,
            property_status: self.property_status.map(|s| s.as_str().to_string()),
            property_status_other: self.property_status_other.clone(),
            budget_full_service: self.budget_full_service.clone(),
            budget_virtual: self.budget_virtual.clone(),
            referral_sources: self.referral_sources.iter().cloned().collect(),
            areas,
            files,
            attribution,
        })
    }

    fn invalid(&self, label: &'static str) -> ValidationError {
        ValidationError {
            label,
            message: self.strings.invalid_field(label),
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}
