//! Locale tables driving the intake form
//!
//! Everything that used to differ between the English and Spanish form
//! variants lives here: field labels for validation messages, the referral
//! policy (the Spanish form never asked), and the confirmation path.

/// Human labels for every field the validator can point at.
#[derive(Debug)]
pub struct FieldLabels {
    pub contact: &'static str,
    pub project_type: &'static str,
    pub property_status: &'static str,
    pub budget_full_service: &'static str,
    pub budget_virtual: &'static str,
    pub plans: &'static str,
    pub areas: &'static str,
    pub referral: &'static str,
}

/// Per-locale strings and validation policy for the intake form.
#[derive(Debug)]
pub struct FormStrings {
    /// BCP 47 tag sent with the submission
    pub locale: &'static str,
    /// Two-letter language code sent with the submission
    pub language: &'static str,
    /// Where the browser is sent after a successful submission
    pub confirmation_path: &'static str,
    /// Whether at least one referral source must be checked
    pub require_referral: bool,
    /// Prefix for the "complete this field" validation message
    pub invalid_field_prefix: &'static str,
    /// Fallback banner when the submission endpoint fails without a message
    pub submit_failed: &'static str,
    pub labels: FieldLabels,
}

impl FormStrings {
    /// Validation message naming the first invalid field.
    pub fn invalid_field(&self, label: &str) -> String {
        format!("{}: {}", self.invalid_field_prefix, label)
    }
}

pub static ENGLISH: FormStrings = FormStrings {
    locale: "en-US",
    language: "en",
    confirmation_path: "/thank-you",
    require_referral: true,
    invalid_field_prefix: "Please complete the required field",
    submit_failed: "Something went wrong sending your questionnaire. Please try again.",
    labels: FieldLabels {
        contact: "Contact details",
        project_type: "Project type",
        property_status: "Property status",
        budget_full_service: "Project budget",
        budget_virtual: "Virtual design budget",
        plans: "Floor plans",
        areas: "Areas to design",
        referral: "How did you hear about us",
    },
};

pub static SPANISH: FormStrings = FormStrings {
    locale: "es-ES",
    language: "es",
    confirmation_path: "/es/gracias",
    require_referral: false,
    invalid_field_prefix: "Por favor completa el campo obligatorio",
    submit_failed: "No pudimos enviar tu cuestionario. Inténtalo de nuevo.",
    labels: FieldLabels {
        contact: "Datos de contacto",
        project_type: "Tipo de proyecto",
        property_status: "Estado de la propiedad",
        budget_full_service: "Presupuesto del proyecto",
        budget_virtual: "Presupuesto de diseño virtual",
        plans: "Planos",
        areas: "Espacios a diseñar",
        referral: "Cómo nos conociste",
    },
};
