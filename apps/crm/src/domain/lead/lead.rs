use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::form::LeadForm;
use super::value_objects::{Language, LeadSource, LeadStage, LeadStatus, Phone};
use crate::domain::timestamp::Timestamp;

/// Lead aggregate root
///
/// A prospective customer tracked through the sales pipeline.
///
/// # Invariants
/// - Name is never empty
/// - Phone is never empty and carries no whitespace
/// - `created_at` is set once at creation and never changes
/// - `updated_at` is refreshed on every write and never precedes `created_at`
///
/// # Example
/// ```
/// use leaddesk_crm::domain::{Lead, LeadForm};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let actor = Uuid::new_v4();
/// let mut form = LeadForm::empty(None);
/// form.name = "Ahmet Yılmaz".to_string();
/// form.set_phone("0555 123 45 67");
///
/// let lead = Lead::new(&form, actor, Utc::now()).expect("valid lead");
/// assert_eq!(lead.phone().as_str(), "05551234567");
/// assert_eq!(lead.owner_id(), Some(actor));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    id: Uuid,
    name: String,
    phone: Phone,
    language: Option<Language>,
    source: Option<LeadSource>,
    status: LeadStatus,
    stage: Option<LeadStage>,
    quote: Option<String>,
    owner_id: Option<Uuid>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

/// Form fields after validation
struct ValidatedFields {
    name: String,
    phone: Phone,
    quote: Option<String>,
    owner_id: Uuid,
}

fn validate(form: &LeadForm, default_owner: Uuid) -> Result<ValidatedFields, String> {
    let name = form.name.trim();
    let phone = Phone::normalize(form.phone.trim());
    if name.is_empty() || phone.is_empty() {
        return Err("Name and phone are required".to_string());
    }

    let quote = form.quote.trim();
    Ok(ValidatedFields {
        name: name.to_string(),
        phone: Phone::new(phone)?,
        quote: (!quote.is_empty()).then(|| quote.to_string()),
        owner_id: form.owner_id.unwrap_or(default_owner),
    })
}

impl Lead {
    /// Creates a new lead from a form
    ///
    /// # Arguments
    /// * `form` - The submitted form (its `id` is ignored)
    /// * `default_owner` - Owner used when the form leaves it unset, normally the acting user
    /// * `now` - Creation instant, used for both timestamps
    ///
    /// # Returns
    /// * `Ok(Lead)` - The new lead
    /// * `Err(String)` - If name or phone is blank
    pub fn new(form: &LeadForm, default_owner: Uuid, now: DateTime<Utc>) -> Result<Self, String> {
        let fields = validate(form, default_owner)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name: fields.name,
            phone: fields.phone,
            language: form.language,
            source: form.source,
            status: form.status,
            stage: form.stage,
            quote: fields.quote,
            owner_id: Some(fields.owner_id),
            created_at: Timestamp::from(now),
            updated_at: Timestamp::from(now),
        })
    }

    /// Applies an edit form to this lead
    ///
    /// Every editable field is overwritten and `updated_at` is refreshed.
    /// `created_at` is left untouched.
    pub fn apply(
        &mut self,
        form: &LeadForm,
        default_owner: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        let fields = validate(form, default_owner)?;

        self.name = fields.name;
        self.phone = fields.phone;
        self.language = form.language;
        self.source = form.source;
        self.status = form.status;
        self.stage = form.stage;
        self.quote = fields.quote;
        self.owner_id = Some(fields.owner_id);
        self.touch(now);
        Ok(())
    }

    /// Hands the lead over to another user
    pub fn reassign(&mut self, owner_id: Uuid, now: DateTime<Utc>) {
        self.owner_id = Some(owner_id);
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        // keeps updated_at >= created_at under clock skew
        let at = match self.created_at.as_datetime() {
            Some(created) if created > now => created,
            _ => now,
        };
        self.updated_at = Timestamp::from(at);
    }

    // ===== Getters =====

    /// Returns the lead's ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the contact name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized phone number
    pub fn phone(&self) -> &Phone {
        &self.phone
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn source(&self) -> Option<LeadSource> {
        self.source
    }

    pub fn status(&self) -> LeadStatus {
        self.status
    }

    pub fn stage(&self) -> Option<LeadStage> {
        self.stage
    }

    /// Returns the free-text price quote, if one was recorded
    pub fn quote(&self) -> Option<&str> {
        self.quote.as_deref()
    }

    /// Returns the owning user, if assigned
    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Reconstructs a Lead from persistence layer data
    ///
    /// Bypasses validation: rows are taken as stored so that the cache
    /// mirrors the backend exactly.
    ///
    /// # Note
    /// Only to be used by repository implementations for data reconstruction.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        name: String,
        phone: Phone,
        language: Option<Language>,
        source: Option<LeadSource>,
        status: LeadStatus,
        stage: Option<LeadStage>,
        quote: Option<String>,
        owner_id: Option<Uuid>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            phone,
            language,
            source,
            status,
            stage,
            quote,
            owner_id,
            created_at,
            updated_at,
        }
    }
}
