use uuid::Uuid;

use super::lead::Lead;
use super::value_objects::{Language, LeadSource, LeadStage, LeadStatus, Phone};

/// Editable draft of a lead, as held by the create/edit form
///
/// `id` is `None` while creating. `pending_note` is saved as a note on the
/// resulting lead when it is non-blank at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadForm {
    pub id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub language: Option<Language>,
    pub source: Option<LeadSource>,
    pub status: LeadStatus,
    pub stage: Option<LeadStage>,
    pub quote: String,
    pub owner_id: Option<Uuid>,
    pub pending_note: String,
}

impl LeadForm {
    /// A blank creation form owned by `owner_id`
    pub fn empty(owner_id: Option<Uuid>) -> Self {
        Self {
            id: None,
            name: String::new(),
            phone: String::new(),
            language: Some(Language::Tr),
            source: Some(LeadSource::FacebookAd),
            status: LeadStatus::New,
            stage: None,
            quote: String::new(),
            owner_id,
            pending_note: String::new(),
        }
    }

    /// An edit form pre-filled from a stored lead
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            id: Some(lead.id()),
            name: lead.name().to_string(),
            phone: lead.phone().as_str().to_string(),
            language: Some(lead.language().unwrap_or(Language::Tr)),
            source: Some(lead.source().unwrap_or(LeadSource::FacebookAd)),
            status: lead.status(),
            stage: lead.stage(),
            quote: lead.quote().unwrap_or_default().to_string(),
            owner_id: lead.owner_id(),
            pending_note: String::new(),
        }
    }

    /// Sets the phone field, stripping whitespace as it is typed
    pub fn set_phone(&mut self, raw: &str) {
        self.phone = Phone::normalize(raw);
    }

    /// Returns the trimmed pending note, if any
    pub fn pending_note(&self) -> Option<&str> {
        let note = self.pending_note.trim();
        (!note.is_empty()).then_some(note)
    }

    /// Returns true when the form would create a new lead
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn empty_form_defaults() {
        let owner = Uuid::new_v4();
        let form = LeadForm::empty(Some(owner));

        assert!(form.is_new());
        assert_eq!(form.language, Some(Language::Tr));
        assert_eq!(form.source, Some(LeadSource::FacebookAd));
        assert_eq!(form.status, LeadStatus::New);
        assert_eq!(form.owner_id, Some(owner));
        assert!(form.pending_note().is_none());
    }

    #[test]
    fn set_phone_strips_whitespace() {
        let mut form = LeadForm::empty(None);
        form.set_phone("0532 987 65 43");
        assert_eq!(form.phone, "05329876543");
    }

    #[test]
    fn pending_note_is_trimmed() {
        let mut form = LeadForm::empty(None);
        form.pending_note = "   ".to_string();
        assert!(form.pending_note().is_none());

        form.pending_note = "  called back \n".to_string();
        assert_eq!(form.pending_note(), Some("called back"));
    }

    #[test]
    fn from_lead_fills_missing_optionals_with_defaults() {
        let mut draft = LeadForm::empty(None);
        draft.name = "John Doe".to_string();
        draft.phone = "+44123".to_string();
        draft.language = None;
        draft.source = None;
        draft.quote = "1500$".to_string();
        let lead = Lead::new(&draft, Uuid::new_v4(), Utc::now()).unwrap();

        let form = LeadForm::from_lead(&lead);
        assert_eq!(form.id, Some(lead.id()));
        assert_eq!(form.language, Some(Language::Tr));
        assert_eq!(form.source, Some(LeadSource::FacebookAd));
        assert_eq!(form.quote, "1500$");
        assert!(form.pending_note.is_empty());
    }
}
