use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthFailure;

/// Errors surfaced to the interactive layer
///
/// Validation and authorization variants are raised before any backend
/// call. Backend failures are folded into [`CrmError::BackendUnavailable`]
/// at the coordinator boundary. None of them ends the session except where
/// noted.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Phone number already exists: {0}")]
    DuplicatePhone(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid credentials")]
    Unauthorized,

    /// Credentials were fine but the profile is deactivated; the provider
    /// session has already been signed out
    #[error("Account is disabled")]
    AccountInactive,

    #[error("No profile exists for this account")]
    ProfileMissing,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User {user_id} still owns {lead_count} lead(s); reassign them or deactivate the user instead")]
    HasDependentLeads { user_id: Uuid, lead_count: u64 },

    #[error("Nothing to export")]
    EmptyResult,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Confirmation is unknown, expired or belongs to another user")]
    InvalidConfirmation,

    #[error("{0}")]
    PartialTransfer(BulkTransferReport),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl CrmError {
    /// Creates a backend error from a repository or provider message
    pub fn backend(message: impl Into<String>) -> Self {
        CrmError::BackendUnavailable(message.into())
    }

    /// Creates a role-check failure
    pub fn forbidden(message: impl Into<String>) -> Self {
        CrmError::Forbidden(message.into())
    }
}

impl From<AuthFailure> for CrmError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::Rejected(_) => CrmError::Unauthorized,
            AuthFailure::Unavailable(message) => CrmError::BackendUnavailable(message),
        }
    }
}

/// Per-record outcome of a bulk owner transfer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkTransferReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<(Uuid, String)>,
}

impl BulkTransferReport {
    /// Number of leads the transfer was issued for
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl std::fmt::Display for BulkTransferReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} lead transfers succeeded",
            self.succeeded.len(),
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_auth_maps_to_unauthorized() {
        let err: CrmError = AuthFailure::Rejected("bad password".into()).into();
        assert!(matches!(err, CrmError::Unauthorized));
    }

    #[test]
    fn unavailable_auth_maps_to_backend() {
        let err: CrmError = AuthFailure::Unavailable("timeout".into()).into();
        assert!(matches!(err, CrmError::BackendUnavailable(m) if m == "timeout"));
    }

    #[test]
    fn report_summarises_n_of_m() {
        let report = BulkTransferReport {
            succeeded: vec![Uuid::new_v4(), Uuid::new_v4()],
            failed: vec![(Uuid::new_v4(), "gone".into())],
        };
        assert_eq!(report.to_string(), "2 of 3 lead transfers succeeded");
        assert!(!report.is_complete());
        assert_eq!(CrmError::PartialTransfer(report).to_string(), "2 of 3 lead transfers succeeded");
    }

    #[test]
    fn dependent_leads_message_names_count() {
        let err = CrmError::HasDependentLeads {
            user_id: Uuid::nil(),
            lead_count: 2,
        };
        assert!(err.to_string().contains("2 lead(s)"));
    }
}
