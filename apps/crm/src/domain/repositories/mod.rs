// Repository contracts for the hosted tabular store
// Adapters in crate::infrastructure implement these

pub mod lead_repository;
pub mod note_repository;
pub mod profile_repository;

pub use lead_repository::LeadRepository;
pub use note_repository::NoteRepository;
pub use profile_repository::ProfileRepository;
