// Domain layer module exports
// Lead, note and profile records plus the repository contracts the
// hosted store adapters implement. Nothing here touches I/O.

#[macro_use]
mod literal;

pub mod lead;
pub mod note;
pub mod repositories;
pub mod timestamp;
pub mod user;

pub use lead::{Language, Lead, LeadForm, LeadSource, LeadStage, LeadStatus, Phone};
pub use note::Note;
pub use timestamp::Timestamp;
pub use user::{Profile, Role, Username};
