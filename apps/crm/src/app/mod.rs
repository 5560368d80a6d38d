// Application layer
// Session gate, record cache, mutation coordinator and the context wiring them

pub mod confirm;
pub mod context;
pub mod coordinator;
pub mod errors;
pub mod session;
pub mod store;
pub mod view;

pub use confirm::{ConfirmationLedger, ConfirmationToken, PendingAction};
pub use context::{AppContext, Backend};
pub use coordinator::{
    AttachedNote, LeadSaved, MutationCoordinator, MutationPolicy, ToggleOutcome, UserForm,
};
pub use errors::{BulkTransferReport, CrmError};
pub use session::{AuthState, SessionGate};
pub use store::{RecordStore, Snapshot};
pub use view::LeadView;
