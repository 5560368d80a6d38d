// Lead domain module
// Contains the lead aggregate, its edit form and the enumerated values

#![allow(clippy::module_inception)]

pub mod form;
pub mod lead;
pub mod value_objects;

pub use form::LeadForm;
pub use lead::Lead;
pub use value_objects::{Language, LeadSource, LeadStage, LeadStatus, Phone};
