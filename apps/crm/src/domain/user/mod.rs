// User domain module

pub mod profile;
pub mod value_objects;

pub use profile::Profile;
pub use value_objects::{Role, Username};
