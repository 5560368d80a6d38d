// Authentication seam
// The hosted provider owns credentials; this module defines the contract
// plus the token and password helpers its adapters share.

pub mod jwt;
pub mod password;
pub mod provider;

pub use provider::{AuthFailure, AuthProvider, AuthSession};
