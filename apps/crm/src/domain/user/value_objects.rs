use serde::{Deserialize, Serialize};
use std::fmt;

/// Username value object
///
/// Users sign in with a username. The hosted auth provider is keyed by
/// email, so every username maps to a synthetic address on a fixed internal
/// domain.
///
/// # Invariants
/// - Trimmed and non-empty
/// - Contains no whitespace and no '@'
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Creates a new Username value object
    ///
    /// # Returns
    /// * `Ok(Username)` - If the username is valid
    /// * `Err(String)` - If it is blank or contains forbidden characters
    ///
    /// # Example
    /// ```
    /// use leaddesk_crm::domain::Username;
    ///
    /// let username = Username::new(" Satis1 ").expect("valid username");
    /// assert_eq!(username.as_str(), "Satis1");
    /// assert_eq!(username.login_email("crm.local"), "Satis1@crm.local");
    /// ```
    pub fn new(username: impl AsRef<str>) -> Result<Self, String> {
        let username = username.as_ref().trim();
        if username.is_empty() {
            return Err("Username cannot be empty".to_string());
        }
        if username.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(format!("Invalid username: {}", username));
        }
        Ok(Username(username.to_string()))
    }

    /// Rebuilds a username read back from the store without validation
    pub fn from_persistence(value: String) -> Self {
        Username(value)
    }

    /// Returns the address used to authenticate with the auth provider
    pub fn login_email(&self, domain: &str) -> String {
        format!("{}@{}", self.0, domain)
    }

    /// Case-insensitive comparison, matching how login addresses collide
    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }

    /// Returns the username as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

literal_enum! {
    /// Authorization role of a profile
    pub enum Role {
        /// Full access, including deletes and user administration
        Admin => "admin",
        /// Works leads, cannot delete or administer users
        Sales => "sales",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Sales
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_username() {
        assert!(Username::new("admin").is_ok());
    }

    #[test]
    fn username_is_trimmed() {
        assert_eq!(Username::new("  Satis1\n").unwrap().as_str(), "Satis1");
    }

    #[test]
    fn empty_username_is_rejected() {
        assert!(Username::new("").is_err());
        assert!(Username::new("   ").is_err());
    }

    #[test]
    fn username_with_inner_space_is_rejected() {
        assert!(Username::new("sales one").is_err());
    }

    #[test]
    fn username_with_at_sign_is_rejected() {
        assert!(Username::new("a@b").is_err());
    }

    #[test]
    fn login_email_uses_domain() {
        let username = Username::new("admin").unwrap();
        assert_eq!(username.login_email("leaddesk.local"), "admin@leaddesk.local");
    }

    #[test]
    fn matches_ignores_case() {
        let username = Username::new("Satis1").unwrap();
        assert!(username.matches("satis1"));
        assert!(username.matches(" SATIS1 "));
        assert!(!username.matches("satis2"));
    }

    #[test]
    fn role_literals() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!("sales".parse::<Role>().unwrap(), Role::Sales);
        assert_eq!(Role::default(), Role::Sales);
        assert!("root".parse::<Role>().is_err());
    }
}
