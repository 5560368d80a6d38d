use serde::Serialize;
use uuid::Uuid;

use super::value_objects::{Role, Username};

/// Profile of a user who can sign in
///
/// The password lives with the auth provider only; this record carries the
/// identity, role and activation flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: Username,
    pub role: Role,
    pub active: bool,
}

impl Profile {
    /// Creates an active profile for an identity issued by the auth provider
    pub fn new(id: Uuid, username: Username, role: Role) -> Self {
        Self {
            id,
            username,
            role,
            active: true,
        }
    }

    /// Returns true for the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_is_active() {
        let profile = Profile::new(Uuid::new_v4(), Username::new("satis").unwrap(), Role::Sales);
        assert!(profile.active);
        assert!(!profile.is_admin());
    }

    #[test]
    fn admin_role_is_admin() {
        let profile = Profile::new(Uuid::new_v4(), Username::new("admin").unwrap(), Role::Admin);
        assert!(profile.is_admin());
    }
}
