// Access token helpers
// Tokens follow the hosted provider's shape: HS256, `sub` = user id,
// audience "authenticated"

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience the provider stamps on user tokens
pub const AUDIENCE: &str = "authenticated";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID (subject)
    pub sub: Uuid,
    /// Login address the token was issued for
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
}

/// Creates an access token for a user
///
/// # Example
/// ```
/// use chrono::Duration;
/// use leaddesk_crm::auth::jwt::{create_token, verify_token};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(user_id, "admin@crm.local", "secret", Duration::hours(1)).unwrap();
/// assert_eq!(verify_token(&token, "secret").unwrap().sub, user_id);
/// ```
pub fn create_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, String> {
    let expiry = Utc::now() + ttl;
    let claims = Claims {
        sub: user_id,
        email: Some(email.to_string()),
        aud: AUDIENCE.to_string(),
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes an access token
///
/// Checks signature, expiry and audience.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let mut validation = Validation::default();
    validation.set_audience(&[AUDIENCE]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)
        .map(|data| data.claims)
        .map_err(|e| e.to_string())
}
