use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Subscription tier of an account. Stored as lowercase text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Subscription {
    #[default]
    Starter,
    Pro,
    Business,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, not exposed in JSON
    pub avatar_url: String,
    pub subscription: Subscription,
    #[serde(skip_serializing)]
    pub session_token: Option<String>, // set on login, cleared on logout
    pub verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>, // cleared once verified
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_defaults_to_starter() {
        assert_eq!(Subscription::default(), Subscription::Starter);
    }

    #[test]
    fn subscription_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Subscription::Business).unwrap(),
            "\"business\""
        );
        let parsed: Subscription = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(parsed, Subscription::Pro);
    }

    #[test]
    fn user_serialization_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            avatar_url: "https://www.gravatar.com/avatar/abc".to_string(),
            subscription: Subscription::Starter,
            session_token: Some("jwt-token".to_string()),
            verified: false,
            verification_token: Some("verify-token".to_string()),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("jwt-token"));
        assert!(!json.contains("verify-token"));
    }
}
