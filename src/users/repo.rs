use crate::users::repo_types::User;
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, avatar_url, subscription,
                   session_token, verified, verification_token, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, avatar_url, subscription,
                   session_token, verified, verification_token, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find the user holding an outstanding verification token.
    pub async fn find_by_verification_token(
        db: &PgPool,
        token: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, avatar_url, subscription,
                   session_token, verified, verification_token, created_at
            FROM users
            WHERE verification_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new unverified user. Email uniqueness is also enforced by
    /// the UNIQUE constraint, which closes the check-then-insert race.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        avatar_url: &str,
        verification_token: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, avatar_url, verification_token)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, avatar_url, subscription,
                      session_token, verified, verification_token, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(avatar_url)
        .bind(verification_token)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Store the session token issued at login. Overwrites any previous one,
    /// which invalidates the prior session.
    pub async fn set_session_token(db: &PgPool, id: Uuid, token: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET session_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Drop the session token. A no-op when none is stored.
    pub async fn clear_session_token(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET session_token = NULL WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Flip the record to verified and retire the verification token.
    pub async fn mark_verified(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET verified = true, verification_token = NULL WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
