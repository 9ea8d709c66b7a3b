use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            JwtKeys, LoginRequest, LoginResponse, MessageResponse, PublicUser, RegisterRequest,
            RegisterResponse, RegisteredUser, ResendVerificationRequest,
        },
        password::{hash_password, verify_password},
        repo_types::User,
        services::{
            avatar_url_for, generate_verification_token, is_valid_email, AuthUser, SessionUser,
        },
    },
};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::EmailInUse);
    }

    let password_hash = hash_password(&payload.password)?;
    let avatar_url = avatar_url_for(&payload.email);
    let verification_token = generate_verification_token();

    let user = User::create(
        &state.db,
        &payload.email,
        &password_hash,
        &avatar_url,
        &verification_token,
    )
    .await?;

    // The record is already persisted; a failed send only loses the email.
    if let Err(e) = state
        .mailer
        .send_verification(&user.email, &verification_token)
        .await
    {
        warn!(error = %e, email = %user.email, "verification email send failed");
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: RegisteredUser {
                email: user.email,
                subscription: user.subscription,
                avatar_url: user.avatar_url,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    // Unknown email and wrong password answer identically.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or(ApiError::Auth("Email or password is wrong"))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Auth("Email or password is wrong"));
    }

    if !user.verified {
        warn!(user_id = %user.id, "login attempt on unverified account");
        return Err(ApiError::Auth("Your account is not verified"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;
    User::set_session_token(&state.db, user.id, &token).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    User::clear_session_token(&state.db, user_id).await?;
    info!(user_id = %user_id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current(SessionUser(user): SessionUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::find_by_verification_token(&state.db, &token)
        .await?
        .ok_or(ApiError::NotFound)?;

    User::mark_verified(&state.db, user.id).await?;

    info!(user_id = %user.id, email = %user.email, "email verified");
    Ok(Json(MessageResponse {
        message: "Email confirmed successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(mut payload): Json<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or(ApiError::NotFound)?;

    if user.verified {
        return Err(ApiError::AlreadyVerified);
    }

    // An unverified record always carries the token minted at registration.
    let token = user.verification_token.as_deref().ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!(
            "unverified user {} has no verification token",
            user.id
        ))
    })?;

    state.mailer.send_verification(&user.email, token).await?;

    info!(user_id = %user.id, email = %user.email, "verification email re-sent");
    Ok(Json(MessageResponse {
        message: "Verification email sent",
    }))
}
