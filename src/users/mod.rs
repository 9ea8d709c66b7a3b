use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/current", post(handlers::current))
        .route("/verify/:token", get(handlers::verify_email))
        .route("/verify", post(handlers::resend_verification))
}
