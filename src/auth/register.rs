//! Handles requests to register a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Email, Error, PasswordHash, User, ValidatedPassword,
    auth::token::create_token,
    user::{NewUser, create_user},
};

/// The state needed to register a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The key for signing the access token issued on registration.
    pub encoding_key: EncodingKey,
    /// How long issued access tokens stay valid.
    pub token_duration: Duration,
    /// The bcrypt cost for hashing the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.token_keys.encoding_key.clone(),
            token_duration: state.token_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data a client sends to register.
///
/// Every field is optional here so that a missing field gets the same error
/// message as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    /// The user's display name.
    pub name: Option<String>,
    /// The email the user will log in with.
    pub email: Option<String>,
    /// The user's chosen password, in plain text.
    pub password: Option<String>,
}

/// The response to a successful registration or log-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// A human readable status message.
    pub message: &'static str,
    /// The access token to send with subsequent requests.
    pub token: String,
    /// The user the token was issued to.
    pub user: User,
}

/// A route handler for registering a new user.
///
/// Responds with 201 Created, an access token and the new user.
///
/// # Errors
///
/// Returns an error response if:
/// - the name, email or password are missing or empty,
/// - the email is invalid or already registered,
/// - the password is too weak,
/// - or an internal error occurred.
pub async fn register_user(
    State(state): State<RegistrationState>,
    form: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let Json(form) = form?;

    let name = form.name.as_deref().map(str::trim).unwrap_or_default();
    let raw_email = form.email.as_deref().map(str::trim).unwrap_or_default();
    let raw_password = form.password.as_deref().unwrap_or_default();

    if name.is_empty() || raw_email.is_empty() || raw_password.is_empty() {
        return Err(Error::Validation(
            "name, email and password are required".to_owned(),
        ));
    }

    let email = Email::new(raw_email)?;
    let password = ValidatedPassword::new(raw_password, &[name, raw_email])?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_user(
            NewUser {
                name: name.to_owned(),
                email,
                password_hash,
            },
            &connection,
        )?
    };

    let token = create_token(&user, &state.encoding_key, state.token_duration)?;
    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user,
        }),
    ))
}
