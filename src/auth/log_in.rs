//! Handles log-in requests and issues access tokens.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Email, Error,
    auth::{register::AuthResponse, token::create_token},
    user::get_user_by_email,
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The key for signing access tokens.
    pub encoding_key: EncodingKey,
    /// How long issued access tokens stay valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.token_keys.encoding_key.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user to log in.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Debug, Default, Deserialize)]
pub struct LogInForm {
    /// Email entered during log-in.
    pub email: Option<String>,
    /// Password entered during log-in.
    pub password: Option<String>,
}

/// Handler for log-in requests.
///
/// Responds with an access token and the user on success.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
///
/// An unknown email and a wrong password get the same response so that clients
/// cannot tell which emails are registered.
pub async fn log_in(
    State(state): State<LoginState>,
    form: Result<Json<LogInForm>, JsonRejection>,
) -> Result<Json<AuthResponse>, Error> {
    let Json(form) = form?;

    let (raw_email, raw_password) = match (form.email.as_deref(), form.password.as_deref()) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => return Err(Error::MissingCredentials),
    };

    let email = Email::new(raw_email).map_err(|_| Error::InvalidCredentials)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(raw_password)? {
        return Err(Error::InvalidCredentials);
    }

    let token = create_token(&user, &state.encoding_key, state.token_duration)?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user,
    }))
}
