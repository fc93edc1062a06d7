//! Authentication middleware that checks the bearer token on protected routes.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Email, Error, UserID, auth::token::decode_token};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying access tokens.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.token_keys.decoding_key.clone(),
        }
    }
}

/// The user that sent an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    /// The ID of the user the access token was issued to.
    pub user_id: UserID,
    /// The email of the user the access token was issued to.
    pub email: Email,
}

/// Middleware function that checks for a valid bearer token.
///
/// The [AuthUser] is placed into the request extensions and the request is
/// executed normally if the token is valid, otherwise a 401 JSON error is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<AuthUser>` to receive the user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(rejection) if rejection.is_missing() => return Error::MissingToken.into_response(),
            Err(_) => return Error::InvalidToken.into_response(),
        };

    let claims = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
    });

    next.run(Request::from_parts(parts, body)).await
}
