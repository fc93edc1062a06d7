//! Creates and verifies the signed access tokens that clients send in the
//! `Authorization: Bearer <token>` header.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Email, Error, User, UserID};

/// The contents of an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub user_id: UserID,
    /// The email of the user the token was issued to.
    pub email: Email,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
}

/// Issue an access token for `user` that is valid for `duration`.
///
/// # Errors
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn create_token(
    user: &User,
    encoding_key: &EncodingKey,
    duration: Duration,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        user_id: user.id,
        email: user.email.clone(),
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns an [Error::InvalidToken] if the token is malformed, was not signed
/// with the matching key, or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected access token: {error}");
            Error::InvalidToken
        })
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, EncodingKey};
    use time::{Duration, OffsetDateTime};

    use crate::{
        Email, Error, PasswordHash, User, UserID,
        auth::token::{create_token, decode_token},
    };

    fn test_user() -> User {
        User {
            id: UserID::new(42),
            name: "Test User".to_owned(),
            email: Email::new("test@test.com").unwrap(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn decode_gives_claims_for_user() {
        let user = test_user();
        let token = create_token(
            &user,
            &EncodingKey::from_secret(b"foobar"),
            Duration::hours(1),
        )
        .unwrap();

        let claims = decode_token(&token, &DecodingKey::from_secret(b"foobar")).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.exp - claims.iat, Duration::hours(1).whole_seconds());
    }

    #[test]
    fn decode_fails_with_wrong_secret() {
        let token = create_token(
            &test_user(),
            &EncodingKey::from_secret(b"foobar"),
            Duration::hours(1),
        )
        .unwrap();

        let result = decode_token(&token, &DecodingKey::from_secret(b"notfoobar"));

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn decode_fails_on_expired_token() {
        let token = create_token(
            &test_user(),
            &EncodingKey::from_secret(b"foobar"),
            -Duration::hours(1),
        )
        .unwrap();

        let result = decode_token(&token, &DecodingKey::from_secret(b"foobar"));

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn decode_fails_on_garbage() {
        let result = decode_token("not.a.token", &DecodingKey::from_secret(b"foobar"));

        assert_eq!(result, Err(Error::InvalidToken));
    }
}
