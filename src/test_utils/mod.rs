#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState, Email, PasswordHash, User, auth::create_token, build_router, create_user,
    initialize_db, pagination::PaginationConfig, user::NewUser,
};

pub(crate) const TEST_SECRET: &str = "averysecretsecret";

/// An in-memory database with all of the application's tables.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize_db(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user with a placeholder password hash.
#[track_caller]
pub(crate) fn create_test_user(connection: &Connection, email: &str) -> User {
    create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: Email::new(email).expect("Invalid test email"),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        connection,
    )
    .expect("Could not create test user")
}

/// App state backed by an in-memory database, using UTC and a cheap hashing cost.
pub(crate) fn get_test_app_state() -> AppState {
    AppState::new(
        Connection::open_in_memory().expect("Could not create in-memory SQLite database"),
        TEST_SECRET,
        "Etc/UTC",
        PaginationConfig::default(),
    )
    .expect("Could not create app state")
    .with_password_hash_cost(4)
}

/// A test server running the full router over `state`.
pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server")
}

/// Insert a user directly into the database of `state` and issue an access token for them.
#[track_caller]
pub(crate) fn create_user_with_token(state: &AppState, email: &str) -> (User, String) {
    let user = {
        let connection = state.db_connection.lock().unwrap();
        create_test_user(&connection, email)
    };

    let token = create_token(&user, &state.token_keys.encoding_key, state.token_duration)
        .expect("Could not create token");

    (user, token)
}
