//! Stores each user's dashboard layouts, one per screen size.
//!
//! Layouts are opaque to the server. They are kept as serialized JSON text and
//! only checked to be arrays when read back.

use rusqlite::Connection;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{Error, UserID};

/// Dashboard layouts keyed by screen size label, e.g. "lg" or "md".
pub type Layouts = Map<String, Value>;

/// Create the dashboard_layout table in the database.
///
/// Each user has at most one layout per screen size.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_layout_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS dashboard_layout (
            user_id INTEGER NOT NULL,
            screen_size TEXT NOT NULL,
            layout TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY(user_id, screen_size),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Save the layouts of `user_id`, replacing any stored layout for the same screen size.
///
/// Layouts for screen sizes not in `layouts` are left untouched. Either every
/// layout is saved or none are.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - Database transaction fails
/// - SQL query preparation or execution fails
pub fn save_layouts(user_id: UserID, layouts: &Layouts, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;
    let updated_at = OffsetDateTime::now_utc();

    {
        let mut statement = transaction.prepare(
            "INSERT INTO dashboard_layout (user_id, screen_size, layout, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, screen_size)
            DO UPDATE SET layout = excluded.layout, updated_at = excluded.updated_at",
        )?;

        for (screen_size, layout) in layouts {
            let serialized_layout = serde_json::to_string(layout)
                .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

            statement.execute((
                user_id.as_i64(),
                screen_size,
                serialized_layout,
                updated_at,
            ))?;
        }
    }

    transaction.commit()?;
    Ok(())
}

/// Get the stored layouts of `user_id`.
///
/// A stored layout that is not a JSON array is returned as an empty array.
/// Returns an empty map if the user has not saved any layouts.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - Database connection fails
/// - SQL query preparation or execution fails
pub fn get_layouts(user_id: UserID, connection: &Connection) -> Result<Layouts, Error> {
    let mut statement = connection.prepare(
        "SELECT screen_size, layout FROM dashboard_layout WHERE user_id = ?1 ORDER BY screen_size",
    )?;

    let rows = statement
        .query_map([user_id.as_i64()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    let layouts = rows
        .into_iter()
        .map(|(screen_size, raw_layout)| {
            let layout = match serde_json::from_str::<Value>(&raw_layout) {
                Ok(layout @ Value::Array(_)) => layout,
                Ok(_) | Err(_) => {
                    tracing::warn!(
                        "Stored layout for user {user_id} and screen size {screen_size} is not a JSON array, using an empty layout"
                    );
                    Value::Array(Vec::new())
                }
            };

            (screen_size, layout)
        })
        .collect();

    Ok(layouts)
}
