//! Unclassified notes: raw captured text waiting to become expense records.
//!
//! Only the staging store lives here. Whatever pipeline fills or drains it is
//! out of scope.
use rusqlite::{Connection, params};

use crate::{Error, user::UserID};

/// A piece of captured text that has not been turned into a record yet.
#[derive(Debug, Clone, PartialEq)]
pub struct UnclassifiedNote {
    /// The ID of the note in the application database.
    pub id: i64,
    /// The ID of the user the note belongs to.
    pub user_id: UserID,
    /// The raw captured text.
    pub text: String,
}

/// Create the unclassified note table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_unclassified_note_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS unclassified_note (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id),
                text TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert a captured note for the user `user_id`.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn create_unclassified_note(
    user_id: UserID,
    text: &str,
    connection: &Connection,
) -> Result<UnclassifiedNote, Error> {
    connection.execute(
        "INSERT INTO unclassified_note (user_id, text) VALUES (?1, ?2)",
        params![user_id.as_i64(), text],
    )?;

    Ok(UnclassifiedNote {
        id: connection.last_insert_rowid(),
        user_id,
        text: text.to_owned(),
    })
}

/// Get all unclassified notes belonging to the user `user_id`.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn get_unclassified_notes_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<UnclassifiedNote>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, text FROM unclassified_note
                WHERE user_id = :user_id ORDER BY id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(UnclassifiedNote {
                id: row.get(0)?,
                user_id: UserID::new(row.get(1)?),
                text: row.get(2)?,
            })
        })?
        .map(|maybe_note| maybe_note.map_err(|error| error.into()))
        .collect()
}
