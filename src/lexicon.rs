//! The per-user lexicon: term to category overrides used when classifying
//! expenses.
use rusqlite::{Connection, params};

use crate::{Error, user::UserID};

/// A single term-to-category override.
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconEntry {
    /// The ID of the entry in the application database.
    pub id: i64,
    /// The ID of the user the override belongs to.
    pub user_id: UserID,
    /// The term to match, e.g. a merchant name.
    pub term: String,
    /// The category to assign when the term matches.
    pub category: String,
}

/// Create the user lexicon table.
///
/// Each user can have at most one override per term.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_lexicon_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_lexicon (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id),
                term TEXT NOT NULL,
                category TEXT NOT NULL,
                UNIQUE(user_id, term)
                )",
        (),
    )?;

    Ok(())
}

/// Insert a term-to-category override for the user `user_id`.
///
/// # Errors
///
/// This function will return an error if the user already has an override for
/// `term` or if there was an SQL error.
pub fn create_lexicon_entry(
    user_id: UserID,
    term: &str,
    category: &str,
    connection: &Connection,
) -> Result<LexiconEntry, Error> {
    connection.execute(
        "INSERT INTO user_lexicon (user_id, term, category) VALUES (?1, ?2, ?3)",
        params![user_id.as_i64(), term, category],
    )?;

    Ok(LexiconEntry {
        id: connection.last_insert_rowid(),
        user_id,
        term: term.to_owned(),
        category: category.to_owned(),
    })
}

/// Get all lexicon entries belonging to the user `user_id`.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn get_lexicon_entries_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<LexiconEntry>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, term, category FROM user_lexicon
                WHERE user_id = :user_id ORDER BY id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(LexiconEntry {
                id: row.get(0)?,
                user_id: UserID::new(row.get(1)?),
                term: row.get(2)?,
                category: row.get(3)?,
            })
        })?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}
