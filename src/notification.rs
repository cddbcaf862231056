//! User notifications. A plain owned store; delivery is out of scope.
use rusqlite::{Connection, params};
use time::OffsetDateTime;

use crate::{Error, user::UserID};

/// A notification shown to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// The ID of the notification in the application database.
    pub id: i64,
    /// The ID of the user the notification belongs to.
    pub user_id: UserID,
    /// The notification text.
    pub message: String,
    /// When the notification was created.
    pub created_at: OffsetDateTime,
}

/// Create the notification table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_notification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notification (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id),
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a notification for the user `user_id`.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn create_notification(
    user_id: UserID,
    message: &str,
    connection: &Connection,
) -> Result<Notification, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO notification (user_id, message, created_at) VALUES (?1, ?2, ?3)",
        params![user_id.as_i64(), message, created_at],
    )?;

    Ok(Notification {
        id: connection.last_insert_rowid(),
        user_id,
        message: message.to_owned(),
        created_at,
    })
}

/// Get all notifications belonging to the user `user_id`, newest first.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn get_notifications_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Notification>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, message, created_at FROM notification
                WHERE user_id = :user_id ORDER BY id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(Notification {
                id: row.get(0)?,
                user_id: UserID::new(row.get(1)?),
                message: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .map(|maybe_notification| maybe_notification.map_err(|error| error.into()))
        .collect()
}
