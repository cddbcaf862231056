//! Expense records: the store and the HTTP endpoints for creating, listing,
//! and deleting them.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{AppState, Error, user::UserID};

/// An alias for the integer primary key of the record table.
pub type RecordId = i64;

/// A single expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The ID of the record in the application database.
    pub id: RecordId,
    /// The ID of the user that owns the record.
    pub user_id: UserID,
    /// The amount spent.
    pub amount: f64,
    /// The day the expense happened.
    pub date: Date,
    /// A free-form description of the expense.
    pub description: String,
    /// The category label, if one was assigned.
    pub category: Option<String>,
}

/// The payload for creating an expense record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordData {
    /// The amount spent.
    pub amount: f64,
    /// The day the expense happened. Must not be in the future.
    pub date: Date,
    /// A free-form description of the expense.
    pub description: String,
    /// The category label, if one was assigned.
    #[serde(default)]
    pub category: Option<String>,
}

/// Create the record table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS record (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id),
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert an expense record for the user `user_id`.
///
/// Records describe purchases that have already happened, so `data.date` must
/// be today or earlier.
///
/// # Errors
///
/// Returns [Error::FutureDate] if `data.date` is after today, or
/// [Error::SqlError] if an SQL related error occurred.
pub fn create_record(
    user_id: UserID,
    data: &RecordData,
    connection: &Connection,
) -> Result<Record, Error> {
    let today = OffsetDateTime::now_utc().date();
    if data.date > today {
        return Err(Error::FutureDate(data.date));
    }

    connection.execute(
        "INSERT INTO record (user_id, amount, date, description, category)
            VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id.as_i64(),
            data.amount,
            data.date,
            data.description,
            data.category
        ],
    )?;

    Ok(Record {
        id: connection.last_insert_rowid(),
        user_id,
        amount: data.amount,
        date: data.date,
        description: data.description.clone(),
        category: data.category.clone(),
    })
}

/// Get all records belonging to the user `user_id`, newest first.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn get_records_by_user(user_id: UserID, connection: &Connection) -> Result<Vec<Record>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, date, description, category FROM record
                WHERE user_id = :user_id ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_record)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Delete the record `record_id` if it belongs to the user `user_id`.
///
/// # Errors
///
/// Returns [Error::DeleteMissingRecord] if no such record exists for the user.
/// A record owned by someone else is reported the same way so the response
/// does not leak whether the ID exists.
pub fn delete_record(
    record_id: RecordId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM record WHERE id = ?1 AND user_id = ?2",
        params![record_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecord);
    }

    Ok(())
}

fn map_row_to_record(row: &rusqlite::Row) -> Result<Record, rusqlite::Error> {
    Ok(Record {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        date: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
    })
}

/// The state needed to manage a user's expense records.
#[derive(Debug, Clone)]
pub struct RecordState {
    /// The database connection for managing records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the records of the authenticated user, newest
/// first.
pub async fn get_records(
    State(state): State<RecordState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Record>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    get_records_by_user(user_id, &connection).map(Json)
}

/// A route handler for creating an expense record.
pub async fn post_record(
    State(state): State<RecordState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<RecordData>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let record = create_record(user_id, &data, &connection)?;

    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// A route handler for deleting one of the caller's expense records.
pub async fn delete_record_endpoint(
    State(state): State<RecordState>,
    Extension(user_id): Extension<UserID>,
    Path(record_id): Path<RecordId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    delete_record(record_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
