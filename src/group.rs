//! Expense-splitting groups and their splits.
//!
//! A group has many members, each referencing a user. A split belongs to a
//! group and has participants. The table name `"group"` is quoted everywhere
//! since GROUP is a reserved word in SQL.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, user::UserID};

/// An alias for the integer primary key of the group table.
pub type GroupId = i64;

/// An alias for the integer primary key of the split table.
pub type SplitId = i64;

/// A group of users that split expenses with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// The ID of the group in the application database.
    pub id: GroupId,
    /// The display name of the group.
    pub name: String,
}

/// An expense split inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// The ID of the split in the application database.
    pub id: SplitId,
    /// The group the split belongs to.
    pub group_id: GroupId,
    /// A free-form description of the shared expense.
    pub description: String,
    /// The total amount that was split.
    pub amount: f64,
}

/// Create the group table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_group_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"group\" (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create the group member table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_group_member_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS group_member (
                id INTEGER PRIMARY KEY,
                group_id INTEGER NOT NULL REFERENCES \"group\"(id),
                user_id INTEGER NOT NULL REFERENCES user(id),
                UNIQUE(group_id, user_id)
                )",
        (),
    )?;

    Ok(())
}

/// Create the split table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_split_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS split (
                id INTEGER PRIMARY KEY,
                group_id INTEGER NOT NULL REFERENCES \"group\"(id),
                description TEXT NOT NULL,
                amount REAL NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create the split participant table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_split_participant_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS split_participant (
                id INTEGER PRIMARY KEY,
                split_id INTEGER NOT NULL REFERENCES split(id),
                user_id INTEGER NOT NULL REFERENCES user(id),
                share REAL NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new group.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn create_group(name: &str, connection: &Connection) -> Result<Group, Error> {
    connection.execute("INSERT INTO \"group\" (name) VALUES (?1)", params![name])?;

    Ok(Group {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
    })
}

/// Add the user `user_id` to the group `group_id`.
///
/// # Errors
///
/// This function will return an error if the user is already a member of the
/// group or if there was an SQL error.
pub fn add_group_member(
    group_id: GroupId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO group_member (group_id, user_id) VALUES (?1, ?2)",
        params![group_id, user_id.as_i64()],
    )?;

    Ok(())
}

/// Create and insert a split in the group `group_id`.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn create_split(
    group_id: GroupId,
    description: &str,
    amount: f64,
    connection: &Connection,
) -> Result<Split, Error> {
    connection.execute(
        "INSERT INTO split (group_id, description, amount) VALUES (?1, ?2, ?3)",
        params![group_id, description, amount],
    )?;

    Ok(Split {
        id: connection.last_insert_rowid(),
        group_id,
        description: description.to_owned(),
        amount,
    })
}

/// Record that the user `user_id` owes `share` of the split `split_id`.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn add_split_participant(
    split_id: SplitId,
    user_id: UserID,
    share: f64,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO split_participant (split_id, user_id, share) VALUES (?1, ?2, ?3)",
        params![split_id, user_id.as_i64(), share],
    )?;

    Ok(())
}

/// Get all groups the user `user_id` is a member of, ordered by ID.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn get_groups_by_user(user_id: UserID, connection: &Connection) -> Result<Vec<Group>, Error> {
    connection
        .prepare(
            "SELECT g.id, g.name FROM \"group\" g
                INNER JOIN group_member m ON m.group_id = g.id
                WHERE m.user_id = :user_id
                ORDER BY g.id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(Group {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .map(|maybe_group| maybe_group.map_err(|error| error.into()))
        .collect()
}

/// Get the IDs of all groups that have no members left.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn find_orphaned_groups(connection: &Connection) -> Result<Vec<GroupId>, Error> {
    connection
        .prepare(
            "SELECT g.id FROM \"group\" g
                WHERE NOT EXISTS (SELECT 1 FROM group_member m WHERE m.group_id = g.id)",
        )?
        .query_map([], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

/// The payload for creating a group.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupData {
    /// The display name of the group.
    pub name: String,
}

/// The state needed to manage a user's groups.
#[derive(Debug, Clone)]
pub struct GroupState {
    /// The database connection for managing groups.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GroupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the groups the authenticated user belongs to.
pub async fn get_groups(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Group>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    get_groups_by_user(user_id, &connection).map(Json)
}

/// A route handler for creating a group. The caller becomes its first member.
pub async fn post_group(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<GroupData>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");
    let transaction = Transaction::new_unchecked(&connection, TransactionBehavior::Immediate)?;

    let group = create_group(&data.name, &transaction)?;
    add_group_member(group.id, user_id, &transaction)?;

    transaction.commit()?;

    Ok((StatusCode::CREATED, Json(group)).into_response())
}
