//! The full-account data purge.
//!
//! Deletes everything a user owns in one transaction: per-user rows first,
//! then group memberships, then any group left without members (together with
//! its splits), and finally the user row itself. Either every step commits or
//! none do.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde_json::{Value, json};

use crate::{AppState, Error, group::find_orphaned_groups, user::UserID};

/// Irreversibly delete all data owned by the user `user_id`, including the
/// user row itself.
///
/// Groups shared with other users survive; the caller merely exits them.
/// Groups whose last member was the caller are deleted along with their
/// splits.
///
/// # Errors
///
/// This function will return an error if any SQL statement failed. In that
/// case the transaction is rolled back and no data is deleted.
pub fn purge_user_data(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let id = user_id.as_i64();

    // Rows owned directly by the user. None of these reference each other,
    // so the order within this block does not matter.
    transaction.execute("DELETE FROM notification WHERE user_id = ?1", params![id])?;
    transaction.execute(
        "DELETE FROM unclassified_note WHERE user_id = ?1",
        params![id],
    )?;
    transaction.execute("DELETE FROM user_lexicon WHERE user_id = ?1", params![id])?;
    transaction.execute(
        "DELETE FROM split_participant WHERE user_id = ?1",
        params![id],
    )?;
    transaction.execute("DELETE FROM record WHERE user_id = ?1", params![id])?;
    transaction.execute("DELETE FROM account WHERE user_id = ?1", params![id])?;

    // Exit all groups, then clean up any group left without members.
    // Participants before splits before the group row, to satisfy the
    // foreign keys.
    transaction.execute("DELETE FROM group_member WHERE user_id = ?1", params![id])?;

    for group_id in find_orphaned_groups(&transaction)? {
        transaction.execute(
            "DELETE FROM split_participant WHERE split_id IN
                (SELECT id FROM split WHERE group_id = ?1)",
            params![group_id],
        )?;
        transaction.execute("DELETE FROM split WHERE group_id = ?1", params![group_id])?;
        transaction.execute("DELETE FROM \"group\" WHERE id = ?1", params![group_id])?;
    }

    transaction.execute("DELETE FROM user WHERE id = ?1", params![id])?;

    transaction.commit()?;

    Ok(())
}

/// The state needed to purge all of a user's data.
#[derive(Debug, Clone)]
pub struct PurgeState {
    /// The connection to the database holding the user's data.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PurgeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for purging everything the caller owns.
///
/// Responds with `{ "ok": true }` once the purge transaction commits. The
/// caller's token keeps verifying until it expires, but the user row is gone
/// so they cannot log in again.
pub async fn delete_me(
    State(state): State<PurgeState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    purge_user_data(user_id, &connection)?;

    tracing::info!("purged all data for user {user_id}");

    Ok(Json(json!({ "ok": true })))
}
