//! The HTTP endpoints for listing and upserting the caller's accounts.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{
        core::{Account, get_accounts_by_user},
        upsert::{UpsertAccountData, upsert_account},
    },
    user::UserID,
};

/// The state needed to read and upsert a user's accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the accounts of the authenticated user.
pub async fn get_accounts(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    get_accounts_by_user(user_id, &connection).map(Json)
}

/// A route handler for the kind-keyed account upsert.
///
/// Responds with the stored account, whether it was created or updated.
pub async fn post_account(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<UpsertAccountData>,
) -> Result<Json<Account>, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    upsert_account(user_id, &data, &connection).map(Json)
}
