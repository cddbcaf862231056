//! Database setup for the application.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    group::{
        create_group_member_table, create_group_table, create_split_participant_table,
        create_split_table,
    },
    lexicon::create_user_lexicon_table,
    note::create_unclassified_note_table,
    notification::create_notification_table,
    record::create_record_table,
    user::create_user_table,
};

/// Create the application's tables if they do not exist yet.
///
/// Tables are created in dependency order so that the foreign keys can be
/// declared. Safe to call on an already initialized database.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_record_table(&transaction)?;
    create_group_table(&transaction)?;
    create_group_member_table(&transaction)?;
    create_split_table(&transaction)?;
    create_split_participant_table(&transaction)?;
    create_notification_table(&transaction)?;
    create_unclassified_note_table(&transaction)?;
    create_user_lexicon_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
