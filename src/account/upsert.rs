//! Kind-keyed account upserts.
//!
//! Bank and credit-card upserts use `INSERT .. ON CONFLICT .. DO UPDATE`
//! against the partial unique index for their kind. Cash accounts are a
//! find-then-act upsert; the cash natural key index plus the serialized
//! database connection keep that path free of duplicate rows.
//!
//! An upsert's update path only ever overwrites display fields and the
//! balance. Natural key fields are never modified.
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::core::{
        ACCOUNT_COLUMNS, Account, AccountDetails, BankDetails, CreditCardDetails,
        map_row_to_account,
    },
    user::UserID,
};

/// The payload for upserting an account, tagged by `kind`.
///
/// The owner comes from the authenticated request, never from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertAccountData {
    /// The display name of the account.
    pub name: String,
    /// The balance to store. On update the stored balance is overwritten
    /// with this value, not incremented.
    pub balance: f64,
    /// The kind-specific fields.
    #[serde(flatten)]
    pub details: AccountDetails,
}

/// Insert the account described by `data` for the user `user_id`, or update
/// the existing account with the same natural key.
///
/// Returns the stored account, including its ID.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn upsert_account(
    user_id: UserID,
    data: &UpsertAccountData,
    connection: &Connection,
) -> Result<Account, Error> {
    match &data.details {
        AccountDetails::Cash => upsert_cash(user_id, &data.name, data.balance, connection),
        AccountDetails::Bank(bank) => {
            upsert_bank(user_id, &data.name, data.balance, bank, connection)
        }
        AccountDetails::CreditCard(card) => {
            upsert_credit_card(user_id, &data.name, data.balance, card, connection)
        }
    }
}

fn upsert_bank(
    user_id: UserID,
    name: &str,
    balance: f64,
    bank: &BankDetails,
    connection: &Connection,
) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO account
            (user_id, kind, name, balance, bank_code, bank_name, branch, account_number)
            VALUES (?1, 'bank', ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (user_id, bank_code, account_number) WHERE kind = 'bank'
            DO UPDATE SET name = excluded.name, balance = excluded.balance,
                bank_name = excluded.bank_name, branch = excluded.branch",
        params![
            user_id.as_i64(),
            name,
            balance,
            bank.bank_code,
            bank.bank_name,
            bank.branch,
            bank.account_number
        ],
    )?;

    // `last_insert_rowid` is stale when the conflict arm ran, so fetch the row
    // back by its natural key.
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account
                WHERE user_id = ?1 AND kind = 'bank' AND bank_code = ?2 AND account_number = ?3"
        ))?
        .query_row(
            params![user_id.as_i64(), bank.bank_code, bank.account_number],
            map_row_to_account,
        )
        .map_err(|error| error.into())
}

fn upsert_credit_card(
    user_id: UserID,
    name: &str,
    balance: f64,
    card: &CreditCardDetails,
    connection: &Connection,
) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO account
            (user_id, kind, name, balance, card_issuer, card_last4,
                credit_limit, credit_used, billing_day, payment_due_day)
            VALUES (?1, 'credit_card', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (user_id, card_issuer, card_last4) WHERE kind = 'credit_card'
            DO UPDATE SET name = excluded.name, balance = excluded.balance,
                credit_limit = excluded.credit_limit, credit_used = excluded.credit_used,
                billing_day = excluded.billing_day, payment_due_day = excluded.payment_due_day",
        params![
            user_id.as_i64(),
            name,
            balance,
            card.card_issuer,
            card.card_last4,
            card.credit_limit,
            card.credit_used,
            card.billing_day,
            card.payment_due_day
        ],
    )?;

    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account
                WHERE user_id = ?1 AND kind = 'credit_card' AND card_issuer = ?2 AND card_last4 = ?3"
        ))?
        .query_row(
            params![user_id.as_i64(), card.card_issuer, card.card_last4],
            map_row_to_account,
        )
        .map_err(|error| error.into())
}

fn upsert_cash(
    user_id: UserID,
    name: &str,
    balance: f64,
    connection: &Connection,
) -> Result<Account, Error> {
    let existing = connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account
                WHERE user_id = ?1 AND kind = 'cash' AND name = ?2"
        ))?
        .query_row(params![user_id.as_i64(), name], map_row_to_account);

    match existing {
        Ok(account) => {
            connection.execute(
                "UPDATE account SET balance = ?1 WHERE id = ?2",
                params![balance, account.id],
            )?;

            Ok(Account { balance, ..account })
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            connection.execute(
                "INSERT INTO account (user_id, kind, name, balance) VALUES (?1, 'cash', ?2, ?3)",
                params![user_id.as_i64(), name, balance],
            )?;

            Ok(Account {
                id: connection.last_insert_rowid(),
                user_id,
                name: name.to_owned(),
                balance,
                details: AccountDetails::Cash,
            })
        }
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod upsert_account_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::{Connection, params};

    use crate::{
        PasswordHash,
        account::core::{
            AccountDetails, BankDetails, CreditCardDetails, create_account_table,
            get_accounts_by_user,
        },
        user::{UserID, create_user, create_user_table},
    };

    use super::{UpsertAccountData, upsert_account};

    fn get_test_connection() -> (Connection, UserID) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");
        create_account_table(&connection).expect("Could not create account table");

        let user = create_user(
            EmailAddress::from_str("accounts@test.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (connection, user.id)
    }

    fn bank_data(name: &str, balance: f64) -> UpsertAccountData {
        UpsertAccountData {
            name: name.to_owned(),
            balance,
            details: AccountDetails::Bank(BankDetails {
                bank_code: "004".to_owned(),
                bank_name: "Bank of Taiwan".to_owned(),
                branch: Some("Xinyi".to_owned()),
                account_number: "00123456789".to_owned(),
            }),
        }
    }

    fn credit_card_data(balance: f64, credit_used: i64) -> UpsertAccountData {
        UpsertAccountData {
            name: "Everyday card".to_owned(),
            balance,
            details: AccountDetails::CreditCard(CreditCardDetails {
                card_issuer: "CTBC".to_owned(),
                card_last4: "1234".to_owned(),
                credit_limit: 100_000,
                credit_used,
                billing_day: 5,
                payment_due_day: 20,
            }),
        }
    }

    fn cash_data(name: &str, balance: f64) -> UpsertAccountData {
        UpsertAccountData {
            name: name.to_owned(),
            balance,
            details: AccountDetails::Cash,
        }
    }

    #[track_caller]
    fn count_accounts(connection: &Connection) -> i64 {
        connection
            .query_row("SELECT COUNT(id) FROM account", [], |row| row.get(0))
            .expect("could not count accounts")
    }

    #[test]
    fn bank_upsert_creates_account() {
        let (connection, user_id) = get_test_connection();

        let account = upsert_account(user_id, &bank_data("Salary", 54_321.5), &connection)
            .expect("Could not upsert bank account");

        assert!(account.id > 0);
        assert_eq!(account.user_id, user_id);
        assert_eq!(account.name, "Salary");
        assert_eq!(account.balance, 54_321.5);
        assert_eq!(count_accounts(&connection), 1);
    }

    #[test]
    fn bank_upsert_with_same_key_updates_in_place() {
        let (connection, user_id) = get_test_connection();
        let first = upsert_account(user_id, &bank_data("Salary", 100.0), &connection).unwrap();

        let mut reseed = bank_data("Renamed salary", 9_000.0);
        if let AccountDetails::Bank(bank) = &mut reseed.details {
            bank.bank_name = "臺灣銀行".to_owned();
            bank.branch = None;
        }
        let second = upsert_account(user_id, &reseed, &connection).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Renamed salary");
        assert_eq!(second.balance, 9_000.0);
        assert_eq!(second.details, reseed.details);
        assert_eq!(count_accounts(&connection), 1);
    }

    #[test]
    fn bank_upsert_overwrites_balance_instead_of_incrementing() {
        let (connection, user_id) = get_test_connection();
        upsert_account(user_id, &bank_data("Salary", 100.0), &connection).unwrap();

        let account = upsert_account(user_id, &bank_data("Salary", 100.0), &connection).unwrap();

        assert_eq!(account.balance, 100.0);
    }

    #[test]
    fn bank_upsert_keeps_other_users_rows_separate() {
        let (connection, user_id) = get_test_connection();
        let other_user = create_user(
            EmailAddress::from_str("other@test.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let mine = upsert_account(user_id, &bank_data("Salary", 1.0), &connection).unwrap();
        let theirs =
            upsert_account(other_user.id, &bank_data("Salary", 2.0), &connection).unwrap();

        assert_ne!(mine.id, theirs.id);
        assert_eq!(count_accounts(&connection), 2);
    }

    #[test]
    fn credit_card_upsert_with_same_key_updates_in_place() {
        let (connection, user_id) = get_test_connection();
        let first = upsert_account(user_id, &credit_card_data(-420.0, 420), &connection).unwrap();

        let second =
            upsert_account(user_id, &credit_card_data(-1_350.0, 1_350), &connection).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.balance, -1_350.0);
        if let AccountDetails::CreditCard(card) = &second.details {
            assert_eq!(card.credit_used, 1_350);
        } else {
            panic!("want a credit card, got {:?}", second.details);
        }
        assert_eq!(count_accounts(&connection), 1);
    }

    #[test]
    fn cash_upsert_creates_wallet() {
        let (connection, user_id) = get_test_connection();

        let account = upsert_account(user_id, &cash_data("錢包現金", 500.0), &connection)
            .expect("Could not upsert cash account");

        assert!(account.id > 0);
        assert_eq!(account.details, AccountDetails::Cash);
        assert_eq!(count_accounts(&connection), 1);
    }

    #[test]
    fn cash_reseed_updates_balance_without_new_row() {
        let (connection, user_id) = get_test_connection();
        let first = upsert_account(user_id, &cash_data("錢包現金", 500.0), &connection).unwrap();

        let second = upsert_account(user_id, &cash_data("錢包現金", 1_200.0), &connection).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.balance, 1_200.0);
        assert_eq!(count_accounts(&connection), 1);

        let accounts = get_accounts_by_user(user_id, &connection).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 1_200.0);
    }

    #[test]
    fn cash_accounts_with_different_names_get_separate_rows() {
        let (connection, user_id) = get_test_connection();

        upsert_account(user_id, &cash_data("錢包現金", 500.0), &connection).unwrap();
        upsert_account(user_id, &cash_data("Coin jar", 80.0), &connection).unwrap();

        assert_eq!(count_accounts(&connection), 2);
    }

    #[test]
    fn cash_natural_key_rejects_duplicate_rows() {
        let (connection, user_id) = get_test_connection();
        upsert_account(user_id, &cash_data("錢包現金", 500.0), &connection).unwrap();

        // Bypass the upsert to prove the partial index guards the invariant
        // even if two writers raced past the SELECT.
        let result = connection.execute(
            "INSERT INTO account (user_id, kind, name, balance) VALUES (?1, 'cash', ?2, ?3)",
            params![user_id.as_i64(), "錢包現金", 0.0],
        );

        assert!(result.is_err(), "duplicate cash row must be rejected");
    }
}
