//! The account model and its SQLite schema.
//!
//! Accounts live in a single table with a `kind` discriminator and nullable
//! kind-specific columns. Each kind has its own natural key, enforced with a
//! partial unique index:
//! - bank: (user_id, bank_code, account_number)
//! - credit_card: (user_id, card_issuer, card_last4)
//! - cash: (user_id, name)
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, user::UserID};

/// An alias for the integer primary key of the account table.
pub type AccountId = i64;

/// The columns of the account table in the order `map_row_to_account` expects.
pub(crate) const ACCOUNT_COLUMNS: &str = "id, user_id, kind, name, balance, bank_code, bank_name, \
    branch, account_number, card_issuer, card_last4, credit_limit, credit_used, billing_day, \
    payment_due_day";

/// A financial account owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account in the application database.
    pub id: AccountId,
    /// The ID of the user that owns the account.
    pub user_id: UserID,
    /// The display name of the account.
    ///
    /// For cash accounts the name doubles as the natural key.
    pub name: String,
    /// The current balance as a signed amount.
    pub balance: f64,
    /// The kind-specific fields.
    #[serde(flatten)]
    pub details: AccountDetails,
}

/// The kind-specific fields of an account.
///
/// Serialized inline with the account, discriminated by a `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountDetails {
    /// Cash on hand. No fields beyond the common name and balance.
    Cash,
    /// A bank account.
    Bank(BankDetails),
    /// A credit card.
    CreditCard(CreditCardDetails),
}

/// The fields specific to bank accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDetails {
    /// The clearing code of the bank, part of the natural key.
    pub bank_code: String,
    /// The display name of the bank.
    pub bank_name: String,
    /// The branch name, if known.
    pub branch: Option<String>,
    /// The account number at the bank, part of the natural key.
    pub account_number: String,
}

/// The fields specific to credit cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardDetails {
    /// The card issuer, part of the natural key.
    pub card_issuer: String,
    /// The last four digits of the card number, part of the natural key.
    pub card_last4: String,
    /// The credit limit in whole currency units.
    pub credit_limit: i64,
    /// The amount of credit currently used in whole currency units.
    pub credit_used: i64,
    /// The day of month the statement is issued.
    pub billing_day: i64,
    /// The day of month the payment is due.
    pub payment_due_day: i64,
}

/// Create the account table and the partial unique indexes backing the
/// per-kind natural keys.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id),
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            balance REAL NOT NULL,
            bank_code TEXT,
            bank_name TEXT,
            branch TEXT,
            account_number TEXT,
            card_issuer TEXT,
            card_last4 TEXT,
            credit_limit INTEGER,
            credit_used INTEGER,
            billing_day INTEGER,
            payment_due_day INTEGER
        )",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS account_bank_key
            ON account (user_id, bank_code, account_number) WHERE kind = 'bank'",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS account_credit_card_key
            ON account (user_id, card_issuer, card_last4) WHERE kind = 'credit_card'",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS account_cash_key
            ON account (user_id, name) WHERE kind = 'cash'",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let kind: String = row.get(2)?;
    let name = row.get(3)?;
    let balance = row.get(4)?;

    let details = match kind.as_str() {
        "cash" => AccountDetails::Cash,
        "bank" => AccountDetails::Bank(BankDetails {
            bank_code: row.get(5)?,
            bank_name: row.get(6)?,
            branch: row.get(7)?,
            account_number: row.get(8)?,
        }),
        "credit_card" => AccountDetails::CreditCard(CreditCardDetails {
            card_issuer: row.get(9)?,
            card_last4: row.get(10)?,
            credit_limit: row.get(11)?,
            credit_used: row.get(12)?,
            billing_day: row.get(13)?,
            payment_due_day: row.get(14)?,
        }),
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown account kind {kind:?}").into(),
            ));
        }
    };

    Ok(Account {
        id,
        user_id,
        name,
        balance,
        details,
    })
}

/// Get all accounts belonging to the user `user_id`, ordered by ID.
///
/// # Errors
///
/// This function will return an error if there was an SQL error.
pub fn get_accounts_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = :user_id ORDER BY id"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}


#[cfg(test)]
mod account_serde_tests {
    use serde_json::json;

    use super::{Account, AccountDetails, BankDetails, CreditCardDetails};
    use crate::user::UserID;

    #[test]
    fn cash_account_serializes_with_kind_tag() {
        let account = Account {
            id: 1,
            user_id: UserID::new(7),
            name: "錢包現金".to_owned(),
            balance: 1200.0,
            details: AccountDetails::Cash,
        };

        let got = serde_json::to_value(&account).unwrap();

        assert_eq!(
            got,
            json!({
                "id": 1,
                "user_id": 7,
                "name": "錢包現金",
                "balance": 1200.0,
                "kind": "cash",
            })
        );
    }

    #[test]
    fn bank_account_round_trips_through_flattened_json() {
        let account = Account {
            id: 3,
            user_id: UserID::new(7),
            name: "Salary".to_owned(),
            balance: 54321.5,
            details: AccountDetails::Bank(BankDetails {
                bank_code: "004".to_owned(),
                bank_name: "Bank of Taiwan".to_owned(),
                branch: Some("Xinyi".to_owned()),
                account_number: "00123456789".to_owned(),
            }),
        };

        let text = serde_json::to_string(&account).unwrap();
        let parsed: Account = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, account);
    }

    #[test]
    fn credit_card_deserializes_from_tagged_json() {
        let got: Account = serde_json::from_value(json!({
            "id": 9,
            "user_id": 2,
            "name": "Everyday card",
            "balance": -420.0,
            "kind": "credit_card",
            "card_issuer": "CTBC",
            "card_last4": "1234",
            "credit_limit": 100000,
            "credit_used": 420,
            "billing_day": 5,
            "payment_due_day": 20,
        }))
        .unwrap();

        assert_eq!(
            got.details,
            AccountDetails::CreditCard(CreditCardDetails {
                card_issuer: "CTBC".to_owned(),
                card_last4: "1234".to_owned(),
                credit_limit: 100000,
                credit_used: 420,
                billing_day: 5,
                payment_due_day: 20,
            })
        );
    }
}
