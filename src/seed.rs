//! Demo data for trying the API out without registering.
//!
//! The whole seed is an upsert: rerunning it against the same database resets
//! the demo rows to these values instead of duplicating them.
use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    Error, PasswordHash,
    account::{
        Account, AccountDetails, BankDetails, CreditCardDetails, UpsertAccountData, upsert_account,
    },
    user::{User, create_user, get_user_by_email},
};

/// The email address identifying the demo user.
pub const DEMO_EMAIL: &str = "demo@bookkeeper.test";

/// The password the demo user can log in with.
pub const DEMO_PASSWORD: &str = "averysafeandsecurepassword";

/// Ensure the demo user and their accounts exist, creating or updating rows
/// as needed.
///
/// The accounts are keyed by their natural keys (bank code and account number,
/// card issuer and last four digits, or the cash account name), so rerunning
/// the seed resets balances in place and never adds rows.
///
/// # Errors
///
/// This function will return an error if the demo password could not be
/// hashed or if there was an SQL error.
pub fn seed_demo_data(connection: &Connection) -> Result<(User, Vec<Account>), Error> {
    let email = EmailAddress::from_str(DEMO_EMAIL)
        .map_err(|_| Error::InvalidEmail(DEMO_EMAIL.to_owned()))?;

    let user = match get_user_by_email(&email, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            let password_hash =
                PasswordHash::from_raw_password(DEMO_PASSWORD, PasswordHash::DEFAULT_COST)?;

            create_user(email, password_hash, connection)?
        }
        Err(error) => return Err(error),
    };

    let accounts = demo_accounts()
        .iter()
        .map(|account_data| upsert_account(user.id, account_data, connection))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((user, accounts))
}

/// The fixed set of demo accounts: two banks, a cash wallet and two credit
/// cards.
fn demo_accounts() -> Vec<UpsertAccountData> {
    vec![
        UpsertAccountData {
            name: "台新薪轉".to_owned(),
            balance: 86_400.0,
            details: AccountDetails::Bank(BankDetails {
                bank_code: "812".to_owned(),
                bank_name: "台新銀行".to_owned(),
                branch: Some("仁愛分行".to_owned()),
                account_number: "2001-0123-4567".to_owned(),
            }),
        },
        UpsertAccountData {
            name: "郵局儲金".to_owned(),
            balance: 12_050.0,
            details: AccountDetails::Bank(BankDetails {
                bank_code: "700".to_owned(),
                bank_name: "中華郵政".to_owned(),
                branch: None,
                account_number: "0001234-0567890".to_owned(),
            }),
        },
        UpsertAccountData {
            name: "錢包現金".to_owned(),
            balance: 1_730.0,
            details: AccountDetails::Cash,
        },
        UpsertAccountData {
            name: "國泰 CUBE 卡".to_owned(),
            balance: -8_750.0,
            details: AccountDetails::CreditCard(CreditCardDetails {
                card_issuer: "國泰世華".to_owned(),
                card_last4: "3415".to_owned(),
                credit_limit: 120_000,
                credit_used: 8_750,
                billing_day: 5,
                payment_due_day: 20,
            }),
        },
        UpsertAccountData {
            name: "台新 GoGo 卡".to_owned(),
            balance: 0.0,
            details: AccountDetails::CreditCard(CreditCardDetails {
                card_issuer: "台新銀行".to_owned(),
                card_last4: "7021".to_owned(),
                credit_limit: 80_000,
                credit_used: 0,
                billing_day: 15,
                payment_due_day: 3,
            }),
        },
    ]
}

#[cfg(test)]
mod seed_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{db::initialize, user::get_user_by_email};

    use super::{DEMO_EMAIL, DEMO_PASSWORD, seed_demo_data};

    fn get_test_connection() -> Connection {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        connection
    }

    #[track_caller]
    fn count_accounts_by_kind(kind: &str, connection: &Connection) -> i64 {
        connection
            .query_row(
                "SELECT COUNT(*) FROM account WHERE kind = :kind",
                &[(":kind", &kind)],
                |row| row.get(0),
            )
            .expect("could not count accounts")
    }

    #[test]
    fn seeding_twice_creates_each_row_once() {
        let connection = get_test_connection();

        seed_demo_data(&connection).unwrap();
        seed_demo_data(&connection).unwrap();

        let demo_users: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM user WHERE email = :email",
                &[(":email", &DEMO_EMAIL)],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(demo_users, 1);
        assert_eq!(count_accounts_by_kind("bank", &connection), 2);
        assert_eq!(count_accounts_by_kind("cash", &connection), 1);
        assert_eq!(count_accounts_by_kind("credit_card", &connection), 2);
    }

    #[test]
    fn reseeding_resets_balances_without_new_rows() {
        let connection = get_test_connection();
        let (_, accounts) = seed_demo_data(&connection).unwrap();
        let mut seeded_ids: Vec<i64> = accounts.iter().map(|account| account.id).collect();
        seeded_ids.sort_unstable();

        connection
            .execute("UPDATE account SET balance = 0.0", ())
            .unwrap();

        let (_, reseeded) = seed_demo_data(&connection).unwrap();

        let mut reseeded_ids: Vec<i64> = reseeded.iter().map(|account| account.id).collect();
        reseeded_ids.sort_unstable();
        assert_eq!(reseeded_ids, seeded_ids);

        let wallet_balance: f64 = connection
            .query_row(
                "SELECT balance FROM account WHERE kind = 'cash' AND name = '錢包現金'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(wallet_balance, 1_730.0);
    }

    #[test]
    fn demo_user_can_log_in_with_the_demo_password() {
        let connection = get_test_connection();

        seed_demo_data(&connection).unwrap();

        let user = get_user_by_email(
            &EmailAddress::from_str(DEMO_EMAIL).unwrap(),
            &connection,
        )
        .unwrap();
        assert!(user.password_hash.verify(DEMO_PASSWORD).unwrap());
    }
}
