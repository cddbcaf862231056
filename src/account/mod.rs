//! Financial accounts: cash, bank, and credit-card ledgers with kind-keyed
//! upserts.
mod core;
mod endpoints;
mod upsert;

pub use core::{
    Account, AccountDetails, AccountId, BankDetails, CreditCardDetails, create_account_table,
    get_accounts_by_user,
};
pub use endpoints::{AccountState, get_accounts, post_account};
pub use upsert::{UpsertAccountData, upsert_account};
