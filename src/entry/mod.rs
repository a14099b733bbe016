//! Ledger entries: the income and expenses a user records for a month.

mod endpoints;
mod service;
mod sqlite;
mod store;
mod validation;

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::UserId;

pub use endpoints::{
    create_entry_endpoint, delete_entry_endpoint, get_entry_endpoint, search_entries_endpoint,
    update_entry_endpoint, update_entry_status_endpoint,
};
pub use service::LedgerService;
pub use sqlite::{SQLiteEntryStore, create_entry_table};
pub use store::EntryStore;
pub(crate) use store::checked_total;
pub use validation::EntryViolation;

/// Database identifier for a ledger entry.
pub type EntryId = i64;

/// Whether an entry adds to or takes from the user's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl EntryType {
    /// The name used for the type in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "INCOME",
            EntryType::Expense => "EXPENSE",
        }
    }

    /// Parse the name produced by [EntryType::as_str].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "INCOME" => Some(EntryType::Income),
            "EXPENSE" => Some(EntryType::Expense),
            _ => None,
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entry is in its lifecycle.
///
/// Entries always start as [EntryStatus::Pending] when they are saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Recorded but not yet paid or received.
    Pending,
    /// Paid or received.
    Settled,
    /// Will not be paid or received.
    Canceled,
}

impl EntryStatus {
    /// The name used for the status in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "PENDING",
            EntryStatus::Settled => "SETTLED",
            EntryStatus::Canceled => "CANCELED",
        }
    }

    /// Parse the name produced by [EntryStatus::as_str].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PENDING" => Some(EntryStatus::Pending),
            "SETTLED" => Some(EntryStatus::Settled),
            "CANCELED" => Some(EntryStatus::Canceled),
            _ => None,
        }
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense record.
///
/// Every field is optional: the same record is used for entries that have
/// yet to be validated and saved, for stored entries, and as the example for
/// [LedgerService::search], where each `Some` field is a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Assigned by the store when the entry is first saved.
    pub id: Option<EntryId>,
    /// What the entry is for.
    pub description: Option<String>,
    /// The month the entry belongs to, 1 to 12.
    pub month: Option<i32>,
    /// The four digit year the entry belongs to.
    pub year: Option<i32>,
    /// The amount of money, always positive. [LedgerEntry::entry_type] gives the direction.
    pub value: Option<Decimal>,
    /// Income or expense.
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    /// Where the entry is in its lifecycle.
    pub status: Option<EntryStatus>,
    /// The user that owns the entry.
    pub user_id: Option<UserId>,
    /// The date the entry was first saved.
    pub created_on: Option<Date>,
}
