//! The rules a ledger entry must satisfy before it is saved or updated.

use rust_decimal::Decimal;

use crate::{Error, entry::LedgerEntry};

/// The first rule a ledger entry broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EntryViolation {
    /// The description is missing or blank.
    #[error("invalid description")]
    Description,
    /// The month is missing or outside 1 to 12.
    #[error("invalid month")]
    Month,
    /// The year is missing or does not have exactly four digits.
    #[error("invalid 4-digit year")]
    Year,
    /// The entry has no owning user.
    #[error("missing user")]
    User,
    /// The value is missing, zero or negative.
    #[error("invalid value")]
    Value,
    /// The entry is neither income nor expense.
    #[error("missing type")]
    EntryType,
}

type Rule = (fn(&LedgerEntry) -> bool, EntryViolation);

/// Checked in order, the first failing rule is reported.
const RULES: [Rule; 6] = [
    (has_description, EntryViolation::Description),
    (has_valid_month, EntryViolation::Month),
    (has_four_digit_year, EntryViolation::Year),
    (has_user, EntryViolation::User),
    (has_positive_value, EntryViolation::Value),
    (has_type, EntryViolation::EntryType),
];

/// Check `entry` against the entry rules.
///
/// # Errors
///
/// Returns an [Error::InvalidEntry] for the first rule that `entry` breaks.
/// The rules are checked in the order description, month, year, user,
/// value, type.
pub fn validate(entry: &LedgerEntry) -> Result<(), Error> {
    for (is_satisfied, violation) in RULES {
        if !is_satisfied(entry) {
            return Err(Error::InvalidEntry(violation));
        }
    }

    Ok(())
}

fn has_description(entry: &LedgerEntry) -> bool {
    entry
        .description
        .as_deref()
        .is_some_and(|description| !description.trim().is_empty())
}

fn has_valid_month(entry: &LedgerEntry) -> bool {
    entry.month.is_some_and(|month| (1..=12).contains(&month))
}

fn has_four_digit_year(entry: &LedgerEntry) -> bool {
    entry.year.is_some_and(|year| (1000..=9999).contains(&year))
}

fn has_user(entry: &LedgerEntry) -> bool {
    entry.user_id.is_some()
}

fn has_positive_value(entry: &LedgerEntry) -> bool {
    entry.value.is_some_and(|value| value > Decimal::ZERO)
}

fn has_type(entry: &LedgerEntry) -> bool {
    entry.entry_type.is_some()
}
