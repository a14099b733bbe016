//! Defines the ledger entry store trait.

use rust_decimal::Decimal;

use crate::{
    Error, UserId,
    entry::{EntryId, EntryType, LedgerEntry},
};

/// Handles the persistence of [LedgerEntry] objects.
pub trait EntryStore {
    /// Insert `entry` and return the stored copy with its new ID.
    ///
    /// Any ID already set on `entry` is ignored.
    fn create(&mut self, entry: &LedgerEntry) -> Result<LedgerEntry, Error>;

    /// Replace every field of the stored entry with the same ID as `entry`.
    ///
    /// Implementers should return [Error::UnsavedEntry] if `entry` has no ID
    /// and [Error::UpdateMissingEntry] if no stored entry has the ID.
    fn update(&mut self, entry: &LedgerEntry) -> Result<LedgerEntry, Error>;

    /// Delete the entry with `id`.
    ///
    /// Implementers should return [Error::DeleteMissingEntry] if no stored entry has the ID.
    fn delete(&mut self, id: EntryId) -> Result<(), Error>;

    /// Retrieve the entry with `id`, or `None` if there is no such entry.
    fn get(&self, id: EntryId) -> Result<Option<LedgerEntry>, Error>;

    /// Retrieve the entries that match every `Some` field of `example`.
    ///
    /// The description matches case-insensitively anywhere in the stored
    /// description, all other fields must be equal. Entries are returned in
    /// the order they were created.
    fn find_all_by_example(&self, example: &LedgerEntry) -> Result<Vec<LedgerEntry>, Error>;

    /// The total value of the entries owned by `user_id` with `entry_type`.
    ///
    /// Returns zero when the user has no such entries. Implementers should
    /// return [Error::BalanceOverflow] if the total does not fit in a [Decimal].
    fn sum_by_type_and_user(&self, user_id: UserId, entry_type: EntryType)
    -> Result<Decimal, Error>;
}

/// Add up `values`, failing instead of overflowing.
pub(crate) fn checked_total(
    values: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, Error> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
        .ok_or(Error::BalanceOverflow)
}
