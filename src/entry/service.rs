//! The ledger service validates and mediates every change to ledger entries.

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    Error, UserId,
    entry::{EntryId, EntryStatus, EntryStore, EntryType, LedgerEntry, validation},
};

/// Mediates all changes and queries against an [EntryStore].
#[derive(Debug, Clone)]
pub struct LedgerService<E>
where
    E: EntryStore,
{
    store: E,
}

impl<E> LedgerService<E>
where
    E: EntryStore,
{
    /// Create a ledger service backed by `store`.
    pub fn new(store: E) -> Self {
        Self { store }
    }

    /// Validate and save a new entry.
    ///
    /// The saved entry is always [EntryStatus::Pending], whatever status the
    /// caller set, and is dated today (UTC).
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidEntry] if `entry` breaks a rule, in which
    /// case nothing is written. Store errors are passed through.
    pub fn save(&mut self, mut entry: LedgerEntry) -> Result<LedgerEntry, Error> {
        Self::validate(&entry)?;

        entry.status = Some(EntryStatus::Pending);
        entry.created_on = Some(OffsetDateTime::now_utc().date());

        let saved = self.store.create(&entry)?;
        tracing::debug!("Saved ledger entry {:?}", saved.id);

        Ok(saved)
    }

    /// Validate and store the full replacement of a saved entry.
    ///
    /// # Errors
    ///
    /// Returns an [Error::UnsavedEntry] if `entry` has no ID and an
    /// [Error::InvalidEntry] if it breaks a rule. In both cases the store is
    /// not touched.
    pub fn update(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, Error> {
        if entry.id.is_none() {
            return Err(Error::UnsavedEntry);
        }

        Self::validate(&entry)?;

        self.store.update(&entry)
    }

    /// Delete a saved entry.
    ///
    /// # Errors
    ///
    /// Returns an [Error::UnsavedEntry] if `entry` has no ID, without touching the store.
    pub fn delete(&mut self, entry: &LedgerEntry) -> Result<(), Error> {
        let id = entry.id.ok_or(Error::UnsavedEntry)?;

        self.store.delete(id)?;
        tracing::debug!("Deleted ledger entry {id}");

        Ok(())
    }

    /// Find the entries that match every `Some` field of `example`.
    pub fn search(&self, example: &LedgerEntry) -> Result<Vec<LedgerEntry>, Error> {
        self.store.find_all_by_example(example)
    }

    /// Move `entry` to `status` and store it.
    ///
    /// `entry` keeps the new status even if storing it fails.
    ///
    /// # Errors
    ///
    /// Fails in the same way as [LedgerService::update].
    pub fn set_status(
        &mut self,
        entry: &mut LedgerEntry,
        status: EntryStatus,
    ) -> Result<LedgerEntry, Error> {
        entry.status = Some(status);

        self.update(entry.clone())
    }

    /// Find the entry with `id`.
    pub fn find_by_id(&self, id: EntryId) -> Result<Option<LedgerEntry>, Error> {
        self.store.get(id)
    }

    /// Check `entry` against the entry rules without touching the store.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidEntry] naming the first broken rule. Rules
    /// are checked in the order description, month, year, user, value, type.
    pub fn validate(entry: &LedgerEntry) -> Result<(), Error> {
        validation::validate(entry)
    }

    /// The user's total income minus their total expenses.
    ///
    /// # Errors
    ///
    /// Returns [Error::BalanceOverflow] if either total is too large for a [Decimal].
    pub fn balance_for_user(&self, user_id: UserId) -> Result<Decimal, Error> {
        let income = self
            .store
            .sum_by_type_and_user(user_id, EntryType::Income)?;
        let expenses = self
            .store
            .sum_by_type_and_user(user_id, EntryType::Expense)?;

        Ok(income - expenses)
    }
}
