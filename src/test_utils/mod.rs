#![allow(missing_docs)]

//! In-memory stores for testing the services without a database.
//!
//! Clones share their data and call counts, so a test can keep a handle to a
//! store after moving a clone into a service.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use crate::{
    Error, UserId,
    entry::{EntryId, EntryStore, EntryType, LedgerEntry, checked_total},
    user::{NewUserRecord, User, UserStore},
};

#[derive(Debug, Default)]
struct CallCounts {
    create: usize,
    update: usize,
    delete: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeEntryStore {
    entries: Arc<Mutex<Vec<LedgerEntry>>>,
    calls: Arc<Mutex<CallCounts>>,
}

impl FakeEntryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.calls.lock().unwrap().create
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.calls.lock().unwrap().update
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.calls.lock().unwrap().delete
    }

    pub(crate) fn reset_calls(&self) {
        *self.calls.lock().unwrap() = CallCounts::default();
    }
}

fn matches_example(entry: &LedgerEntry, example: &LedgerEntry) -> bool {
    fn field_matches<T: PartialEq>(field: &Option<T>, wanted: &Option<T>) -> bool {
        wanted.is_none() || field == wanted
    }

    let description_matches = match (&entry.description, &example.description) {
        (_, None) => true,
        (Some(description), Some(wanted)) => description
            .to_lowercase()
            .contains(&wanted.to_lowercase()),
        (None, Some(_)) => false,
    };

    description_matches
        && field_matches(&entry.id, &example.id)
        && field_matches(&entry.month, &example.month)
        && field_matches(&entry.year, &example.year)
        && field_matches(&entry.value, &example.value)
        && field_matches(&entry.entry_type, &example.entry_type)
        && field_matches(&entry.status, &example.status)
        && field_matches(&entry.user_id, &example.user_id)
        && field_matches(&entry.created_on, &example.created_on)
}

impl EntryStore for FakeEntryStore {
    fn create(&mut self, entry: &LedgerEntry) -> Result<LedgerEntry, Error> {
        self.calls.lock().unwrap().create += 1;

        let mut entries = self.entries.lock().unwrap();
        let next_id = entries.last().and_then(|entry| entry.id).unwrap_or(0) + 1;
        let entry = LedgerEntry {
            id: Some(next_id),
            ..entry.clone()
        };
        entries.push(entry.clone());

        Ok(entry)
    }

    fn update(&mut self, entry: &LedgerEntry) -> Result<LedgerEntry, Error> {
        self.calls.lock().unwrap().update += 1;

        let id = entry.id.ok_or(Error::UnsavedEntry)?;
        let mut entries = self.entries.lock().unwrap();
        let stored = entries
            .iter_mut()
            .find(|stored| stored.id == Some(id))
            .ok_or(Error::UpdateMissingEntry)?;
        *stored = entry.clone();

        Ok(entry.clone())
    }

    fn delete(&mut self, id: EntryId) -> Result<(), Error> {
        self.calls.lock().unwrap().delete += 1;

        let mut entries = self.entries.lock().unwrap();
        let count_before = entries.len();
        entries.retain(|entry| entry.id != Some(id));

        if entries.len() == count_before {
            return Err(Error::DeleteMissingEntry);
        }

        Ok(())
    }

    fn get(&self, id: EntryId) -> Result<Option<LedgerEntry>, Error> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.id == Some(id))
            .cloned())
    }

    fn find_all_by_example(&self, example: &LedgerEntry) -> Result<Vec<LedgerEntry>, Error> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| matches_example(entry, example))
            .cloned()
            .collect())
    }

    fn sum_by_type_and_user(
        &self,
        user_id: UserId,
        entry_type: EntryType,
    ) -> Result<Decimal, Error> {
        let values: Vec<Decimal> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| {
                entry.user_id == Some(user_id) && entry.entry_type == Some(entry_type)
            })
            .filter_map(|entry| entry.value)
            .collect();

        checked_total(values)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeUserStore {
    users: Arc<Mutex<Vec<User>>>,
    create_calls: Arc<Mutex<usize>>,
}

impl FakeUserStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    pub(crate) fn reset_calls(&self) {
        *self.create_calls.lock().unwrap() = 0;
    }
}

impl UserStore for FakeUserStore {
    fn create(&mut self, user: NewUserRecord) -> Result<User, Error> {
        *self.create_calls.lock().unwrap() += 1;

        let mut users = self.users.lock().unwrap();

        if users.iter().any(|existing| existing.email == user.email) {
            return Err(Error::DuplicateEmail);
        }

        let next_id = match users.last() {
            Some(last) => UserId::new(last.id.as_i64() + 1),
            None => UserId::new(1),
        };
        let user = user.finalise(next_id);
        users.push(user.clone());

        Ok(user)
    }

    fn get(&self, id: UserId) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    fn get_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    fn exists_by_email(&self, email: &str) -> Result<bool, Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|user| user.email == email))
    }
}
