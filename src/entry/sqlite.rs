//! Implements a SQLite backed ledger entry store.
use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{
    Connection, OptionalExtension, Row, params_from_iter,
    types::{Type, Value},
};
use rust_decimal::Decimal;

use crate::{
    Error, UserId,
    entry::{EntryId, EntryStatus, EntryStore, EntryType, LedgerEntry, checked_total},
};

const ENTRY_COLUMNS: &str =
    "id, description, month, year, value, entry_type, status, user_id, created_on";

/// Stores ledger entries in a SQLite database.
///
/// The entry table references the user table, so both must be set up in the
/// database, e.g. with [initialize](crate::initialize_db).
#[derive(Debug, Clone)]
pub struct SQLiteEntryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteEntryStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl EntryStore for SQLiteEntryStore {
    /// Insert a ledger entry into the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, entry: &LedgerEntry) -> Result<LedgerEntry, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let entry = connection
            .prepare(&format!(
                "INSERT INTO ledger_entry
                    (description, month, year, value, entry_type, status, user_id, created_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {ENTRY_COLUMNS}"
            ))?
            .query_row(
                (
                    &entry.description,
                    entry.month,
                    entry.year,
                    entry.value.map(value_to_text),
                    entry.entry_type.map(|entry_type| entry_type.as_str()),
                    entry.status.map(|status| status.as_str()),
                    entry.user_id.map(|user_id| user_id.as_i64()),
                    entry.created_on,
                ),
                map_row,
            )?;

        Ok(entry)
    }

    /// Overwrite the stored entry that has the same ID as `entry`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UnsavedEntry] if `entry` has no ID,
    /// - [Error::UpdateMissingEntry] if no entry has the ID,
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, entry: &LedgerEntry) -> Result<LedgerEntry, Error> {
        let id = entry.id.ok_or(Error::UnsavedEntry)?;

        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        connection
            .prepare(&format!(
                "UPDATE ledger_entry
                 SET description = ?1, month = ?2, year = ?3, value = ?4, entry_type = ?5,
                     status = ?6, user_id = ?7, created_on = ?8
                 WHERE id = ?9
                 RETURNING {ENTRY_COLUMNS}"
            ))?
            .query_row(
                (
                    &entry.description,
                    entry.month,
                    entry.year,
                    entry.value.map(value_to_text),
                    entry.entry_type.map(|entry_type| entry_type.as_str()),
                    entry.status.map(|status| status.as_str()),
                    entry.user_id.map(|user_id| user_id.as_i64()),
                    entry.created_on,
                    id,
                ),
                map_row,
            )
            .optional()?
            .ok_or(Error::UpdateMissingEntry)
    }

    /// Delete the entry with `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingEntry] if no entry has the ID,
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: EntryId) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .execute("DELETE FROM ledger_entry WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingEntry);
        }

        Ok(())
    }

    /// Retrieve a ledger entry in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is an SQL error.
    fn get(&self, id: EntryId) -> Result<Option<LedgerEntry>, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM ledger_entry WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], map_row)
            .optional()
            .map_err(|error| error.into())
    }

    /// Query for entries matching the `Some` fields of `example`.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is an SQL error.
    fn find_all_by_example(&self, example: &LedgerEntry) -> Result<Vec<LedgerEntry>, Error> {
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        if let Some(id) = example.id {
            push_equals(&mut where_clause_parts, &mut query_parameters, "id", Value::Integer(id));
        }

        if let Some(description) = &example.description {
            query_parameters.push(Value::Text(description.clone()));
            where_clause_parts.push(format!(
                "instr(lower(description), lower(?{})) > 0",
                query_parameters.len()
            ));
        }

        if let Some(month) = example.month {
            push_equals(
                &mut where_clause_parts,
                &mut query_parameters,
                "month",
                Value::Integer(month.into()),
            );
        }

        if let Some(year) = example.year {
            push_equals(
                &mut where_clause_parts,
                &mut query_parameters,
                "year",
                Value::Integer(year.into()),
            );
        }

        if let Some(value) = example.value {
            push_equals(
                &mut where_clause_parts,
                &mut query_parameters,
                "value",
                Value::Text(value_to_text(value)),
            );
        }

        if let Some(entry_type) = example.entry_type {
            push_equals(
                &mut where_clause_parts,
                &mut query_parameters,
                "entry_type",
                Value::Text(entry_type.as_str().to_owned()),
            );
        }

        if let Some(status) = example.status {
            push_equals(
                &mut where_clause_parts,
                &mut query_parameters,
                "status",
                Value::Text(status.as_str().to_owned()),
            );
        }

        if let Some(user_id) = example.user_id {
            push_equals(
                &mut where_clause_parts,
                &mut query_parameters,
                "user_id",
                Value::Integer(user_id.as_i64()),
            );
        }

        if let Some(created_on) = example.created_on {
            push_equals(
                &mut where_clause_parts,
                &mut query_parameters,
                "created_on",
                Value::Text(created_on.to_string()),
            );
        }

        let mut query_string = format!("SELECT {ENTRY_COLUMNS} FROM ledger_entry");

        if !where_clause_parts.is_empty() {
            query_string.push_str(" WHERE ");
            query_string.push_str(&where_clause_parts.join(" AND "));
        }

        query_string.push_str(" ORDER BY id ASC");

        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), map_row)?
            .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
            .collect()
    }

    /// Add up the values of a user's entries of one type.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::BalanceOverflow] if the total is too large for a [Decimal],
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn sum_by_type_and_user(
        &self,
        user_id: UserId,
        entry_type: EntryType,
    ) -> Result<Decimal, Error> {
        // SQLite would sum the text values as floats, so the sum is done here
        // after the lock is released.
        let values = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(
                "SELECT value FROM ledger_entry
                 WHERE user_id = ?1 AND entry_type = ?2 AND value IS NOT NULL",
            )?
            .query_map((user_id.as_i64(), entry_type.as_str()), |row| {
                text_to_value(row, 0)
            })?
            .collect::<Result<Vec<Decimal>, rusqlite::Error>>()?;

        checked_total(values)
    }
}

/// Create the ledger entry table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT,
            month INTEGER,
            year INTEGER,
            value TEXT,
            entry_type TEXT,
            status TEXT,
            user_id INTEGER,
            created_on TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_entry_user_type ON ledger_entry(user_id, entry_type);",
    )?;

    Ok(())
}

fn push_equals(
    where_clause_parts: &mut Vec<String>,
    query_parameters: &mut Vec<Value>,
    column: &str,
    value: Value,
) {
    query_parameters.push(value);
    where_clause_parts.push(format!("{column} = ?{}", query_parameters.len()));
}

/// Values are normalised so that equal amounts, e.g. "10" and "10.00", are stored the same.
fn value_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

fn text_to_value(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw_value: String = row.get(index)?;

    Decimal::from_str(&raw_value)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

fn map_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let value = match row.get::<_, Option<String>>(4)? {
        Some(_) => Some(text_to_value(row, 4)?),
        None => None,
    };

    let entry_type = match row.get::<_, Option<String>>(5)? {
        Some(name) => Some(EntryType::from_name(&name).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("invalid entry type \"{name}\"").into(),
            )
        })?),
        None => None,
    };

    let status = match row.get::<_, Option<String>>(6)? {
        Some(name) => Some(EntryStatus::from_name(&name).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                Type::Text,
                format!("invalid entry status \"{name}\"").into(),
            )
        })?),
        None => None,
    };

    Ok(LedgerEntry {
        id: row.get(0)?,
        description: row.get(1)?,
        month: row.get(2)?,
        year: row.get(3)?,
        value,
        entry_type,
        status,
        user_id: row.get::<_, Option<i64>>(7)?.map(UserId::new),
        created_on: row.get(8)?,
    })
}

#[cfg(test)]
mod sqlite_entry_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error, PasswordHash, SQLiteUserStore, UserId, UserStore,
        db::initialize,
        entry::{EntryStatus, EntryStore, EntryType, LedgerEntry},
        user::NewUserRecord,
    };

    use super::SQLiteEntryStore;

    fn get_store_and_user() -> (SQLiteEntryStore, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let user = SQLiteUserStore::new(conn.clone())
            .create(NewUserRecord {
                name: "priscila".to_owned(),
                email: "priscila@priscila.com".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            })
            .unwrap();

        (SQLiteEntryStore::new(conn), user.id)
    }

    fn test_entry(user_id: UserId) -> LedgerEntry {
        LedgerEntry {
            description: Some("Some entry".to_owned()),
            month: Some(1),
            year: Some(2019),
            value: Some(dec!(10)),
            entry_type: Some(EntryType::Income),
            status: Some(EntryStatus::Pending),
            user_id: Some(user_id),
            created_on: Some(date!(2019 - 01 - 05)),
            ..Default::default()
        }
    }

    #[test]
    fn create_assigns_id() {
        let (mut store, user_id) = get_store_and_user();
        let entry = test_entry(user_id);

        let created = store.create(&entry).unwrap();

        assert!(created.id.is_some());
        assert_eq!(
            created,
            LedgerEntry {
                id: created.id,
                ..entry
            }
        );
    }

    #[test]
    fn create_ignores_given_id() {
        let (mut store, user_id) = get_store_and_user();
        let entry = LedgerEntry {
            id: Some(999),
            ..test_entry(user_id)
        };

        let created = store.create(&entry).unwrap();

        assert_eq!(created.id, Some(1));
    }

    #[test]
    fn create_keeps_decimal_precision() {
        let (mut store, user_id) = get_store_and_user();
        let entry = LedgerEntry {
            value: Some(dec!(0.10) + dec!(0.20)),
            ..test_entry(user_id)
        };

        let created = store.create(&entry).unwrap();

        assert_eq!(created.value, Some(dec!(0.3)));
    }

    #[test]
    fn get_returns_created_entry() {
        let (mut store, user_id) = get_store_and_user();
        let created = store.create(&test_entry(user_id)).unwrap();

        let got = store.get(created.id.unwrap()).unwrap();

        assert_eq!(got, Some(created));
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let (store, _) = get_store_and_user();

        assert_eq!(store.get(42), Ok(None));
    }

    #[test]
    fn update_replaces_all_fields() {
        let (mut store, user_id) = get_store_and_user();
        let created = store.create(&test_entry(user_id)).unwrap();
        let replacement = LedgerEntry {
            id: created.id,
            description: Some("Rent".to_owned()),
            month: Some(2),
            year: Some(2020),
            value: Some(dec!(1200.50)),
            entry_type: Some(EntryType::Expense),
            status: Some(EntryStatus::Settled),
            user_id: Some(user_id),
            created_on: created.created_on,
        };

        let updated = store.update(&replacement).unwrap();

        assert_eq!(updated, replacement);
        assert_eq!(store.get(created.id.unwrap()), Ok(Some(replacement)));
    }

    #[test]
    fn update_fails_without_id() {
        let (mut store, user_id) = get_store_and_user();

        assert_eq!(
            store.update(&test_entry(user_id)),
            Err(Error::UnsavedEntry)
        );
    }

    #[test]
    fn update_fails_for_unknown_id() {
        let (mut store, user_id) = get_store_and_user();
        let entry = LedgerEntry {
            id: Some(42),
            ..test_entry(user_id)
        };

        assert_eq!(store.update(&entry), Err(Error::UpdateMissingEntry));
    }

    #[test]
    fn delete_removes_entry() {
        let (mut store, user_id) = get_store_and_user();
        let created = store.create(&test_entry(user_id)).unwrap();
        let id = created.id.unwrap();

        store.delete(id).unwrap();

        assert_eq!(store.get(id), Ok(None));
    }

    #[test]
    fn delete_fails_for_unknown_id() {
        let (mut store, _) = get_store_and_user();

        assert_eq!(store.delete(42), Err(Error::DeleteMissingEntry));
    }

    #[test]
    fn find_all_by_example_matches_set_fields() {
        let (mut store, user_id) = get_store_and_user();
        let salary = store
            .create(&LedgerEntry {
                description: Some("Monthly SALARY".to_owned()),
                ..test_entry(user_id)
            })
            .unwrap();
        store
            .create(&LedgerEntry {
                description: Some("Salary".to_owned()),
                month: Some(2),
                ..test_entry(user_id)
            })
            .unwrap();
        store
            .create(&LedgerEntry {
                description: Some("Groceries".to_owned()),
                entry_type: Some(EntryType::Expense),
                ..test_entry(user_id)
            })
            .unwrap();

        let found = store
            .find_all_by_example(&LedgerEntry {
                description: Some("salary".to_owned()),
                month: Some(1),
                user_id: Some(user_id),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(found, vec![salary]);
    }

    #[test]
    fn find_all_by_example_with_empty_example_returns_everything_in_order() {
        let (mut store, user_id) = get_store_and_user();
        let first = store.create(&test_entry(user_id)).unwrap();
        let second = store.create(&test_entry(user_id)).unwrap();

        let found = store.find_all_by_example(&LedgerEntry::default()).unwrap();

        assert_eq!(found, vec![first, second]);
    }

    #[test]
    fn find_all_by_example_matches_equal_values() {
        let (mut store, user_id) = get_store_and_user();
        let created = store
            .create(&LedgerEntry {
                value: Some(dec!(10.00)),
                ..test_entry(user_id)
            })
            .unwrap();
        store
            .create(&LedgerEntry {
                value: Some(dec!(11)),
                ..test_entry(user_id)
            })
            .unwrap();

        let found = store
            .find_all_by_example(&LedgerEntry {
                value: Some(dec!(10)),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(found, vec![created]);
    }

    #[test]
    fn sum_by_type_and_user_adds_matching_entries() {
        let (mut store, user_id) = get_store_and_user();
        for (value, entry_type) in [
            (dec!(250.25), EntryType::Income),
            (dec!(249.75), EntryType::Income),
            (dec!(300), EntryType::Expense),
        ] {
            store
                .create(&LedgerEntry {
                    value: Some(value),
                    entry_type: Some(entry_type),
                    ..test_entry(user_id)
                })
                .unwrap();
        }

        assert_eq!(
            store.sum_by_type_and_user(user_id, EntryType::Income),
            Ok(dec!(500))
        );
        assert_eq!(
            store.sum_by_type_and_user(user_id, EntryType::Expense),
            Ok(dec!(300))
        );
    }

    #[test]
    fn sum_by_type_and_user_adds_values_up_to_largest_decimal() {
        let (mut store, user_id) = get_store_and_user();
        for value in [Decimal::MAX - dec!(1), dec!(1)] {
            store
                .create(&LedgerEntry {
                    value: Some(value),
                    ..test_entry(user_id)
                })
                .unwrap();
        }

        assert_eq!(
            store.sum_by_type_and_user(user_id, EntryType::Income),
            Ok(Decimal::MAX)
        );
    }

    #[test]
    fn sum_by_type_and_user_fails_on_overflow_and_store_stays_usable() {
        let (mut store, user_id) = get_store_and_user();
        let half_plus_one = Decimal::MAX / dec!(2) + dec!(1);
        let mut ids = vec![];
        for _ in 0..2 {
            let entry = store
                .create(&LedgerEntry {
                    value: Some(half_plus_one),
                    ..test_entry(user_id)
                })
                .unwrap();
            ids.push(entry.id.unwrap());
        }

        assert_eq!(
            store.sum_by_type_and_user(user_id, EntryType::Income),
            Err(Error::BalanceOverflow)
        );

        let entry = store.get(ids[0]).expect("store should still be usable");
        assert_eq!(entry.and_then(|entry| entry.value), Some(half_plus_one));
        assert_eq!(
            store.sum_by_type_and_user(user_id, EntryType::Expense),
            Ok(Decimal::ZERO)
        );
    }

    #[test]
    fn create_and_update_keep_largest_decimal_values() {
        let (mut store, user_id) = get_store_and_user();
        let smallest_fraction = Decimal::from_i128_with_scale(1, 28);

        let created = store
            .create(&LedgerEntry {
                value: Some(Decimal::MAX),
                ..test_entry(user_id)
            })
            .unwrap();
        assert_eq!(created.value, Some(Decimal::MAX));
        assert_eq!(
            store.get(created.id.unwrap()).unwrap().and_then(|entry| entry.value),
            Some(Decimal::MAX)
        );

        let updated = store
            .update(&LedgerEntry {
                value: Some(smallest_fraction),
                ..created.clone()
            })
            .unwrap();
        assert_eq!(updated.value, Some(smallest_fraction));

        let updated = store
            .update(&LedgerEntry {
                value: Some(Decimal::MAX - dec!(1)),
                ..created
            })
            .unwrap();
        assert_eq!(updated.value, Some(Decimal::MAX - dec!(1)));
    }

    #[test]
    fn sum_by_type_and_user_is_zero_without_entries() {
        let (store, user_id) = get_store_and_user();

        assert_eq!(
            store.sum_by_type_and_user(user_id, EntryType::Income),
            Ok(Decimal::ZERO)
        );
    }
}
