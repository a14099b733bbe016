//! HTTP handlers for creating, querying, changing and deleting ledger entries.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, LedgerService, UserId, UserService, UserStore,
    entry::{EntryId, EntryStatus, EntryStore, EntryType, LedgerEntry},
};

/// The fields a client sends to create or replace a ledger entry.
///
/// The ID and creation date are never taken from the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPayload {
    /// What the entry is for.
    pub description: Option<String>,
    /// The month, 1 to 12.
    pub month: Option<i32>,
    /// The four digit year.
    pub year: Option<i32>,
    /// The amount of money.
    pub value: Option<Decimal>,
    /// Income or expense.
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    /// Only used when replacing an entry. New entries always start as pending.
    pub status: Option<EntryStatus>,
    /// The user that owns the entry.
    pub user_id: Option<UserId>,
}

impl EntryPayload {
    fn into_entry(self, id: Option<EntryId>) -> LedgerEntry {
        LedgerEntry {
            id,
            description: self.description,
            month: self.month,
            year: self.year,
            value: self.value,
            entry_type: self.entry_type,
            status: self.status,
            user_id: self.user_id,
            created_on: None,
        }
    }
}

/// The query parameters for searching a user's entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySearchQuery {
    /// Case-insensitive text the description must contain.
    pub description: Option<String>,
    /// Only entries for this month.
    pub month: Option<i32>,
    /// Only entries for this year.
    pub year: Option<i32>,
    /// Only income or only expenses.
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    /// Only entries with this status.
    pub status: Option<EntryStatus>,
    /// The user whose entries are searched.
    pub user_id: i64,
}

/// The body of a request to change an entry's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// The new status.
    pub status: EntryStatus,
}

fn ensure_user_exists<U>(
    user_service: &UserService<U>,
    user_id: Option<UserId>,
) -> Result<(), Error>
where
    U: UserStore,
{
    match user_id {
        Some(user_id) => user_service
            .find_by_id(user_id)?
            .map(|_| ())
            .ok_or(Error::UnknownUser(user_id)),
        // Left to entry validation, which reports the missing user in rule order.
        None => Ok(()),
    }
}

fn find_entry<E>(
    ledger_service: &LedgerService<E>,
    entry_id: EntryId,
) -> Result<LedgerEntry, Error>
where
    E: EntryStore,
{
    ledger_service.find_by_id(entry_id)?.ok_or(Error::NotFound)
}

/// A route handler for creating a new ledger entry.
///
/// Responds with `201 Created` and the saved entry.
pub async fn create_entry_endpoint<E, U>(
    State(mut state): State<AppState<E, U>>,
    Json(payload): Json<EntryPayload>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    ensure_user_exists(&state.user_service, payload.user_id)?;

    let entry = state.ledger_service.save(payload.into_entry(None))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// A route handler for searching a user's ledger entries.
pub async fn search_entries_endpoint<E, U>(
    State(state): State<AppState<E, U>>,
    Query(query): Query<EntrySearchQuery>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let user_id = UserId::new(query.user_id);
    ensure_user_exists(&state.user_service, Some(user_id))?;

    let example = LedgerEntry {
        description: query.description,
        month: query.month,
        year: query.year,
        entry_type: query.entry_type,
        status: query.status,
        user_id: Some(user_id),
        ..Default::default()
    };

    let entries = state.ledger_service.search(&example)?;

    Ok(Json(entries))
}

/// A route handler for getting a single ledger entry.
pub async fn get_entry_endpoint<E, U>(
    State(state): State<AppState<E, U>>,
    Path(entry_id): Path<EntryId>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let entry = find_entry(&state.ledger_service, entry_id)?;

    Ok(Json(entry))
}

/// A route handler for replacing a ledger entry.
///
/// The entry keeps its creation date, and its status unless the payload sets one.
pub async fn update_entry_endpoint<E, U>(
    State(mut state): State<AppState<E, U>>,
    Path(entry_id): Path<EntryId>,
    Json(payload): Json<EntryPayload>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let existing = find_entry(&state.ledger_service, entry_id)?;
    ensure_user_exists(&state.user_service, payload.user_id)?;

    let mut entry = payload.into_entry(Some(entry_id));
    entry.status = entry.status.or(existing.status);
    entry.created_on = existing.created_on;

    let updated = state.ledger_service.update(entry)?;

    Ok(Json(updated))
}

/// A route handler for moving a ledger entry to a new status.
pub async fn update_entry_status_endpoint<E, U>(
    State(mut state): State<AppState<E, U>>,
    Path(entry_id): Path<EntryId>,
    Json(update): Json<StatusUpdate>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let mut entry = find_entry(&state.ledger_service, entry_id)?;

    let updated = state
        .ledger_service
        .set_status(&mut entry, update.status)?;

    Ok(Json(updated))
}

/// A route handler for deleting a ledger entry.
///
/// Responds with `204 No Content`.
pub async fn delete_entry_endpoint<E, U>(
    State(mut state): State<AppState<E, U>>,
    Path(entry_id): Path<EntryId>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let entry = find_entry(&state.ledger_service, entry_id)?;

    state.ledger_service.delete(&entry)?;

    Ok(StatusCode::NO_CONTENT)
}
