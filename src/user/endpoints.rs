//! HTTP handlers for registering users, checking their credentials and
//! reporting their balance.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, EntryStore, Error,
    user::{NewUser, UserId, UserStore},
};

/// The email and password a client sends to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// The email the user registered with.
    pub email: String,
    /// The raw password.
    pub password: String,
}

/// The body of a balance response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The user the balance belongs to.
    pub user_id: UserId,
    /// Total income minus total expenses.
    pub balance: Decimal,
}

/// A route handler for registering a new user.
///
/// Responds with `201 Created` and the new user, without the password hash.
pub async fn register_user_endpoint<E, U>(
    State(mut state): State<AppState<E, U>>,
    Json(new_user): Json<NewUser>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let user = state.user_service.register(new_user)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// A route handler for checking a user's email and password.
///
/// Responds with the authenticated user, or `400 Bad Request` saying whether
/// the email or the password was wrong.
pub async fn authenticate_endpoint<E, U>(
    State(state): State<AppState<E, U>>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let user = state
        .user_service
        .authenticate(&credentials.email, &credentials.password)?;

    Ok(Json(user))
}

/// A route handler for getting a user's balance.
pub async fn get_balance_endpoint<E, U>(
    State(state): State<AppState<E, U>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, Error>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    let user = state
        .user_service
        .find_by_id(UserId::new(user_id))?
        .ok_or(Error::NotFound)?;

    let balance = state.ledger_service.balance_for_user(user.id)?;

    Ok(Json(BalanceResponse {
        user_id: user.id,
        balance,
    }))
}
