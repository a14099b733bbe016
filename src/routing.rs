//! Application router configuration.

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::{
    AppState, EntryStore, Error, UserStore,
    endpoints,
    entry::{
        create_entry_endpoint, delete_entry_endpoint, get_entry_endpoint,
        search_entries_endpoint, update_entry_endpoint, update_entry_status_endpoint,
    },
    user::{authenticate_endpoint, get_balance_endpoint, register_user_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router<E, U>(state: AppState<E, U>) -> Router
where
    E: EntryStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(endpoints::USERS, post(register_user_endpoint::<E, U>))
        .route(endpoints::AUTHENTICATE, post(authenticate_endpoint::<E, U>))
        .route(endpoints::USER_BALANCE, get(get_balance_endpoint::<E, U>))
        .route(
            endpoints::ENTRIES,
            post(create_entry_endpoint::<E, U>).get(search_entries_endpoint::<E, U>),
        )
        .route(
            endpoints::ENTRY,
            get(get_entry_endpoint::<E, U>)
                .put(update_entry_endpoint::<E, U>)
                .delete(delete_entry_endpoint::<E, U>),
        )
        .route(
            endpoints::ENTRY_STATUS,
            put(update_entry_status_endpoint::<E, U>),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
