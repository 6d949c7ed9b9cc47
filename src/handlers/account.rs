use crate::core::error::AccountError;
use crate::core::state::AppState;
use crate::models::listing::Listing;
use crate::models::user::User;
use crate::utils::client_ip::ClientIp;
use crate::utils::time::current_timestamp_millis;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Login handler
///
/// GET /login
///
/// # Flow
/// 1. No identity for this address: create one
/// 2. Identity exists but never finished a name: delete it and start over
/// 3. Finished identity: only refresh `last_seen`
///
/// Always answers with the public listing.
#[instrument(skip(state))]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
) -> Result<Json<Listing>, AccountError> {
    let listing = state
        .store
        .transaction(|tx| -> Result<Listing, AccountError> {
            let now = current_timestamp_millis();

            match tx.find_by_ip(&ip)? {
                None => {
                    let user = tx.insert(&User::anonymous(ip.as_str(), now))?;
                    info!(user_id = user.id, "Account created");
                }
                Some(user) if !user.is_finished() => {
                    tx.delete(user.id)?;
                    let fresh = tx.insert(&User::anonymous(ip.as_str(), now))?;
                    info!(
                        old_user_id = user.id,
                        user_id = fresh.id,
                        "Unfinished account reset"
                    );
                }
                Some(mut user) => {
                    user.touch(now);
                    tx.save(&user)?;
                    debug!(user_id = user.id, "Returning user");
                }
            }

            Ok(Listing::from_users(&tx.finished_users()?))
        })?;

    Ok(Json(listing))
}

/// Rebind an existing identity to the caller's address
///
/// GET /login_as/{id}
///
/// Works for unfinished identities too. The previous address of that
/// identity stops resolving to it.
#[instrument(skip(state))]
pub async fn login_as_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(number): Path<String>,
) -> Result<String, AccountError> {
    let id: i64 = number
        .trim()
        .parse()
        .map_err(|_| AccountError::MalformedInput(number.clone()))?;

    let username = state.store.transaction(|tx| -> Result<String, AccountError> {
        let mut user = tx.find_by_id(id)?.ok_or(AccountError::NotRegistered)?;

        let previous_ip = std::mem::replace(&mut user.ip_address, ip.clone());
        user.touch(current_timestamp_millis());
        tx.save(&user)?;

        info!(user_id = user.id, previous_ip = %previous_ip, "Identity rebound to new address");
        Ok(user.username)
    })?;

    Ok(format!("Logged in as: {}", username))
}

/// Public listing of finished users
///
/// GET /get_data
///
/// Refreshes `last_seen` when the caller is known. Unknown callers still get the listing.
pub async fn get_data_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
) -> Result<Json<Listing>, AccountError> {
    let listing = state
        .store
        .transaction(|tx| -> Result<Listing, AccountError> {
            if let Some(mut user) = tx.find_by_ip(&ip)? {
                user.touch(current_timestamp_millis());
                tx.save(&user)?;
            }

            Ok(Listing::from_users(&tx.finished_users()?))
        })?;

    Ok(Json(listing))
}
