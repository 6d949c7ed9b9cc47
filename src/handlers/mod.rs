pub mod account;
pub mod color;
pub mod fallback;
pub mod health;
pub mod username;

use crate::core::error::AccountError;
use crate::models::user::User;
use crate::stores::user_store::UserTx;

/// Look up the caller's identity or fail with the "Not registered" sentinel
pub(crate) fn registered_user(tx: &UserTx<'_>, ip: &str) -> Result<User, AccountError> {
    tx.find_by_ip(ip)?.ok_or(AccountError::NotRegistered)
}
