use crate::core::error::AccountError;
use crate::core::state::AppState;
use crate::handlers::registered_user;
use crate::models::user::User;
use crate::utils::client_ip::ClientIp;
use crate::utils::time::current_timestamp_millis;
use axum::extract::{Path, State};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolve a pending code point before the name changes.
///
/// A malformed buffer stays where it is and the request carries on.
fn flush_pending_unicode(user: &mut User) {
    match user.flush_unicode() {
        Ok(Some(ch)) => debug!(user_id = user.id, character = %ch, "Code point resolved"),
        Ok(None) => {}
        Err(e) => warn!(
            user_id = user.id,
            buffer = %user.unicode_string,
            error = %e,
            "Pending code point could not be resolved"
        ),
    }
}

/// Run `f` on the caller's identity and save it, all in one transaction
fn with_registered_user<T>(
    state: &AppState,
    ip: &str,
    f: impl FnOnce(&mut User) -> T,
) -> Result<T, AccountError> {
    state.store.transaction(|tx| -> Result<T, AccountError> {
        let mut user = registered_user(tx, ip)?;
        let value = f(&mut user);
        tx.save(&user)?;
        Ok(value)
    })
}

/// GET /unicode/start/{letter}
///
/// Flushes the previous code point, then starts a new one with `letter`.
pub async fn unicode_start_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(letter): Path<String>,
) -> Result<String, AccountError> {
    with_registered_user(&state, &ip, |user| {
        flush_pending_unicode(user);
        user.start_unicode(&letter);
        format!("Current username: {}", user.username_unfinished)
    })
}

/// GET /unicode/continue/{letter}
pub async fn unicode_continue_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(letter): Path<String>,
) -> Result<String, AccountError> {
    with_registered_user(&state, &ip, |user| {
        user.continue_unicode(&letter);
        format!("Current string: {}", user.unicode_string)
    })
}

/// GET /letter/{letter}
///
/// Answers with the unicode buffer, not the name.
pub async fn letter_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(letter): Path<String>,
) -> Result<String, AccountError> {
    with_registered_user(&state, &ip, |user| {
        flush_pending_unicode(user);
        user.push_letter(&letter);
        format!("Current string: {}", user.unicode_string)
    })
}

/// GET /finish_username
pub async fn finish_username_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
) -> Result<String, AccountError> {
    with_registered_user(&state, &ip, |user| {
        flush_pending_unicode(user);
        user.finish(current_timestamp_millis());
        info!(user_id = user.id, username = %user.username, "Username finished");
        format!("Account created: {}", user.username)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::*;

    async fn letter(state: &Arc<AppState>, ip: &str, l: &str) -> String {
        letter_handler(State(state.clone()), client(ip), Path(l.to_string()))
            .await
            .unwrap()
    }

    async fn start(state: &Arc<AppState>, ip: &str, l: &str) -> String {
        unicode_start_handler(State(state.clone()), client(ip), Path(l.to_string()))
            .await
            .unwrap()
    }

    async fn cont(state: &Arc<AppState>, ip: &str, l: &str) -> String {
        unicode_continue_handler(State(state.clone()), client(ip), Path(l.to_string()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_every_composer_requires_registration() {
        let state = create_test_state();
        let ip = "10.0.0.1";

        let results = [
            letter_handler(State(state.clone()), client(ip), Path("a".to_string())).await,
            unicode_start_handler(State(state.clone()), client(ip), Path("a".to_string())).await,
            unicode_continue_handler(State(state.clone()), client(ip), Path("a".to_string())).await,
            finish_username_handler(State(state.clone()), client(ip)).await,
        ];

        for result in results {
            assert!(matches!(result, Err(AccountError::NotRegistered)));
        }
        assert_eq!(state.store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_letters_accumulate() {
        let state = create_test_state();
        anonymous_user(&state, "10.0.0.1");

        assert_eq!(letter(&state, "10.0.0.1", "h").await, "Current string: ");
        letter(&state, "10.0.0.1", "i").await;

        let user = user_by_ip(&state, "10.0.0.1").unwrap();
        assert_eq!(user.username_unfinished, "hi");
    }

    #[tokio::test]
    async fn test_short_buffer_is_kept_on_continue() {
        let state = create_test_state();
        anonymous_user(&state, "10.0.0.1");

        start(&state, "10.0.0.1", "4").await;
        assert_eq!(cont(&state, "10.0.0.1", "1").await, "Current string: 41");

        // Too short to resolve: the letter lands after it, buffer untouched
        assert_eq!(letter(&state, "10.0.0.1", "x").await, "Current string: 41");

        let user = user_by_ip(&state, "10.0.0.1").unwrap();
        assert_eq!(user.username_unfinished, "x");
        assert_eq!(user.unicode_string, "41");
    }

    #[tokio::test]
    async fn test_unicode_start_flushes_previous_code_point() {
        let state = create_test_state();
        anonymous_user(&state, "10.0.0.1");

        start(&state, "10.0.0.1", "0").await;
        cont(&state, "10.0.0.1", "0").await;
        cont(&state, "10.0.0.1", "4").await;
        cont(&state, "10.0.0.1", "1").await;

        assert_eq!(start(&state, "10.0.0.1", "e").await, "Current username: A");

        let user = user_by_ip(&state, "10.0.0.1").unwrap();
        assert_eq!(user.username_unfinished, "A");
        assert_eq!(user.unicode_string, "e");
    }

    #[tokio::test]
    async fn test_malformed_buffer_is_left_in_place() {
        let state = create_test_state();
        anonymous_user(&state, "10.0.0.1");

        start(&state, "10.0.0.1", "zz").await;
        cont(&state, "10.0.0.1", "zz").await;
        letter(&state, "10.0.0.1", "q").await;

        let user = user_by_ip(&state, "10.0.0.1").unwrap();
        assert_eq!(user.username_unfinished, "q");
        assert_eq!(user.unicode_string, "zzzz");
    }

    #[tokio::test]
    async fn test_finish_commits_name_and_clears_buffer() {
        let state = create_test_state();
        let before = anonymous_user(&state, "10.0.0.1");

        letter(&state, "10.0.0.1", "b").await;
        start(&state, "10.0.0.1", "00").await;
        cont(&state, "10.0.0.1", "e9").await;

        let text = finish_username_handler(State(state.clone()), client("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(text, "Account created: bé");

        let user = user_by_ip(&state, "10.0.0.1").unwrap();
        assert_eq!(user.username, "bé");
        assert_eq!(user.username_unfinished, "");
        assert_eq!(user.unicode_string, "");
        assert!(user.last_seen > before.last_seen);
    }

    #[tokio::test]
    async fn test_finish_twice_keeps_unfinished_empty() {
        let state = create_test_state();
        anonymous_user(&state, "10.0.0.1");

        letter(&state, "10.0.0.1", "z").await;
        finish_username_handler(State(state.clone()), client("10.0.0.1"))
            .await
            .unwrap();
        let text = finish_username_handler(State(state.clone()), client("10.0.0.1"))
            .await
            .unwrap();

        // A second finish commits the (now empty) staging buffer
        assert_eq!(text, "Account created: ");
        let user = user_by_ip(&state, "10.0.0.1").unwrap();
        assert_eq!(user.username_unfinished, "");
        assert_eq!(user.username, "");
    }
}
