use crate::core::error::AccountError;
use crate::core::state::AppState;
use crate::handlers::registered_user;
use crate::models::user::Channel;
use crate::utils::client_ip::ClientIp;
use axum::extract::{Path, State};
use std::sync::Arc;
use tracing::debug;

/// GET /color/red/{value}
pub async fn color_red_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(value): Path<String>,
) -> Result<String, AccountError> {
    update_channel(&state, &ip, Channel::Red, &value)
}

/// GET /color/green/{value}
pub async fn color_green_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(value): Path<String>,
) -> Result<String, AccountError> {
    update_channel(&state, &ip, Channel::Green, &value)
}

/// GET /color/blue/{value}
///
/// Also recomputes the derived hex color.
pub async fn color_blue_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(value): Path<String>,
) -> Result<String, AccountError> {
    update_channel(&state, &ip, Channel::Blue, &value)
}

/// Store one channel verbatim. The hex color follows only on blue unless
/// `account.recompute_color_on_any_channel` is set.
fn update_channel(
    state: &AppState,
    ip: &str,
    channel: Channel,
    raw: &str,
) -> Result<String, AccountError> {
    state.store.transaction(|tx| -> Result<(), AccountError> {
        let mut user = registered_user(tx, ip)?;

        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| AccountError::MalformedInput(raw.to_string()))?;

        user.set_channel(channel, value);
        if channel == Channel::Blue || state.config.account.recompute_color_on_any_channel {
            user.refresh_color();
        }
        tx.save(&user)?;

        debug!(
            user_id = user.id,
            channel = channel.as_str(),
            value,
            color = %user.color,
            "Color channel updated"
        );
        Ok(())
    })?;

    let message = match channel {
        Channel::Red => "Red updated",
        Channel::Green => "Green updated",
        Channel::Blue => "Color updated",
    };
    Ok(message.to_string())
}
