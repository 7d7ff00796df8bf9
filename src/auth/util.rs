use diesel::PgConnection;
use rocket::http::CookieJar;

use super::{sql, USER_COOKIE};
use crate::error::AppError;
use crate::models::{Channel, User};
use crate::unwrap_or_return;

pub fn user_id_from_cookies(cookies: &CookieJar<'_>) -> Option<i32> {
    let cookie = cookies.get(USER_COOKIE)?;
    Some(unwrap_or_return!(
        cookie.value().parse::<i32>(),
        "Ignoring malformed user_id cookie"
    ))
}

/// Resolves the cookie to a user. A cookie naming a user that no longer
/// exists counts as no user at all.
pub fn acting_user(
    connection: &PgConnection,
    cookies: &CookieJar<'_>,
) -> Result<Option<User>, AppError> {
    match user_id_from_cookies(cookies) {
        Some(id) => Ok(sql::get_user_by_id(connection, id)?),
        None => Ok(None),
    }
}

pub fn require_user(user: Option<User>) -> Result<User, AppError> {
    user.ok_or(AppError::Unauthenticated)
}

/// Only the owner may edit, update or delete a channel.
pub fn authorize_channel_owner(user: Option<&User>, channel: &Channel) -> Result<(), AppError> {
    let user = user.ok_or(AppError::Unauthenticated)?;
    if user.id != channel.user_id {
        info!(
            "User {} does not have permission to modify channel {}",
            user.id, channel.id
        );
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Private channels are only shown to their owner.
pub fn can_view_channel(user: Option<&User>, channel: &Channel) -> bool {
    channel.public || user.map_or(false, |u| u.id == channel.user_id)
}
