use rocket::http::{Cookie, CookieJar, SameSite};

use crate::error::AppError;
use crate::util::make_random_string;

pub const CSRF_COOKIE: &str = "csrf_token";
const TOKEN_LENGTH: usize = 40;

/// Returns the token embedded in forms, issuing a cookie for it on first use.
pub fn issue_token(cookies: &CookieJar<'_>) -> String {
    if let Some(existing) = cookies.get(CSRF_COOKIE) {
        return existing.value().to_string();
    }
    let token = make_random_string(TOKEN_LENGTH);
    let mut cookie = Cookie::new(CSRF_COOKIE, token.clone());
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookies.add(cookie);
    token
}

pub fn verify_token(cookies: &CookieJar<'_>, submitted: Option<&str>) -> Result<(), AppError> {
    match (cookies.get(CSRF_COOKIE), submitted) {
        (Some(expected), Some(submitted)) if expected.value() == submitted => Ok(()),
        _ => {
            info!("Rejected form submission with a missing or stale token");
            Err(AppError::Forbidden)
        }
    }
}
