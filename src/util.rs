use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use rand::{distributions::Alphanumeric, Rng};

use crate::error::AppError;

/// Length of the public identifier given to channels and videos.
pub const UID_LENGTH: usize = 24;

/// Builds a `RawJson` body of the form `{"status": .., "message": .., "data": ..}`.
#[macro_export]
macro_rules! make_json_response {
    ($status:expr, $message:expr) => {
        rocket::response::content::RawJson(
            serde_json::json!({
                "status": $status,
                "message": $message,
            })
            .to_string(),
        )
    };
    ($status:expr, $message:expr, $data:expr) => {
        rocket::response::content::RawJson(
            serde_json::json!({
                "status": $status,
                "message": $message,
                "data": $data,
            })
            .to_string(),
        )
    };
}

/// Evaluates to the `Ok`/`Some` value, or logs and returns `None` from the
/// enclosing function.
#[macro_export]
macro_rules! unwrap_or_return {
    ($e:expr, $msg:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => {
                warn!("{} ({})", $msg, e);
                return None;
            }
        }
    };
}

pub fn make_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_uid() -> String {
    make_random_string(UID_LENGTH).to_lowercase()
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Turns a display name into a lowercase, `separator`-joined URL slug.
///
/// Anything that is not alphanumeric acts as a word break; `@` is spelled
/// out as `at`.
pub fn slugify(name: &str, separator: char) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for word in name.replace('@', " at ").split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        if pending_separator {
            slug.push(separator);
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
        pending_separator = true;
    }

    slug
}
