//! Acting-user resolution and the ownership policy for channel writes.
//!
//! Sign-in itself lives outside this service: whatever performs it leaves the
//! signed-in user's id in the `user_id` cookie, which is resolved here.

pub mod csrf;
pub mod sql;
pub mod util;

pub const USER_COOKIE: &str = "user_id";
