//! Shared fixtures for the unit tests.
//!
//! Database-backed tests need `DATABASE_URL` to point at a scratch
//! PostgreSQL database; without it they return early and report the skip.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use std::sync::Once;

use crate::db::Database;
use crate::models::{Channel, ChannelNoId, User, UserNoId, Video, VideoNoId};
use crate::schema::videos;
use crate::util::{generate_uid, make_random_string};

static MIGRATE: Once = Once::new();

pub fn test_connection() -> Option<PgConnection> {
    dotenv::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        }
    };
    let connection = PgConnection::establish(&database_url).expect("test database unreachable");
    MIGRATE.call_once(|| {
        crate::db::run_migrations(&connection).expect("failed to migrate test database");
    });
    Some(connection)
}

/// Only meaningful once [`test_connection`] has returned a connection.
pub fn test_database() -> Database {
    Database::new(std::env::var("DATABASE_URL").unwrap_or_default())
}

fn epoch() -> NaiveDateTime {
    NaiveDateTime::from_timestamp_opt(0, 0).unwrap()
}

pub fn user_stub(id: i32) -> User {
    User {
        id,
        name: format!("User {}", id),
        email: format!("user{}@example.com", id),
        password: String::new(),
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn channel_stub(id: i32, user_id: i32, slug: &str) -> Channel {
    Channel {
        id,
        user_id,
        name: format!("Channel {}", id),
        slug: slug.to_string(),
        public: true,
        uid: generate_uid(),
        description: Some("Original description".to_string()),
        image: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

/// A user whose email will not collide with rows other tests created.
pub fn user_fixture(tag: &str) -> UserNoId {
    UserNoId {
        name: format!("Fixture {}", tag),
        email: format!("{}-{}@example.test", tag, make_random_string(8)),
        password: "not-a-real-hash".to_string(),
    }
}

pub fn channel_fixture(user_id: i32, tag: &str) -> ChannelNoId {
    ChannelNoId {
        user_id,
        name: format!("Fixture channel {}", tag),
        slug: format!("{}-{}", tag, make_random_string(8).to_lowercase()),
        public: true,
        uid: generate_uid(),
        description: Some("Original description".to_string()),
        image: None,
    }
}

pub fn insert_video_for(connection: &PgConnection, channel_id: i32) -> QueryResult<Video> {
    diesel::insert_into(videos::table)
        .values(&VideoNoId {
            channel_id,
            uid: generate_uid(),
            filename: Some("intro.mp4".to_string()),
        })
        .get_result::<Video>(connection)
}
