extern crate diesel;

use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Identifiable, Queryable, Serialize, Debug, Clone, PartialEq)]
#[table_name = "users"]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[table_name = "users"]
pub struct UserNoId {
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
}

#[derive(Identifiable, Queryable, Associations, Serialize, Debug, Clone, PartialEq)]
#[belongs_to(User)]
#[table_name = "teams"]
pub struct Team {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub personal_team: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[table_name = "teams"]
pub struct TeamNoId {
    pub user_id: i32,
    pub name: String,
    pub personal_team: bool,
}

#[derive(Identifiable, Queryable, Associations, Serialize, Debug, Clone, PartialEq)]
#[belongs_to(User)]
#[table_name = "channels"]
pub struct Channel {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub slug: String,
    pub public: bool,
    pub uid: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[table_name = "channels"]
pub struct ChannelNoId {
    pub user_id: i32,
    pub name: String,
    pub slug: String,
    pub public: bool,
    pub uid: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Partial update of a channel. `None` leaves a column untouched; for the
/// nullable columns `Some(None)` clears the value.
#[derive(AsChangeset, Debug, Default, Clone, PartialEq)]
#[table_name = "channels"]
pub struct ChannelChanges {
    pub user_id: Option<i32>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub public: Option<bool>,
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Identifiable, Queryable, Associations, Serialize, Debug, Clone, PartialEq)]
#[belongs_to(Channel)]
#[table_name = "videos"]
pub struct Video {
    pub id: i32,
    pub channel_id: i32,
    pub uid: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub filename: Option<String>,
}

#[cfg(test)]
#[derive(Insertable, Debug)]
#[table_name = "videos"]
pub struct VideoNoId {
    pub channel_id: i32,
    pub uid: String,
    pub filename: Option<String>,
}
