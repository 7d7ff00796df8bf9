use diesel::dsl::exists;
use diesel::prelude::*;

use super::request::ChannelLookup;
use crate::error::AppError;
use crate::models::{Channel, ChannelChanges, ChannelNoId};
use crate::schema::channels;

/// Every channel, in whatever order the database returns them.
pub fn get_all_channels(connection: &PgConnection) -> QueryResult<Vec<Channel>> {
    channels::table.load::<Channel>(connection)
}

pub fn get_channel_by_id(connection: &PgConnection, id: i32) -> QueryResult<Channel> {
    channels::table
        .find(id)
        .get_result::<Channel>(connection)
        .map_err(|e| {
            if e == diesel::NotFound {
                info!("No channel with id {}", id);
            } else {
                warn!("Failed to get channel with id {} (error {})", id, e);
            }
            e
        })
}

pub fn insert_channel(connection: &PgConnection, channel: &ChannelNoId) -> QueryResult<Channel> {
    diesel::insert_into(channels::table)
        .values(channel)
        .get_result::<Channel>(connection)
}

pub fn update_channel(
    connection: &PgConnection,
    id: i32,
    changes: &ChannelChanges,
) -> QueryResult<Channel> {
    diesel::update(channels::table.find(id))
        .set(changes)
        .get_result::<Channel>(connection)
}

/// Fails with a foreign-key violation while videos still reference the
/// channel.
pub fn delete_channel(connection: &PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(channels::table.find(id)).execute(connection)
}

pub fn slug_exists(
    connection: &PgConnection,
    slug: &str,
    except_id: Option<i32>,
) -> QueryResult<bool> {
    let same_slug = channels::table.filter(channels::slug.eq(slug));
    match except_id {
        Some(id) => {
            diesel::select(exists(same_slug.filter(channels::id.ne(id)))).get_result(connection)
        }
        None => diesel::select(exists(same_slug)).get_result(connection),
    }
}

impl ChannelLookup for PgConnection {
    fn slug_taken(&self, slug: &str, except_id: Option<i32>) -> Result<bool, AppError> {
        Ok(slug_exists(self, slug, except_id)?)
    }

    fn user_exists(&self, user_id: i32) -> Result<bool, AppError> {
        Ok(crate::auth::sql::user_exists(self, user_id)?)
    }
}
