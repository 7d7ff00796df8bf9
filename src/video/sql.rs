extern crate diesel;

use crate::models::{Channel, Video};
use diesel::prelude::*;

pub fn get_videos_for_channel(connection: &PgConnection, channel: &Channel) -> QueryResult<Vec<Video>> {
    Video::belonging_to(channel)
        .load::<Video>(connection)
        .map_err(|e| {
            warn!("Failed to get videos for channel {} (error {})", channel.id, e);
            e
        })
}
