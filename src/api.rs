//! JSON mirror of the channel routes, under `/api`.

pub mod channels;

pub fn routes() -> Vec<rocket::Route> {
    routes![
        channels::get_all_channels,
        channels::get_channel_with_id,
        channels::update_channel,
    ]
}
