use rocket::http::{CookieJar, Status};
use rocket::response::content::RawJson;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::auth::util::{acting_user, can_view_channel};
use crate::channel::request::{
    slug_conflict, ChannelInput, RequestError, UpdateChannelRequest, INVALID_MESSAGE,
};
use crate::channel::sql;
use crate::error::AppError;
use crate::make_json_response;
use crate::models::Channel;
use crate::Database;

type JsonResponse = (Status, RawJson<String>);

/// JSON body for a channel update. `null` clears `description` or `image`;
/// leaving the key out keeps the stored value.
#[derive(Debug, Deserialize)]
pub struct ChannelPayload {
    pub name: Option<String>,
    pub user_id: Option<i32>,
    pub slug: Option<String>,
    pub public: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<ChannelPayload> for ChannelInput {
    fn from(payload: ChannelPayload) -> Self {
        ChannelInput {
            token: None,
            name: payload.name,
            user_id: payload.user_id.map(|id| id.to_string()),
            slug: payload.slug,
            public: payload.public.map(|p| if p { "1" } else { "0" }.to_string()),
            description: payload.description.map(Option::unwrap_or_default),
            image: payload.image.map(Option::unwrap_or_default),
        }
    }
}

fn failure(e: AppError) -> JsonResponse {
    let status = e.status();
    let message = match e {
        AppError::NotFound => "Channel not found".to_string(),
        AppError::Unauthenticated => "Unauthorized".to_string(),
        AppError::Forbidden => "Forbidden".to_string(),
        e => {
            warn!("API request failed: {}", e);
            status.reason().unwrap_or("Error").to_string()
        }
    };
    (status, make_json_response!(status.code, message))
}

#[get("/api/channels")]
pub async fn get_all_channels(db: &State<Database>) -> JsonResponse {
    let result = db
        .connect()
        .and_then(|connection| sql::get_all_channels(&connection).map_err(AppError::from));
    match result {
        Ok(channels) => (Status::Ok, make_json_response!(200, "OK", channels)),
        Err(e) => failure(e),
    }
}

#[get("/api/channels/<id>")]
pub async fn get_channel_with_id(
    id: i32,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> JsonResponse {
    match find_visible_channel(id, db, cookies) {
        Ok(channel) => (Status::Ok, make_json_response!(200, "OK", channel)),
        Err(e) => failure(e),
    }
}

fn find_visible_channel(
    id: i32,
    db: &Database,
    cookies: &CookieJar<'_>,
) -> Result<Channel, AppError> {
    let connection = db.connect()?;
    let channel = sql::get_channel_by_id(&connection, id)?;
    if !can_view_channel(acting_user(&connection, cookies)?.as_ref(), &channel) {
        return Err(AppError::NotFound);
    }
    Ok(channel)
}

#[patch("/api/channels/<id>", format = "json", data = "<payload>")]
pub async fn update_channel(
    id: i32,
    payload: Json<ChannelPayload>,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> JsonResponse {
    match apply_update(id, payload.into_inner().into(), db, cookies) {
        Ok(response) => response,
        Err(e) => failure(e),
    }
}

fn apply_update(
    id: i32,
    input: ChannelInput,
    db: &Database,
    cookies: &CookieJar<'_>,
) -> Result<JsonResponse, AppError> {
    let connection = db.connect()?;
    let channel = sql::get_channel_by_id(&connection, id)?;
    let request = UpdateChannelRequest::from_json(&channel, input);
    request.authorize(acting_user(&connection, cookies)?.as_ref())?;

    let saved = request
        .validate(&connection, chrono::Utc::now().naive_utc())
        .and_then(|changes| {
            sql::update_channel(&connection, channel.id, &changes).map_err(slug_conflict)
        });
    match saved {
        Ok(updated) => {
            info!("Updated channel {} through the API", updated.id);
            Ok((Status::Ok, make_json_response!(200, "OK", updated)))
        }
        Err(RequestError::Invalid(errors)) => Ok((
            Status::UnprocessableEntity,
            RawJson(
                json!({
                    "status": 422,
                    "message": INVALID_MESSAGE,
                    "errors": errors,
                })
                .to_string(),
            ),
        )),
        Err(RequestError::App(e)) => Err(e),
    }
}
