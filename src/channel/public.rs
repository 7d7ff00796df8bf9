use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::State;

use super::request::{
    slug_conflict, ChannelInput, RequestError, StoreChannelRequest, UpdateChannelRequest,
    ValidationErrors,
};
use super::{sql, view};
use crate::auth::csrf::{issue_token, verify_token};
use crate::auth::sql::{get_all_users, get_user_by_id};
use crate::auth::util::{acting_user, authorize_channel_owner, can_view_channel, require_user};
use crate::error::AppError;
use crate::models::Channel;
use crate::util::generate_uid;
use crate::video::sql::get_videos_for_channel;
use crate::Database;

const CHANNELS_PATH: &str = "/channels";

#[derive(Responder)]
pub enum FormOutcome {
    Saved(Redirect),
    #[response(status = 422)]
    Invalid(RawHtml<String>),
}

#[derive(Debug, FromForm)]
pub struct DeleteForm {
    #[field(name = "_token")]
    pub token: Option<String>,
}

#[get("/channels")]
pub async fn index(db: &State<Database>) -> Result<RawHtml<String>, AppError> {
    let connection = db.connect()?;
    let channels = sql::get_all_channels(&connection)?;
    Ok(RawHtml(view::index(&channels)))
}

#[get("/channels/create")]
pub async fn create(db: &State<Database>, cookies: &CookieJar<'_>) -> Result<RawHtml<String>, AppError> {
    let connection = db.connect()?;
    require_user(acting_user(&connection, cookies)?)?;
    let page = view::ChannelFormPage {
        channel: None,
        users: &[],
        old: None,
        errors: &ValidationErrors::default(),
        csrf_token: &issue_token(cookies),
    };
    Ok(RawHtml(page.render()))
}

#[post("/channels", data = "<form>")]
pub async fn store(
    form: Form<ChannelInput>,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<FormOutcome, AppError> {
    let connection = db.connect()?;
    let request = StoreChannelRequest::new(form.into_inner());
    verify_token(cookies, request.input.token.as_deref())?;
    let owner = request.authorize(acting_user(&connection, cookies)?)?;

    let saved = request
        .validate(&connection, &owner, generate_uid())
        .and_then(|new_channel| {
            sql::insert_channel(&connection, &new_channel).map_err(slug_conflict)
        });
    match saved {
        Ok(channel) => {
            info!("User {} created channel {} ({})", owner.id, channel.id, channel.slug);
            Ok(FormOutcome::Saved(Redirect::to(CHANNELS_PATH)))
        }
        Err(RequestError::Invalid(errors)) => {
            let page = view::ChannelFormPage {
                channel: None,
                users: &[],
                old: Some(&request.input),
                errors: &errors,
                csrf_token: &issue_token(cookies),
            };
            Ok(FormOutcome::Invalid(RawHtml(page.render())))
        }
        Err(RequestError::App(e)) => Err(e),
    }
}

#[get("/channels/<id>")]
pub async fn show(
    id: i32,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<RawHtml<String>, AppError> {
    let connection = db.connect()?;
    let channel = sql::get_channel_by_id(&connection, id)?;
    let user = acting_user(&connection, cookies)?;
    if !can_view_channel(user.as_ref(), &channel) {
        return Err(AppError::NotFound);
    }

    let owner = get_user_by_id(&connection, channel.user_id)?;
    let videos = get_videos_for_channel(&connection, &channel)?;
    Ok(RawHtml(view::show(
        &channel,
        owner.as_ref(),
        &videos,
        &issue_token(cookies),
    )))
}

#[get("/channels/<id>/edit")]
pub async fn edit(
    id: i32,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<RawHtml<String>, AppError> {
    let connection = db.connect()?;
    let channel = sql::get_channel_by_id(&connection, id)?;
    authorize_channel_owner(acting_user(&connection, cookies)?.as_ref(), &channel)?;

    let users = get_all_users(&connection)?;
    let page = view::ChannelFormPage {
        channel: Some(&channel),
        users: &users,
        old: None,
        errors: &ValidationErrors::default(),
        csrf_token: &issue_token(cookies),
    };
    Ok(RawHtml(page.render()))
}

#[patch("/channels/<id>", data = "<form>")]
pub async fn update(
    id: i32,
    form: Form<ChannelInput>,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<FormOutcome, AppError> {
    update_from_form(id, form.into_inner(), db, cookies)
}

#[put("/channels/<id>", data = "<form>")]
pub async fn replace(
    id: i32,
    form: Form<ChannelInput>,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<FormOutcome, AppError> {
    update_from_form(id, form.into_inner(), db, cookies)
}

fn update_from_form(
    id: i32,
    input: ChannelInput,
    db: &Database,
    cookies: &CookieJar<'_>,
) -> Result<FormOutcome, AppError> {
    verify_token(cookies, input.token.as_deref())?;
    let connection = db.connect()?;
    let channel = sql::get_channel_by_id(&connection, id)?;
    let request = UpdateChannelRequest::from_form(&channel, input);
    request.authorize(acting_user(&connection, cookies)?.as_ref())?;

    let saved = request
        .validate(&connection, chrono::Utc::now().naive_utc())
        .and_then(|changes| {
            sql::update_channel(&connection, channel.id, &changes).map_err(slug_conflict)
        });
    match saved {
        Ok(updated) => {
            info!("Updated channel {} ({})", updated.id, updated.slug);
            Ok(FormOutcome::Saved(Redirect::to(CHANNELS_PATH)))
        }
        Err(RequestError::Invalid(errors)) => {
            info!(
                "Rejected update of channel {}: invalid {}",
                channel.id,
                errors.fields().collect::<Vec<_>>().join(", ")
            );
            Ok(FormOutcome::Invalid(RawHtml(redisplay(
                &connection,
                &channel,
                &request.input,
                &errors,
                cookies,
            )?)))
        }
        Err(RequestError::App(e)) => Err(e),
    }
}

fn redisplay(
    connection: &diesel::PgConnection,
    channel: &Channel,
    input: &ChannelInput,
    errors: &ValidationErrors,
    cookies: &CookieJar<'_>,
) -> Result<String, AppError> {
    let users = get_all_users(connection)?;
    let page = view::ChannelFormPage {
        channel: Some(channel),
        users: &users,
        old: Some(input),
        errors,
        csrf_token: &issue_token(cookies),
    };
    Ok(page.render())
}

#[delete("/channels/<id>", data = "<form>")]
pub async fn destroy(
    id: i32,
    form: Form<DeleteForm>,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<Redirect, AppError> {
    verify_token(cookies, form.token.as_deref())?;
    let connection = db.connect()?;
    let channel = sql::get_channel_by_id(&connection, id)?;
    authorize_channel_owner(acting_user(&connection, cookies)?.as_ref(), &channel)?;

    sql::delete_channel(&connection, channel.id)?;
    info!("Deleted channel {} ({})", channel.id, channel.slug);
    Ok(Redirect::to(CHANNELS_PATH))
}

#[cfg(test)]
mod tests {
    use crate::auth::csrf::CSRF_COOKIE;
    use crate::auth::sql::insert_user;
    use crate::auth::USER_COOKIE;
    use crate::channel::sql::{get_channel_by_id, insert_channel};
    use crate::models::Channel;
    use crate::schema::{channels, users, videos};
    use crate::testing::{
        channel_fixture, insert_video_for, test_connection, test_database, user_fixture,
    };
    use crate::build_rocket;
    use diesel::prelude::*;
    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::blocking::{Client, LocalRequest};

    /// Committed rows, since requests run on their own connection. Removed on
    /// drop.
    struct Fixture {
        connection: PgConnection,
        user_ids: Vec<i32>,
        channel_id: i32,
        slug: String,
    }

    impl Fixture {
        fn create(tag: &str) -> Option<(Fixture, Client)> {
            let connection = test_connection()?;
            let user = insert_user(&connection, &user_fixture(tag)).unwrap();
            let channel = insert_channel(&connection, &channel_fixture(user.id, tag)).unwrap();
            let client = Client::tracked(build_rocket(test_database())).unwrap();
            Some((
                Fixture {
                    connection,
                    user_ids: vec![user.id],
                    channel_id: channel.id,
                    slug: channel.slug,
                },
                client,
            ))
        }

        fn owner(&self) -> i32 {
            self.user_ids[0]
        }

        fn add_user(&mut self, tag: &str) -> i32 {
            let user = insert_user(&self.connection, &user_fixture(tag)).unwrap();
            self.user_ids.push(user.id);
            user.id
        }

        fn stored(&self) -> Channel {
            get_channel_by_id(&self.connection, self.channel_id).unwrap()
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let owned = channels::table
                .filter(channels::user_id.eq_any(&self.user_ids))
                .select(channels::id);
            let _ = diesel::delete(videos::table.filter(videos::channel_id.eq_any(owned)))
                .execute(&self.connection);
            let _ = diesel::delete(channels::table.filter(channels::user_id.eq_any(&self.user_ids)))
                .execute(&self.connection);
            let _ = diesel::delete(users::table.filter(users::id.eq_any(&self.user_ids)))
                .execute(&self.connection);
        }
    }

    fn as_user(request: LocalRequest<'_>, user_id: i32) -> LocalRequest<'_> {
        request.cookie(Cookie::new(USER_COOKIE, user_id.to_string()))
    }

    /// Opens the edit form, which issues the anti-forgery cookie.
    fn csrf_token(client: &Client, fixture: &Fixture) -> String {
        let path = format!("/channels/{}/edit", fixture.channel_id);
        let response = as_user(client.get(path), fixture.owner()).dispatch();
        assert_eq!(response.status(), Status::Ok);
        client
            .cookies()
            .get(CSRF_COOKIE)
            .map(|c| c.value().to_string())
            .expect("edit form issues a token")
    }

    fn form_body(fields: &[(&str, &str)]) -> String {
        fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.replace(' ', "+")))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn submit(client: &Client, path: String, user_id: i32, fields: &[(&str, &str)]) -> Status {
        as_user(client.post(path), user_id)
            .header(ContentType::Form)
            .body(form_body(fields))
            .dispatch()
            .status()
    }

    #[test]
    #[serial_test::serial]
    fn missing_channel_is_404() {
        let (fixture, client) = match Fixture::create("missing") {
            Some(f) => f,
            None => return,
        };
        let show = as_user(client.get("/channels/-1"), fixture.owner()).dispatch();
        assert_eq!(show.status(), Status::NotFound);
        let edit = as_user(client.get("/channels/-1/edit"), fixture.owner()).dispatch();
        assert_eq!(edit.status(), Status::NotFound);
    }

    #[test]
    #[serial_test::serial]
    fn index_lists_channel() {
        let (fixture, client) = match Fixture::create("listed") {
            Some(f) => f,
            None => return,
        };
        let response = client.get("/channels").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert!(response.into_string().unwrap().contains(&fixture.slug));
    }

    #[test]
    #[serial_test::serial]
    fn edit_requires_owner() {
        let (mut fixture, client) = match Fixture::create("guarded") {
            Some(f) => f,
            None => return,
        };
        let stranger = fixture.add_user("stranger");
        let path = format!("/channels/{}/edit", fixture.channel_id);

        assert_eq!(client.get(path.clone()).dispatch().status(), Status::Unauthorized);
        assert_eq!(
            as_user(client.get(path.clone()), stranger).dispatch().status(),
            Status::Forbidden
        );
        assert_eq!(
            as_user(client.get(path), fixture.owner()).dispatch().status(),
            Status::Ok
        );
    }

    #[test]
    #[serial_test::serial]
    fn private_channel_hidden_from_others() {
        let (mut fixture, client) = match Fixture::create("hidden") {
            Some(f) => f,
            None => return,
        };
        diesel::update(channels::table.find(fixture.channel_id))
            .set(channels::public.eq(false))
            .execute(&fixture.connection)
            .unwrap();
        let stranger = fixture.add_user("peeker");
        let path = format!("/channels/{}", fixture.channel_id);

        assert_eq!(client.get(path.clone()).dispatch().status(), Status::NotFound);
        assert_eq!(
            as_user(client.get(path.clone()), stranger).dispatch().status(),
            Status::NotFound
        );
        assert_eq!(
            as_user(client.get(path), fixture.owner()).dispatch().status(),
            Status::Ok
        );
    }

    #[test]
    #[serial_test::serial]
    fn update_with_short_name_redisplays_form() {
        let (fixture, client) = match Fixture::create("shortname") {
            Some(f) => f,
            None => return,
        };
        let token = csrf_token(&client, &fixture);

        let response = as_user(
            client.post(format!("/channels/{}", fixture.channel_id)),
            fixture.owner(),
        )
        .header(ContentType::Form)
        .body(form_body(&[
            ("_method", "PATCH"),
            ("_token", &token),
            ("name", "abc"),
            ("slug", &fixture.slug),
        ]))
        .dispatch();
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let html = response.into_string().unwrap();
        assert!(html.contains("The name must be at least 4 characters."));
        assert!(html.contains(r#"id="name" value="abc""#));

        assert_ne!(fixture.stored().name, "abc");
    }

    #[test]
    #[serial_test::serial]
    fn update_with_own_slug_keeps_description() {
        let (fixture, client) = match Fixture::create("ownslug") {
            Some(f) => f,
            None => return,
        };
        let token = csrf_token(&client, &fixture);

        let status = submit(
            &client,
            format!("/channels/{}", fixture.channel_id),
            fixture.owner(),
            &[
                ("_method", "PATCH"),
                ("_token", &token),
                ("name", "Tech Talk"),
                ("slug", &fixture.slug),
            ],
        );
        assert_eq!(status, Status::SeeOther);

        let stored = fixture.stored();
        assert_eq!(stored.name, "Tech Talk");
        assert_eq!(stored.slug, fixture.slug);
        assert_eq!(stored.description.as_deref(), Some("Original description"));
        // the box was left unchecked
        assert!(!stored.public);
    }

    #[test]
    #[serial_test::serial]
    fn update_without_token_is_forbidden() {
        let (fixture, client) = match Fixture::create("notoken") {
            Some(f) => f,
            None => return,
        };
        let status = submit(
            &client,
            format!("/channels/{}", fixture.channel_id),
            fixture.owner(),
            &[("_method", "PATCH"), ("name", "Tech Talk")],
        );
        assert_eq!(status, Status::Forbidden);
        assert_ne!(fixture.stored().name, "Tech Talk");
    }

    #[test]
    #[serial_test::serial]
    fn destroy_with_videos_conflicts_then_succeeds() {
        let (fixture, client) = match Fixture::create("destroy") {
            Some(f) => f,
            None => return,
        };
        insert_video_for(&fixture.connection, fixture.channel_id).unwrap();
        let token = csrf_token(&client, &fixture);
        let path = format!("/channels/{}", fixture.channel_id);
        let fields = [("_method", "DELETE"), ("_token", token.as_str())];

        assert_eq!(
            submit(&client, path.clone(), fixture.owner(), &fields),
            Status::Conflict
        );
        assert!(get_channel_by_id(&fixture.connection, fixture.channel_id).is_ok());

        diesel::delete(videos::table.filter(videos::channel_id.eq(fixture.channel_id)))
            .execute(&fixture.connection)
            .unwrap();
        assert_eq!(
            submit(&client, path, fixture.owner(), &fields),
            Status::SeeOther
        );
        assert_eq!(
            get_channel_by_id(&fixture.connection, fixture.channel_id),
            Err(diesel::NotFound)
        );
    }

    #[test]
    #[serial_test::serial]
    fn store_creates_channel_for_acting_user() {
        let (fixture, client) = match Fixture::create("store") {
            Some(f) => f,
            None => return,
        };
        let token = csrf_token(&client, &fixture);
        let slug = format!("{}-stored", fixture.slug);

        let status = submit(
            &client,
            "/channels".to_string(),
            fixture.owner(),
            &[
                ("_method", "POST"),
                ("_token", &token),
                ("name", "Stored channel"),
                ("slug", &slug),
                ("public", "1"),
            ],
        );
        assert_eq!(status, Status::SeeOther);

        let created = channels::table
            .filter(channels::slug.eq(&slug))
            .first::<Channel>(&fixture.connection)
            .unwrap();
        assert_eq!(created.user_id, fixture.owner());
        assert!(created.public);
        assert!(!created.uid.is_empty());
    }
}
