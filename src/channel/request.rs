//! Validation for channel create and update requests.
//!
//! Requests are plain values checked against a [`ChannelLookup`], so the same
//! rules serve the HTML form and the JSON API.

use chrono::NaiveDateTime;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::auth::util::{authorize_channel_owner, require_user};
use crate::error::AppError;
use crate::models::{Channel, ChannelChanges, ChannelNoId, User};

pub const NAME_MIN: usize = 4;
pub const SLUG_MIN: usize = 4;
/// Column width of `name`, `slug` and `image`.
pub const VARCHAR_MAX: usize = 255;
pub const DESCRIPTION_MAX: usize = 4096;

pub const INVALID_MESSAGE: &str = "The given data was invalid.";
const SLUG_TAKEN: &str = "The slug has already been taken.";
const SLUG_UNIQUE_CONSTRAINT: &str = "channels_slug_unique";

/// Raw channel fields as submitted, before any normalization.
#[derive(Debug, Default, Clone, PartialEq, FromForm)]
pub struct ChannelInput {
    /// Anti-forgery token; only HTML forms carry one.
    #[field(name = "_token")]
    pub token: Option<String>,
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub slug: Option<String>,
    pub public: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Storage questions the rules need answered.
pub trait ChannelLookup {
    /// Whether a channel other than `except_id` already uses `slug`.
    fn slug_taken(&self, slug: &str, except_id: Option<i32>) -> Result<bool, AppError>;
    fn user_exists(&self, user_id: i32) -> Result<bool, AppError>;
}

/// Field-keyed validation messages.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: String) {
        self.errors.entry(field).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(test)]
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{}", INVALID_MESSAGE)]
    Invalid(ValidationErrors),
    #[error(transparent)]
    App(#[from] AppError),
}

/// Input that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedChannel {
    pub name: String,
    pub slug: String,
    /// `None` when the field was not submitted.
    pub public: Option<bool>,
    pub user_id: Option<i32>,
    /// Outer `None`: the field was not submitted.
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

impl ValidatedChannel {
    pub fn into_changes(self, now: NaiveDateTime) -> ChannelChanges {
        ChannelChanges {
            user_id: self.user_id,
            name: Some(self.name),
            slug: Some(self.slug),
            public: self.public,
            description: self.description,
            image: self.image,
            updated_at: Some(now),
        }
    }

    pub fn into_new_channel(self, owner_id: i32, uid: String) -> ChannelNoId {
        ChannelNoId {
            user_id: owner_id,
            name: self.name,
            slug: self.slug,
            public: self.public.unwrap_or(false),
            uid,
            description: self.description.flatten(),
            image: self.image.flatten(),
        }
    }
}

pub struct UpdateChannelRequest<'a> {
    pub channel: &'a Channel,
    pub input: ChannelInput,
    /// What a missing `public` field means.
    public_when_absent: Option<bool>,
}

impl<'a> UpdateChannelRequest<'a> {
    /// An unchecked box is left out of the form body, so absent is `false`.
    pub fn from_form(channel: &'a Channel, input: ChannelInput) -> Self {
        UpdateChannelRequest {
            channel,
            input,
            public_when_absent: Some(false),
        }
    }

    /// JSON clients leave out what they do not want to change.
    pub fn from_json(channel: &'a Channel, input: ChannelInput) -> Self {
        UpdateChannelRequest {
            channel,
            input,
            public_when_absent: None,
        }
    }

    pub fn authorize(&self, user: Option<&User>) -> Result<(), AppError> {
        authorize_channel_owner(user, self.channel)
    }

    /// Checks the rules; the channel's own slug never counts as taken.
    pub fn validate(
        &self,
        lookup: &impl ChannelLookup,
        now: NaiveDateTime,
    ) -> Result<ChannelChanges, RequestError> {
        validate_channel(&self.input, lookup, Some(self.channel.id)).map(|mut validated| {
            validated.public = validated.public.or(self.public_when_absent);
            validated.into_changes(now)
        })
    }
}

pub struct StoreChannelRequest {
    pub input: ChannelInput,
}

impl StoreChannelRequest {
    pub fn new(input: ChannelInput) -> Self {
        StoreChannelRequest { input }
    }

    pub fn authorize(&self, user: Option<User>) -> Result<User, AppError> {
        require_user(user)
    }

    /// New channels always belong to `owner`, whatever `user_id` says.
    pub fn validate(
        &self,
        lookup: &impl ChannelLookup,
        owner: &User,
        uid: String,
    ) -> Result<ChannelNoId, RequestError> {
        validate_channel(&self.input, lookup, None)
            .map(|validated| validated.into_new_channel(owner.id, uid))
    }
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Trimmed value, with blank treated as not submitted.
fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `None` when absent, `Some(None)` when submitted blank.
fn nullable(value: &Option<String>) -> Option<Option<String>> {
    value.as_ref().map(|_| filled(value).map(str::to_string))
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: Option<usize>,
    max: usize,
) -> bool {
    let length = value.chars().count();
    if let Some(min) = min {
        if length < min {
            errors.add(
                field,
                format!("The {} must be at least {} characters.", label(field), min),
            );
            return false;
        }
    }
    if length > max {
        errors.add(
            field,
            format!(
                "The {} must not be greater than {} characters.",
                label(field),
                max
            ),
        );
        return false;
    }
    true
}

fn required<'v>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &'v Option<String>,
) -> Option<&'v str> {
    let value = filled(value);
    if value.is_none() {
        errors.add(field, format!("The {} field is required.", label(field)));
    }
    value
}

pub fn validate_channel(
    input: &ChannelInput,
    lookup: &impl ChannelLookup,
    except_id: Option<i32>,
) -> Result<ValidatedChannel, RequestError> {
    let mut errors = ValidationErrors::default();

    let name = required(&mut errors, "name", &input.name);
    if let Some(name) = name {
        check_length(&mut errors, "name", name, Some(NAME_MIN), VARCHAR_MAX);
    }

    let slug = required(&mut errors, "slug", &input.slug);
    if let Some(slug) = slug {
        if check_length(&mut errors, "slug", slug, Some(SLUG_MIN), VARCHAR_MAX)
            && lookup.slug_taken(slug, except_id)?
        {
            errors.add("slug", SLUG_TAKEN.to_string());
        }
    }

    let public = match filled(&input.public) {
        None => None,
        Some(raw) => {
            let flag = parse_flag(raw);
            if flag.is_none() {
                errors.add("public", "The public field must be true or false.".to_string());
            }
            flag
        }
    };

    let user_id = match filled(&input.user_id) {
        None => None,
        Some(raw) => match raw.parse::<i32>() {
            Ok(id) => {
                if lookup.user_exists(id)? {
                    Some(id)
                } else {
                    errors.add("user_id", "The selected user id is invalid.".to_string());
                    None
                }
            }
            Err(_) => {
                errors.add("user_id", "The user id must be an integer.".to_string());
                None
            }
        },
    };

    let description = nullable(&input.description);
    if let Some(Some(text)) = &description {
        check_length(&mut errors, "description", text, None, DESCRIPTION_MAX);
    }

    let image = nullable(&input.image);
    if let Some(Some(path)) = &image {
        check_length(&mut errors, "image", path, None, VARCHAR_MAX);
    }

    match (name, slug) {
        (Some(name), Some(slug)) if errors.is_empty() => Ok(ValidatedChannel {
            name: name.to_string(),
            slug: slug.to_string(),
            public,
            user_id,
            description,
            image,
        }),
        _ => Err(RequestError::Invalid(errors)),
    }
}

/// A concurrent write can claim the slug between the check and the save;
/// the unique constraint then reports what the check would have.
pub fn slug_conflict(e: DieselError) -> RequestError {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &e {
        if info.constraint_name() == Some(SLUG_UNIQUE_CONSTRAINT) {
            let mut errors = ValidationErrors::default();
            errors.add("slug", SLUG_TAKEN.to_string());
            return RequestError::Invalid(errors);
        }
    }
    RequestError::App(e.into())
}
