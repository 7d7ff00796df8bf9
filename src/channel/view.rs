use rocket::http::{RawStr, Status};
use std::borrow::Cow;

use super::request::{parse_flag, ChannelInput, ValidationErrors};
use crate::models::{Channel, User, Video};

fn escape(text: &str) -> Cow<'_, str> {
    RawStr::new(text).html_escape()
}

pub fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Channels</title>
</head>
<body>
<header><h2>Channels</h2></header>
<main>
<h3>{title}</h3>
{content}
</main>
</body>
</html>
"#,
        title = escape(title),
        content = content,
    )
}

pub fn index(channels: &[Channel]) -> String {
    let mut rows = String::new();
    for channel in channels {
        rows.push_str(&format!(
            r#"<tr><td><a href="/channels/{id}">{name}</a></td><td>{slug}</td><td>{visibility}</td><td><a href="/channels/{id}/edit">Edit</a></td></tr>
"#,
            id = channel.id,
            name = escape(&channel.name),
            slug = escape(&channel.slug),
            visibility = if channel.public { "Public" } else { "Private" },
        ));
    }

    let content = format!(
        r#"<p><a href="/channels/create">New Channel</a></p>
<table>
<thead><tr><th>Name</th><th>Slug</th><th>Visibility</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    );
    layout("All Channels", &content)
}

pub fn show(channel: &Channel, owner: Option<&User>, videos: &[Video], csrf_token: &str) -> String {
    let owner_name = owner.map_or(Cow::Borrowed("Unknown"), |u| escape(&u.name));
    let mut video_items = String::new();
    for video in videos {
        video_items.push_str(&format!(
            "<li>{}</li>\n",
            escape(video.filename.as_deref().unwrap_or(&video.uid))
        ));
    }
    if video_items.is_empty() {
        video_items.push_str("<li>No videos yet</li>\n");
    }

    let content = format!(
        r#"<dl>
<dt>Owner</dt><dd>{owner}</dd>
<dt>Slug</dt><dd>{slug}</dd>
<dt>Visibility</dt><dd>{visibility}</dd>
<dt>Description</dt><dd>{description}</dd>
</dl>
<h4>Videos</h4>
<ul>
{videos}</ul>
<p><a href="/channels/{id}/edit">Edit</a> <a href="/channels">Back</a></p>
<form action="/channels/{id}" method="post">
<input type="hidden" name="_method" value="DELETE">
<input type="hidden" name="_token" value="{token}">
<button type="submit">Delete Channel</button>
</form>"#,
        owner = owner_name,
        slug = escape(&channel.slug),
        visibility = if channel.public { "Public" } else { "Private" },
        description = escape(channel.description.as_deref().unwrap_or("")),
        videos = video_items,
        id = channel.id,
        token = escape(csrf_token),
    );
    layout(&channel.name, &content)
}

/// Create and edit share one form; `channel` is `None` when creating.
pub struct ChannelFormPage<'a> {
    pub channel: Option<&'a Channel>,
    pub users: &'a [User],
    /// What was submitted last time, when redisplaying after a failure.
    pub old: Option<&'a ChannelInput>,
    pub errors: &'a ValidationErrors,
    pub csrf_token: &'a str,
}

impl<'a> ChannelFormPage<'a> {
    /// Submitted value first, then the stored one.
    fn value(
        &self,
        submitted: fn(&ChannelInput) -> &Option<String>,
        stored: fn(&Channel) -> Option<&str>,
    ) -> Cow<'a, str> {
        self.old
            .and_then(|old| submitted(old).as_deref())
            .or_else(|| self.channel.and_then(stored))
            .map_or(Cow::Borrowed(""), escape)
    }

    fn public_checked(&self) -> bool {
        match self.old {
            // an unchecked box is not submitted at all
            Some(old) => old
                .public
                .as_deref()
                .and_then(|v| parse_flag(v.trim()))
                .unwrap_or(false),
            None => self.channel.map_or(false, |c| c.public),
        }
    }

    fn selected_owner(&self) -> Option<i32> {
        self.old
            .and_then(|old| old.user_id.as_deref())
            .and_then(|id| id.trim().parse().ok())
            .or_else(|| self.channel.map(|c| c.user_id))
    }

    fn error(&self, field: &str) -> String {
        match self.errors.first(field) {
            Some(message) => format!(
                "<p class=\"error\" id=\"{}-error\">{}</p>\n",
                field,
                escape(message)
            ),
            None => String::new(),
        }
    }

    pub fn render(&self) -> String {
        let (title, action, method) = match self.channel {
            Some(channel) => ("Edit Channel", format!("/channels/{}", channel.id), "PATCH"),
            None => ("New Channel", "/channels".to_string(), "POST"),
        };

        let mut owner_options = String::new();
        let selected = self.selected_owner();
        for user in self.users {
            owner_options.push_str(&format!(
                "<option value=\"{}\"{}>{}</option>\n",
                user.id,
                if selected == Some(user.id) { " selected" } else { "" },
                escape(&user.name)
            ));
        }
        // new channels belong to whoever creates them
        let owner_field = if self.channel.is_some() {
            format!(
                "<div>\n<label for=\"user_id\">Owner</label>\n<select name=\"user_id\" id=\"user_id\">\n{}</select>\n{}</div>\n",
                owner_options,
                self.error("user_id")
            )
        } else {
            String::new()
        };

        let content = format!(
            r#"<form action="{action}" method="post">
<input type="hidden" name="_method" value="{method}">
<input type="hidden" name="_token" value="{token}">
<div>
<label for="name">Name</label>
<input type="text" name="name" id="name" value="{name}">
{name_error}</div>
{owner_field}<div>
<label for="slug">Slug</label>
<input type="text" name="slug" id="slug" value="{slug}">
{slug_error}</div>
<div>
<label for="public">Public</label>
<input aria-label="public toggle" type="checkbox" name="public" id="public" value="1"{checked}>
{public_error}</div>
<div>
<label for="description">Description</label>
<textarea id="description" name="description">{description}</textarea>
{description_error}</div>
<div>
<label for="image">Channel Image</label>
<input type="text" name="image" id="image" value="{image}">
{image_error}</div>
<div>
<button type="submit">Save Changes</button>
<a href="/channels">Cancel</a>
</div>
</form>"#,
            action = action,
            method = method,
            token = escape(self.csrf_token),
            name = self.value(|i| &i.name, |c| Some(c.name.as_str())),
            name_error = self.error("name"),
            owner_field = owner_field,
            slug = self.value(|i| &i.slug, |c| Some(c.slug.as_str())),
            slug_error = self.error("slug"),
            checked = if self.public_checked() { " checked" } else { "" },
            public_error = self.error("public"),
            description = self.value(|i| &i.description, |c| c.description.as_deref()),
            description_error = self.error("description"),
            image = self.value(|i| &i.image, |c| c.image.as_deref()),
            image_error = self.error("image"),
        );
        layout(title, &content)
    }
}

pub fn error_page(status: Status) -> String {
    let content = format!(
        "<p>{} {}</p>\n<p><a href=\"/channels\">Back to channels</a></p>",
        status.code,
        status.reason().unwrap_or("Error")
    );
    layout("Something went wrong", &content)
}
