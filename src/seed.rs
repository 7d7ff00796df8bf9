//! Demo data: three users, each with a personal team plus one public and one
//! private channel.
//!
//! Meant for a freshly migrated database. Running it twice fails on the
//! unique email and slug constraints and leaves nothing behind.

use diesel::prelude::*;

use crate::auth::sql::insert_user;
use crate::channel::sql::insert_channel;
use crate::error::AppError;
use crate::models::{ChannelNoId, TeamNoId, UserNoId};
use crate::schema::teams;
use crate::util::{generate_uid, hash_password, slugify};

struct SeedUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
}

const SEED_USERS: [SeedUser; 3] = [
    SeedUser {
        name: "Administrator",
        email: "admin@example.com",
        password: "Password1",
    },
    SeedUser {
        name: "Eileen Dover",
        email: "eileen@example.com",
        password: "Password1",
    },
    SeedUser {
        name: "Russel Leaves",
        email: "russel@example.com",
        password: "Password1",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    const ALL: [Visibility; 2] = [Visibility::Public, Visibility::Private];

    fn label(self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Private => "Private",
        }
    }
}

/// One user and everything created alongside them.
#[derive(Debug)]
pub struct PlannedUser {
    pub user: UserNoId,
    pub team_name: String,
    pub channels: Vec<PlannedChannel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChannel {
    pub name: String,
    pub slug: String,
    pub public: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub teams: usize,
    pub channels: usize,
}

/// "Eileen Dover" owns "Eileen's Team".
pub fn personal_team_name(user_name: &str) -> String {
    let first = user_name.split(' ').next().unwrap_or(user_name);
    format!("{}'s Team", first)
}

pub fn channel_for(user_name: &str, visibility: Visibility) -> PlannedChannel {
    let name = format!("{} {} channel", user_name, visibility.label());
    PlannedChannel {
        slug: slugify(&name, '-'),
        public: visibility == Visibility::Public,
        name,
    }
}

pub fn plan() -> Result<Vec<PlannedUser>, AppError> {
    SEED_USERS
        .iter()
        .map(|seed| {
            Ok(PlannedUser {
                user: UserNoId {
                    name: seed.name.to_string(),
                    email: seed.email.to_string(),
                    password: hash_password(seed.password)?,
                },
                team_name: personal_team_name(seed.name),
                channels: Visibility::ALL
                    .iter()
                    .map(|&visibility| channel_for(seed.name, visibility))
                    .collect(),
            })
        })
        .collect()
}

pub fn run(connection: &PgConnection) -> Result<SeedReport, AppError> {
    let planned = plan()?;
    connection.transaction::<_, AppError, _>(|| {
        let mut report = SeedReport::default();
        for entry in planned {
            let user = insert_user(connection, &entry.user)?;
            report.users += 1;

            diesel::insert_into(teams::table)
                .values(&TeamNoId {
                    user_id: user.id,
                    name: entry.team_name,
                    personal_team: true,
                })
                .execute(connection)?;
            report.teams += 1;

            for channel in entry.channels {
                insert_channel(
                    connection,
                    &ChannelNoId {
                        user_id: user.id,
                        name: channel.name,
                        slug: channel.slug,
                        public: channel.public,
                        uid: generate_uid(),
                        description: None,
                        image: None,
                    },
                )?;
                report.channels += 1;
            }
            info!("Seeded user {} <{}>", user.name, user.email);
        }
        Ok(report)
    })
}
