#[macro_use]
extern crate rocket;

#[macro_use]
extern crate diesel;

#[macro_use]
extern crate diesel_migrations;

mod api;
mod auth;
mod channel;
mod db;
mod error;
mod models;
mod schema;
mod seed;
#[cfg(test)]
mod testing;
mod util;
mod video;

pub use db::Database;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::{Build, Request, Rocket};

use crate::error::AppError;

#[derive(Parser)]
#[command(version, about = "Channels and their videos")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations and serve HTTP (the default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Revert the most recent migration
    Rollback,
    /// Fill a freshly migrated database with demo users and channels
    Seed,
}

#[catch(default)]
fn default_catcher(status: Status, _: &Request) -> RawHtml<String> {
    RawHtml(channel::view::error_page(status))
}

pub fn build_rocket(database: Database) -> Rocket<Build> {
    rocket::build()
        .manage(database)
        .mount("/", channel::routes())
        .mount("/", api::routes())
        .register("/", catchers![default_catcher])
}

#[rocket::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let database = Database::new(cli.database_url.ok_or(AppError::MissingDatabaseUrl)?);
    let connection = database.connect()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            db::run_migrations(&connection)?;
            std::mem::drop(connection);
            build_rocket(database).launch().await?;
        }
        Command::Migrate => db::run_migrations_with_output(&connection)?,
        Command::Rollback => {
            let version = db::revert_latest_migration(&connection)?;
            println!("Rolled back migration {}", version);
        }
        Command::Seed => {
            let report = seed::run(&connection)?;
            println!(
                "Seeded {} users, {} teams and {} channels",
                report.users, report.teams, report.channels
            );
        }
    }
    Ok(())
}
