use diesel::prelude::*;

use crate::error::AppError;

embed_migrations!("migrations");

/// Where to reach PostgreSQL. Managed by Rocket; every request opens its own
/// connection.
pub struct Database {
    url: String,
}

impl Database {
    pub fn new(url: String) -> Self {
        Database { url }
    }

    pub fn connect(&self) -> Result<PgConnection, AppError> {
        create_connection(&self.url)
    }
}

pub fn create_connection(database_url: &str) -> Result<PgConnection, AppError> {
    PgConnection::establish(database_url).map_err(|e| {
        error!("Error connecting to database: {}", e);
        AppError::from(e)
    })
}

/// Applies every embedded migration that has not run yet. Each one runs in
/// its own transaction, so a failing migration leaves the schema untouched.
pub fn run_migrations(connection: &PgConnection) -> Result<(), AppError> {
    embedded_migrations::run(connection)?;
    Ok(())
}

pub fn run_migrations_with_output(connection: &PgConnection) -> Result<(), AppError> {
    embedded_migrations::run_with_output(connection, &mut std::io::stdout())?;
    Ok(())
}

/// Reverts the most recently applied migration, reading its `down.sql` from
/// the `migrations` directory. Returns the reverted version.
pub fn revert_latest_migration(connection: &PgConnection) -> Result<String, AppError> {
    Ok(diesel_migrations::revert_latest_migration(connection)?)
}
