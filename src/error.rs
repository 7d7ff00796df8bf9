use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::Request;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("failed to connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("failed to run migrations: {0}")]
    Migration(#[from] diesel_migrations::RunMigrationsError),
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("record is still referenced: {0}")]
    ForeignKey(String),
    #[error("failed to hash password: {0}")]
    PasswordHash(String),
    #[error("not found")]
    NotFound,
    #[error("no acting user")]
    Unauthenticated,
    #[error("not allowed")]
    Forbidden,
}

impl From<DieselError> for AppError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => AppError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                AppError::ForeignKey(info.message().to_string())
            }
            e => AppError::Database(e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::NotFound => Status::NotFound,
            AppError::Unauthenticated => Status::Unauthorized,
            AppError::Forbidden => Status::Forbidden,
            AppError::ForeignKey(_) => Status::Conflict,
            _ => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            error!("Request failed: {}", self);
        } else {
            info!("Request rejected with {}: {}", status, self);
        }
        Err(status)
    }
}
