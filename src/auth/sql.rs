use crate::models::{User, UserNoId};
use crate::schema::users;
use diesel::dsl::exists;
use diesel::prelude::*;

pub fn insert_user(connection: &PgConnection, user: &UserNoId) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(user)
        .get_result::<User>(connection)
        .map_err(|e| {
            warn!("Failed to insert user {} (error {})", user.email, e);
            e
        })
}

pub fn get_user_by_id(connection: &PgConnection, id: i32) -> QueryResult<Option<User>> {
    users::table
        .find(id)
        .get_result::<User>(connection)
        .optional()
}

pub fn user_exists(connection: &PgConnection, id: i32) -> QueryResult<bool> {
    diesel::select(exists(users::table.find(id))).get_result(connection)
}

pub fn get_all_users(connection: &PgConnection) -> QueryResult<Vec<User>> {
    users::table.order(users::name.asc()).load::<User>(connection)
}
