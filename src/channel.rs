pub mod public;
pub mod request;
pub mod sql;
pub mod view;

pub fn routes() -> Vec<rocket::Route> {
    routes![
        public::index,
        public::create,
        public::store,
        public::show,
        public::edit,
        public::update,
        public::replace,
        public::destroy,
    ]
}
