table! {
    channels (id) {
        id -> Int4,
        user_id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        public -> Bool,
        uid -> Varchar,
        description -> Nullable<Text>,
        image -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    teams (id) {
        id -> Int4,
        user_id -> Int4,
        name -> Varchar,
        personal_team -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        password -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    videos (id) {
        id -> Int4,
        channel_id -> Int4,
        uid -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
        filename -> Nullable<Varchar>,
    }
}

joinable!(channels -> users (user_id));
joinable!(teams -> users (user_id));
joinable!(videos -> channels (channel_id));

allow_tables_to_appear_in_same_query!(
    channels,
    teams,
    users,
    videos,
);
