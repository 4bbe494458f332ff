//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Registered accounts. `email` is stored lower-cased and unique.
    users (id) {
        id -> Uuid,
        email -> Text,
        name -> Text,
        password_hash -> Text,
        avatar -> Nullable<Text>,
        bio -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shared projects. `files` holds a JSON array of file descriptors.
    projects (id) {
        id -> Uuid,
        author_id -> Nullable<Uuid>,
        title -> Text,
        description -> Text,
        files -> Jsonb,
        main_file -> Nullable<Text>,
        is_public -> Bool,
        views -> Int8,
        likes -> Int8,
        external_url -> Nullable<Text>,
        external_embed -> Nullable<Text>,
        external_author -> Nullable<Text>,
        project_type -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    likes (user_id, project_id) {
        user_id -> Uuid,
        project_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    favorites (user_id, project_id) {
        user_id -> Uuid,
        project_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Project comments; replies reference their parent.
    comments (id) {
        id -> Uuid,
        project_id -> Uuid,
        author_id -> Uuid,
        parent_id -> Nullable<Uuid>,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    follows (follower_id, following_id) {
        follower_id -> Uuid,
        following_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    shares (id) {
        id -> Uuid,
        project_id -> Uuid,
        user_id -> Nullable<Uuid>,
        platform -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Activity notifications. `entity_id` is the project for like, comment
    /// and reply, and the follower for follow.
    notifications (id) {
        id -> Uuid,
        recipient_id -> Uuid,
        actor_id -> Uuid,
        kind -> Text,
        entity_id -> Uuid,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(projects -> users (author_id));
diesel::joinable!(comments -> users (author_id));
diesel::joinable!(comments -> projects (project_id));
diesel::joinable!(likes -> projects (project_id));
diesel::joinable!(favorites -> projects (project_id));
diesel::joinable!(shares -> projects (project_id));
diesel::joinable!(notifications -> users (actor_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    likes,
    favorites,
    comments,
    follows,
    shares,
    notifications,
);
