//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes a table, update the matching block here or regenerate
//! it with `diesel print-schema`.

diesel::table! {
    /// Registered accounts.
    ///
    /// `email` is stored lower-cased and carries a unique index.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        display_name -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        /// One of `student`, `teacher` or `admin`.
        role -> Varchar,
        /// Customer reference issued by the card payment provider.
        billing_customer_id -> Nullable<Varchar>,
        image_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Course categories.
    categories (id) {
        id -> Uuid,
        name -> Varchar,
    }
}

diesel::table! {
    /// Courses authored by teachers.
    courses (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        image_url -> Nullable<Text>,
        /// Price in minor units; `NULL` until the author sets one.
        price_cents -> Nullable<Int8>,
        /// ISO-4217 code, upper-case.
        currency -> Varchar,
        is_published -> Bool,
        category_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered course chapters.
    chapters (id) {
        id -> Uuid,
        course_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        video_url -> Nullable<Text>,
        position -> Int4,
        is_published -> Bool,
        is_free -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Downloadable course resources.
    attachments (id) {
        id -> Uuid,
        course_id -> Uuid,
        name -> Varchar,
        url -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Authoritative enrollment ledger, unique on `(user_id, course_id)`.
    purchases (id) {
        id -> Uuid,
        user_id -> Uuid,
        course_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-chapter completion state, unique on `(user_id, chapter_id)`.
    user_progress (id) {
        id -> Uuid,
        user_id -> Uuid,
        chapter_id -> Uuid,
        is_completed -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Advisory payment log, unique on `(provider, reference)`.
    payment_records (id) {
        id -> Uuid,
        user_id -> Uuid,
        course_id -> Uuid,
        provider -> Varchar,
        reference -> Varchar,
        amount_cents -> Int8,
        currency -> Varchar,
        /// One of `pending`, `completed`, `failed` or `cancelled`.
        status -> Varchar,
        metadata -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(courses -> users (owner_id));
diesel::joinable!(courses -> categories (category_id));
diesel::joinable!(chapters -> courses (course_id));
diesel::joinable!(attachments -> courses (course_id));
diesel::joinable!(purchases -> courses (course_id));
diesel::joinable!(user_progress -> chapters (chapter_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    categories,
    courses,
    chapters,
    attachments,
    purchases,
    user_progress,
    payment_records,
);
