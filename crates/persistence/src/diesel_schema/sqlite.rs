// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` schema (`migrations/`).

diesel::table! {
    users (id) {
        id -> Text,
        username -> Text,
        name -> Text,
        email -> Text,
        role -> Text,
        password_hash -> Text,
        is_active -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    routes (id) {
        id -> Text,
        slug -> Text,
        title -> Text,
        status -> BigInt,
        author_id -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    datatypes (id) {
        id -> Text,
        parent_id -> Nullable<Text>,
        label -> Text,
        kind -> Text,
        author_id -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    fields (id) {
        id -> Text,
        datatype_id -> Text,
        label -> Text,
        kind -> Text,
        data -> Text,
        sort_order -> BigInt,
        author_id -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    content_data (id) {
        id -> Text,
        route_id -> Text,
        datatype_id -> Text,
        parent_id -> Nullable<Text>,
        first_child_id -> Nullable<Text>,
        next_sibling_id -> Nullable<Text>,
        prev_sibling_id -> Nullable<Text>,
        status -> BigInt,
        author_id -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    media (id) {
        id -> Text,
        name -> Text,
        display_name -> Nullable<Text>,
        mimetype -> Text,
        url -> Text,
        size -> Nullable<BigInt>,
        width -> Nullable<BigInt>,
        height -> Nullable<BigInt>,
        author_id -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    change_events (event_id) {
        event_id -> Text,
        table_name -> Text,
        operation -> Text,
        record_id -> Text,
        before_value -> Nullable<Text>,
        after_value -> Nullable<Text>,
        node_id -> Text,
        user_id -> Nullable<Text>,
        request_id -> Text,
        ip -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(content_data -> routes (route_id));
diesel::joinable!(fields -> datatypes (datatype_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    routes,
    datatypes,
    fields,
    content_data,
    media,
    change_events,
);
