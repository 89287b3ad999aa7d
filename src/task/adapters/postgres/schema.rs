//! Diesel schema for task storage.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Serial task identifier.
        id -> Int4,
        /// Epoch seconds at insertion, set by a column default.
        opened -> Nullable<Int8>,
        /// Epoch seconds at closing; `NULL` or `0` while open.
        closed -> Nullable<Int8>,
        /// Author user identifier; `NULL` or `0` when unknown.
        author_id -> Nullable<Int4>,
        /// Assignee user identifier; `NULL` or `0` when unassigned.
        assigned_id -> Nullable<Int4>,
        /// Task title.
        title -> Nullable<Text>,
        /// Task body.
        content -> Nullable<Text>,
    }
}

diesel::table! {
    /// Many-to-many association between tasks and labels.
    tasks_labels (task_id, label_id) {
        /// Associated task.
        task_id -> Int4,
        /// Associated label.
        label_id -> Int4,
    }
}

diesel::joinable!(tasks_labels -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, tasks_labels);
