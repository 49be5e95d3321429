pub mod pagination;
pub mod project;
pub mod stats;
pub mod task;
pub mod user;

pub use pagination::Pagination;
pub use project::{NewProject, Project, ProjectDetail, ProjectInput, ProjectPatch, ProjectSummary};
pub use stats::{PriorityCount, ProjectStats, StatusCount, TaskStats};
pub use task::{
    NewTask, SortOrder, Task, TaskInput, TaskPage, TaskPatch, TaskPriority, TaskQuery,
    TaskSortField, TaskStatus,
};
pub use user::{NewUser, User, UserRecord};

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use validator::ValidationError;

lazy_static! {
    /// `#RRGGBB` display colour.
    pub(crate) static ref COLOR_REGEX: regex::Regex =
        regex::Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("colour pattern is valid");
}

/// Lets PATCH bodies tell an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use together with `#[serde(default)]`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub(crate) fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

