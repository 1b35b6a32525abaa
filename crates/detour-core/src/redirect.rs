use crate::error::Result;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Status code used for redirects created without an explicit one.
pub const DEFAULT_STATUS_CODE: u16 = 301;
/// Priority used for redirects created without an explicit one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Store-assigned identifier of a redirect record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectId(pub u64);

impl Display for RedirectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted redirect rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub id: RedirectId,
    /// Path requested by users and browsers.
    pub from_path: String,
    /// Destination path.
    pub to_path: String,
    pub status_code: u16,
    /// Whether the rule is currently enforced.
    pub is_active: bool,
    /// Lower value wins when several rules could apply.
    pub priority: i32,
    /// Free-text provenance. Machine annotations are appended, never replace it.
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Redirect {
    /// Returns `true` if following this rule would land on the same path.
    pub fn is_self_loop(&self) -> bool {
        self.from_path == self.to_path
    }
}

/// The projection served to the edge layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRedirect {
    pub from_path: String,
    pub to_path: String,
    pub status_code: u16,
}

impl From<Redirect> for ActiveRedirect {
    fn from(value: Redirect) -> Self {
        Self {
            from_path: value.from_path,
            to_path: value.to_path,
            status_code: value.status_code,
        }
    }
}

/// Data for a redirect that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRedirect {
    pub from_path: String,
    pub to_path: String,
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub description: String,
}

fn default_status_code() -> u16 {
    DEFAULT_STATUS_CODE
}

fn default_is_active() -> bool {
    true
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl NewRedirect {
    /// An active 301 redirect with the default priority.
    pub fn permanent(from_path: impl Into<String>, to_path: impl Into<String>) -> Self {
        Self {
            from_path: from_path.into(),
            to_path: to_path.into(),
            status_code: DEFAULT_STATUS_CODE,
            is_active: true,
            priority: DEFAULT_PRIORITY,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// A partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RedirectPatch {
    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the patch to a record in place. Timestamps are left to the store.
    pub fn apply_to(&self, redirect: &mut Redirect) {
        if let Some(from_path) = &self.from_path {
            redirect.from_path.clone_from(from_path);
        }
        if let Some(to_path) = &self.to_path {
            redirect.to_path.clone_from(to_path);
        }
        if let Some(status_code) = self.status_code {
            redirect.status_code = status_code;
        }
        if let Some(is_active) = self.is_active {
            redirect.is_active = is_active;
        }
        if let Some(priority) = self.priority {
            redirect.priority = priority;
        }
        if let Some(description) = &self.description {
            redirect.description.clone_from(description);
        }
    }
}

/// Conjunctive filter over redirect records. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectFilter {
    pub from_path: Option<String>,
    pub to_path: Option<String>,
    pub to_path_prefix: Option<String>,
    pub is_active: Option<bool>,
}

impl RedirectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only records currently enforced.
    pub fn active() -> Self {
        Self::new().with_active(true)
    }

    pub fn with_from_path(mut self, from_path: impl Into<String>) -> Self {
        self.from_path = Some(from_path.into());
        self
    }

    pub fn with_to_path(mut self, to_path: impl Into<String>) -> Self {
        self.to_path = Some(to_path.into());
        self
    }

    pub fn with_to_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.to_path_prefix = Some(prefix.into());
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Evaluates the filter against a record.
    ///
    /// In-memory backends use this directly; SQL backends translate the same
    /// fields into a `WHERE` clause.
    pub fn matches(&self, redirect: &Redirect) -> bool {
        self.from_path
            .as_ref()
            .is_none_or(|from| &redirect.from_path == from)
            && self
                .to_path
                .as_ref()
                .is_none_or(|to| &redirect.to_path == to)
            && self
                .to_path_prefix
                .as_ref()
                .is_none_or(|prefix| redirect.to_path.starts_with(prefix.as_str()))
            && self
                .is_active
                .is_none_or(|active| redirect.is_active == active)
    }
}

/// Ordering of `find_many` results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedirectSort {
    /// Insertion order.
    #[default]
    Id,
    /// Ascending priority, ties broken by id.
    PriorityAsc,
}

/// A read-only view of the redirect store.
#[async_trait]
pub trait ReadRedirectStore: Send + Sync + 'static {
    /// Retrieves a redirect by id. Returns `None` if it does not exist.
    async fn get(&self, id: RedirectId) -> Result<Option<Redirect>>;

    /// Returns the records matching `filter`, ordered by `sort`, at most `limit` of them.
    async fn find_many(
        &self,
        filter: &RedirectFilter,
        sort: RedirectSort,
        limit: Option<usize>,
    ) -> Result<Vec<Redirect>>;

    /// Counts the records matching `filter`.
    async fn count(&self, filter: &RedirectFilter) -> Result<u64>;
}

#[async_trait]
pub trait RedirectStore: ReadRedirectStore {
    /// Inserts a new record and returns it with its assigned id.
    async fn create(&self, data: NewRedirect) -> Result<Redirect>;

    /// Applies `patch` to an existing record.
    /// Returns `Err(NotFound)` if the id does not exist.
    async fn update(&self, id: RedirectId, patch: RedirectPatch) -> Result<Redirect>;

    /// Removes a record. Returns `true` if it existed.
    async fn delete(&self, id: RedirectId) -> Result<bool>;
}
