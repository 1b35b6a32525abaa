use crate::Result;
use detour_core::{NewRedirect, Redirect, RedirectFilter, RedirectPatch, RedirectSort, RedirectStore};
use std::sync::Arc;
use tracing::info;

/// Appends a machine annotation to an existing description.
pub fn annotate(existing: &str, note: &str) -> String {
    if existing.is_empty() {
        note.to_string()
    } else {
        format!("{existing} ({note})")
    }
}

/// The engine's only access path to redirect persistence.
///
/// Queries are limited to active records; every write is logged.
#[derive(Debug)]
pub struct RedirectStoreAdapter<S> {
    store: Arc<S>,
}

impl<S> Clone for RedirectStoreAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RedirectStore> RedirectStoreAdapter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active redirects leaving `path`.
    pub async fn find_active_from(&self, path: &str) -> Result<Vec<Redirect>> {
        let filter = RedirectFilter::active().with_from_path(path);
        Ok(self.store.find_many(&filter, RedirectSort::Id, None).await?)
    }

    /// Active redirects landing on `path`.
    pub async fn find_active_to(&self, path: &str) -> Result<Vec<Redirect>> {
        let filter = RedirectFilter::active().with_to_path(path);
        Ok(self.store.find_many(&filter, RedirectSort::Id, None).await?)
    }

    /// Active redirects whose target lies under `prefix`.
    pub async fn find_active_under(&self, prefix: &str) -> Result<Vec<Redirect>> {
        let filter = RedirectFilter::active().with_to_path_prefix(prefix);
        Ok(self.store.find_many(&filter, RedirectSort::Id, None).await?)
    }

    pub async fn create(&self, data: NewRedirect) -> Result<Redirect> {
        let created = self.store.create(data).await?;
        info!(
            id = %created.id,
            from_path = %created.from_path,
            to_path = %created.to_path,
            "created redirect"
        );
        Ok(created)
    }

    pub async fn update(&self, redirect: &Redirect, patch: RedirectPatch) -> Result<Redirect> {
        let updated = self.store.update(redirect.id, patch).await?;
        info!(
            id = %updated.id,
            from_path = %updated.from_path,
            to_path = %updated.to_path,
            previous_from = %redirect.from_path,
            previous_to = %redirect.to_path,
            "updated redirect"
        );
        Ok(updated)
    }

    /// Switches the redirect off and records why. The row is kept.
    pub async fn deactivate(&self, redirect: &Redirect, reason: &str) -> Result<Redirect> {
        let patch = RedirectPatch {
            is_active: Some(false),
            description: Some(annotate(&redirect.description, reason)),
            ..Default::default()
        };
        let updated = self.store.update(redirect.id, patch).await?;
        info!(
            id = %updated.id,
            from_path = %updated.from_path,
            to_path = %updated.to_path,
            reason = %reason,
            "deactivated redirect"
        );
        Ok(updated)
    }
}
