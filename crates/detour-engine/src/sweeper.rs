use crate::adapter::RedirectStoreAdapter;
use crate::path::{load_settings, slug_from_path, PathMapper};
use crate::Result;
use detour_core::{ContentTypeUid, ReadContentRepository, Redirect, RedirectStore, SettingsSource};
use std::sync::Arc;
use tracing::{debug, error, info};

const DEACTIVATION_NOTE: &str = "Deactivated: target content deleted";

/// Result of one sweep over a content type's redirects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Active redirects under the type's prefix that were inspected.
    pub scanned: usize,
    pub deactivated: Vec<Redirect>,
    /// Orphans whose deactivation failed.
    pub failed: usize,
}

/// Retires redirects whose target content no longer exists.
///
/// Orphans are deactivated and annotated, never deleted.
pub struct OrphanSweeper<S, C, G> {
    adapter: RedirectStoreAdapter<S>,
    content: Arc<C>,
    settings: Arc<G>,
    mapper: PathMapper,
}

impl<S, C, G> OrphanSweeper<S, C, G>
where
    S: RedirectStore,
    C: ReadContentRepository,
    G: SettingsSource,
{
    pub fn new(
        adapter: RedirectStoreAdapter<S>,
        content: Arc<C>,
        settings: Arc<G>,
        mapper: PathMapper,
    ) -> Self {
        Self {
            adapter,
            content,
            settings,
            mapper,
        }
    }

    /// Deactivates every active redirect of type `uid` whose target slug has
    /// no live content item.
    ///
    /// A failed existence check leaves that redirect alone; a failed
    /// deactivation is counted and the sweep moves on.
    pub async fn sweep_orphans(&self, uid: &ContentTypeUid) -> Result<SweepReport> {
        let settings = load_settings(self.settings.as_ref()).await;
        let prefix = self.mapper.path_prefix(&settings, uid)?;
        let candidates = self.adapter.find_active_under(&prefix).await?;

        let mut report = SweepReport {
            scanned: candidates.len(),
            ..Default::default()
        };

        for redirect in candidates {
            let Some(slug) = slug_from_path(&prefix, &redirect.to_path) else {
                continue;
            };
            match self.content.count_by_slug(uid, slug).await {
                Ok(0) => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!(uid = %uid, slug = %slug, error = %e, "could not check target content");
                    continue;
                }
            }

            match self.adapter.deactivate(&redirect, DEACTIVATION_NOTE).await {
                Ok(updated) => report.deactivated.push(updated),
                Err(e) => {
                    error!(id = %redirect.id, error = %e, "failed to deactivate orphan redirect");
                    report.failed += 1;
                }
            }
        }

        if !report.deactivated.is_empty() {
            info!(
                uid = %uid,
                scanned = report.scanned,
                deactivated = report.deactivated.len(),
                "swept orphan redirects"
            );
        }
        Ok(report)
    }
}
