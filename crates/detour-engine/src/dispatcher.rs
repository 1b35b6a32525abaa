use crate::adapter::RedirectStoreAdapter;
use crate::path::PathMapper;
use crate::resolver::Resolver;
use crate::sweeper::OrphanSweeper;
use crate::tracker::{SlugTracker, TrackerConfig};
use crate::EngineError;
use async_trait::async_trait;
use detour_core::{
    ContentTypeRegistry, ContentTypeUid, EntityId, LifecycleAction, LifecycleEvent,
    LifecycleSubscriber, ReadContentRepository, RedirectStore, SettingsSource,
};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Routes content lifecycle events to the tracker, resolver and sweeper.
///
/// Only content types that participate (a uid-kind slug and a non-internal
/// namespace) are handled. Failures are logged here and never reach the
/// mutation that raised the event.
pub struct EventDispatcher<S, C, G> {
    registry: Arc<ContentTypeRegistry>,
    tracker: SlugTracker<C>,
    resolver: Resolver<S, G>,
    sweeper: OrphanSweeper<S, C, G>,
}

impl<S, C, G> EventDispatcher<S, C, G>
where
    S: RedirectStore,
    C: ReadContentRepository,
    G: SettingsSource,
{
    pub fn new(
        registry: Arc<ContentTypeRegistry>,
        store: Arc<S>,
        content: Arc<C>,
        settings: Arc<G>,
        config: TrackerConfig,
    ) -> Self {
        let adapter = RedirectStoreAdapter::new(store);
        let mapper = PathMapper::new(Arc::clone(&registry));
        Self {
            tracker: SlugTracker::new(Arc::clone(&content), config),
            resolver: Resolver::new(adapter.clone(), Arc::clone(&settings), mapper.clone()),
            sweeper: OrphanSweeper::new(adapter, content, settings, mapper),
            registry,
        }
    }

    pub fn registry(&self) -> &ContentTypeRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &Resolver<S, G> {
        &self.resolver
    }

    pub fn sweeper(&self) -> &OrphanSweeper<S, C, G> {
        &self.sweeper
    }

    /// Handles one event. Never fails.
    pub async fn dispatch(&self, event: &LifecycleEvent) {
        if self.registry.tracked(&event.uid).is_none() {
            trace!(uid = %event.uid, action = %event.action, "ignoring untracked content type");
            return;
        }

        match event.action {
            LifecycleAction::BeforeUpdate => {
                if let Some(id) = &event.entity_id {
                    self.tracker.record_old_slug(&event.uid, id).await;
                }
            }
            LifecycleAction::AfterUpdate => {
                if let Some(id) = event.target_id() {
                    self.after_update(&event.uid, id, event).await;
                }
            }
            LifecycleAction::AfterDelete => self.after_delete(&event.uid).await,
            _ => trace!(uid = %event.uid, action = %event.action, "no handler for action"),
        }
    }

    async fn after_update(&self, uid: &ContentTypeUid, id: &EntityId, event: &LifecycleEvent) {
        let Some(old_slug) = self.tracker.take_old_slug(uid, id).await else {
            debug!(uid = %uid, id = %id, "no recorded slug, skipping redirect maintenance");
            return;
        };
        let Some(new_slug) = event
            .result
            .as_ref()
            .and_then(|item| item.slug.as_deref())
            .filter(|slug| !slug.is_empty())
        else {
            debug!(uid = %uid, id = %id, "updated entity has no slug");
            return;
        };

        if let Err(e) = self.resolver.reconcile(uid, &old_slug, new_slug).await {
            log_failure(uid, "reconcile slug change", &e);
        }
    }

    async fn after_delete(&self, uid: &ContentTypeUid) {
        if let Err(e) = self.sweeper.sweep_orphans(uid).await {
            log_failure(uid, "sweep orphan redirects", &e);
        }
    }
}

fn log_failure(uid: &ContentTypeUid, operation: &str, err: &EngineError) {
    match err {
        EngineError::Path(e) => warn!(uid = %uid, error = %e, "could not {operation}"),
        EngineError::Storage(e) => error!(uid = %uid, error = %e, "failed to {operation}"),
    }
}

#[async_trait]
impl<S, C, G> LifecycleSubscriber for EventDispatcher<S, C, G>
where
    S: RedirectStore,
    C: ReadContentRepository,
    G: SettingsSource,
{
    async fn on_event(&self, event: &LifecycleEvent) {
        self.dispatch(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{active_pairs, article, category, registry, RecordingStore};
    use detour_core::{ContentItem, ContentRepository, LifecycleBus, NewRedirect};
    use detour_storage::{InMemoryContentRepository, InMemorySettings};

    struct Harness {
        store: Arc<RecordingStore>,
        content: Arc<InMemoryContentRepository>,
        bus: LifecycleBus,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(RecordingStore::new());
            let content = Arc::new(InMemoryContentRepository::new());
            let dispatcher = EventDispatcher::new(
                Arc::new(registry()),
                Arc::clone(&store),
                Arc::clone(&content),
                Arc::new(InMemorySettings::new()),
                TrackerConfig::default(),
            );
            let mut bus = LifecycleBus::new();
            bus.subscribe(Arc::new(dispatcher));
            Self {
                store,
                content,
                bus,
            }
        }

        /// Runs an update the way a content host does: before, write, after.
        async fn update(&self, uid: ContentTypeUid, id: u64, slug: Option<&str>) {
            let item = ContentItem::new(id, slug.map(str::to_string));
            self.bus
                .emit(&LifecycleEvent::before_update(uid.clone(), EntityId::from(id)))
                .await;
            self.content.upsert(&uid, item.clone()).await.unwrap();
            self.bus
                .emit(&LifecycleEvent::after_update(uid, EntityId::from(id), item))
                .await;
        }

        async fn delete(&self, uid: ContentTypeUid, id: u64) {
            self.content.delete(&uid, &EntityId::from(id)).await.unwrap();
            self.bus
                .emit(&LifecycleEvent::after_delete(uid, EntityId::from(id)))
                .await;
        }

        async fn seed_content(&self, uid: &ContentTypeUid, id: u64, slug: &str) {
            self.content
                .upsert(uid, ContentItem::new(id, Some(slug.to_string())))
                .await
                .unwrap();
        }

        fn pairs(&self) -> Vec<(String, String)> {
            active_pairs(&self.store.inner)
        }
    }

    fn pair(from: &str, to: &str) -> (String, String) {
        (from.to_string(), to.to_string())
    }

    #[tokio::test]
    async fn slug_change_creates_redirect_through_the_bus() {
        let harness = Harness::new();
        harness.seed_content(&article(), 1, "hello").await;

        harness.update(article(), 1, Some("hello-world")).await;

        assert_eq!(
            harness.pairs(),
            vec![pair("/articles/hello", "/articles/hello-world")]
        );
    }

    #[tokio::test]
    async fn unchanged_slug_writes_nothing() {
        let harness = Harness::new();
        harness.seed_content(&article(), 1, "hello").await;

        harness.update(article(), 1, Some("hello")).await;

        assert_eq!(harness.store.writes(), 0);
    }

    #[tokio::test]
    async fn untracked_types_are_ignored() {
        let harness = Harness::new();
        let author = ContentTypeUid::new("api::author.author");
        let locale = ContentTypeUid::new("plugin::i18n.locale");
        harness.seed_content(&author, 1, "a").await;
        harness.seed_content(&locale, 1, "en").await;

        harness.update(author, 1, Some("b")).await;
        harness.update(locale, 1, Some("fr")).await;

        assert_eq!(harness.store.writes(), 0);
        assert_eq!(harness.store.reads(), 0);
    }

    #[tokio::test]
    async fn after_update_without_before_update_does_nothing() {
        let harness = Harness::new();
        let item = ContentItem::new(1u64, Some("new".to_string()));

        harness
            .bus
            .emit(&LifecycleEvent::after_update(article(), EntityId::from(1u64), item))
            .await;

        assert_eq!(harness.store.reads(), 0);
        assert!(harness.pairs().is_empty());
    }

    #[tokio::test]
    async fn clearing_the_slug_skips_maintenance() {
        let harness = Harness::new();
        harness.seed_content(&article(), 1, "hello").await;

        harness.update(article(), 1, None).await;

        assert_eq!(harness.store.writes(), 0);
    }

    #[tokio::test]
    async fn types_are_tracked_independently() {
        let harness = Harness::new();
        harness.seed_content(&article(), 1, "same").await;
        harness.seed_content(&category(), 1, "same").await;

        harness.update(category(), 1, Some("renamed")).await;

        assert_eq!(
            harness.pairs(),
            vec![pair("/categories/same", "/categories/renamed")]
        );
    }

    #[tokio::test]
    async fn delete_sweeps_orphans() {
        let harness = Harness::new();
        harness.seed_content(&article(), 1, "hello").await;
        harness.update(article(), 1, Some("hello-world")).await;

        harness.delete(article(), 1).await;

        assert!(harness.pairs().is_empty());
        let all = harness.store.inner.snapshot();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].to_path, "/articles/hello-world");
    }

    #[tokio::test]
    async fn store_failures_do_not_escape() {
        let harness = Harness::new();
        harness
            .store
            .inner
            .create(NewRedirect::permanent("/x", "/articles/gone"))
            .await
            .unwrap();
        harness.seed_content(&article(), 1, "hello").await;
        harness.store.fail_writes(true);

        harness.update(article(), 1, Some("bye")).await;
        harness.delete(article(), 1).await;

        assert_eq!(harness.pairs(), vec![pair("/x", "/articles/gone")]);
    }
}
