use detour_core::{ContentTypeUid, EntityId, ReadContentRepository};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Bounds of the pending old-slug cache.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct TrackerConfig {
    /// Maximum number of in-flight updates remembered at once.
    #[builder(default = DEFAULT_MAX_CAPACITY)]
    pub max_capacity: u64,
    /// How long an old slug waits for its `afterUpdate` before it is dropped.
    #[builder(default = DEFAULT_TTL)]
    pub ttl: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SlugKey {
    uid: ContentTypeUid,
    id: EntityId,
}

impl SlugKey {
    fn new(uid: &ContentTypeUid, id: &EntityId) -> Self {
        Self {
            uid: uid.clone(),
            id: id.clone(),
        }
    }
}

/// Remembers the slug an entity had before an update commits.
///
/// Entries are keyed per `(content type, entity)`, consumed exactly once by
/// [`take_old_slug`](Self::take_old_slug), and otherwise evicted by capacity
/// or TTL so an update that never completes cannot grow the cache.
pub struct SlugTracker<C> {
    content: Arc<C>,
    pending: Cache<SlugKey, String>,
}

impl<C: ReadContentRepository> SlugTracker<C> {
    pub fn new(content: Arc<C>, config: TrackerConfig) -> Self {
        let pending = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();
        Self { content, pending }
    }

    /// Looks up the persisted slug of the entity and caches it.
    ///
    /// A failed or empty lookup caches nothing; the matching `afterUpdate`
    /// then finds no old slug and skips redirect maintenance.
    pub async fn record_old_slug(&self, uid: &ContentTypeUid, id: &EntityId) {
        match self.content.find(uid, id).await {
            Ok(Some(item)) => match item.slug.filter(|slug| !slug.is_empty()) {
                Some(slug) => {
                    trace!(uid = %uid, id = %id, slug = %slug, "recorded old slug");
                    self.pending.insert(SlugKey::new(uid, id), slug).await;
                }
                None => trace!(uid = %uid, id = %id, "entity has no slug"),
            },
            Ok(None) => debug!(uid = %uid, id = %id, "entity not found before update"),
            Err(e) => debug!(uid = %uid, id = %id, error = %e, "could not fetch old slug"),
        }
    }

    /// Returns and forgets the slug recorded for the entity, if any.
    ///
    /// `Cache::remove` hands back entries past their TTL, so the value comes
    /// from `get`, which honours expiry.
    pub async fn take_old_slug(&self, uid: &ContentTypeUid, id: &EntityId) -> Option<String> {
        let key = SlugKey::new(uid, id);
        let slug = self.pending.get(&key).await;
        self.pending.invalidate(&key).await;
        slug
    }
}
