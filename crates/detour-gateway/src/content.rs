use crate::error::{AppError, Result};
use detour_core::{
    ContentItem, ContentRepository, ContentTypeRegistry, ContentTypeUid, EntityId, LifecycleBus,
    LifecycleEvent, ReadContentRepository,
};
use std::sync::Arc;
use tracing::debug;

/// A minimal content host.
///
/// Updates emit `beforeUpdate`, commit, then emit `afterUpdate` with the
/// committed item. Deletes commit, then emit `afterDelete`. Creating an item
/// emits nothing the engine acts on.
#[derive(Clone)]
pub struct ContentService {
    repository: Arc<dyn ContentRepository>,
    registry: Arc<ContentTypeRegistry>,
    bus: Arc<LifecycleBus>,
}

impl ContentService {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        registry: Arc<ContentTypeRegistry>,
        bus: Arc<LifecycleBus>,
    ) -> Self {
        Self {
            repository,
            registry,
            bus,
        }
    }

    fn known(&self, uid: &ContentTypeUid) -> Result<()> {
        match self.registry.get(uid) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("unknown content type {uid}"))),
        }
    }

    pub async fn get(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<ContentItem> {
        self.known(uid)?;
        self.repository
            .find(uid, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{uid} {id} not found")))
    }

    /// Creates the item or updates its slug.
    pub async fn put(
        &self,
        uid: &ContentTypeUid,
        id: EntityId,
        slug: Option<String>,
    ) -> Result<ContentItem> {
        self.known(uid)?;
        let item = ContentItem::new(id.clone(), slug);

        if self.repository.find(uid, &id).await?.is_none() {
            debug!(uid = %uid, id = %id, "creating content item");
            self.repository.upsert(uid, item.clone()).await?;
            self.bus
                .emit(&LifecycleEvent::after_create(uid.clone(), item.clone()))
                .await;
            return Ok(item);
        }

        self.bus
            .emit(&LifecycleEvent::before_update(uid.clone(), id.clone()))
            .await;
        self.repository.upsert(uid, item.clone()).await?;
        self.bus
            .emit(&LifecycleEvent::after_update(uid.clone(), id, item.clone()))
            .await;
        Ok(item)
    }

    pub async fn delete(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<ContentItem> {
        self.known(uid)?;
        let removed = self
            .repository
            .delete(uid, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{uid} {id} not found")))?;
        self.bus
            .emit(&LifecycleEvent::after_delete(uid.clone(), id.clone()))
            .await;
        Ok(removed)
    }
}
