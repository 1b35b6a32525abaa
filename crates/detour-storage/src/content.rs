use async_trait::async_trait;
use dashmap::DashMap;
use detour_core::{
    ContentItem, ContentRepository, ContentTypeUid, EntityId, ReadContentRepository, Result,
};

/// In-memory content storage keyed by `(content type, entity id)`.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    items: DashMap<(ContentTypeUid, EntityId), ContentItem>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadContentRepository for InMemoryContentRepository {
    async fn find(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<Option<ContentItem>> {
        let key = (uid.clone(), id.clone());
        Ok(self.items.get(&key).map(|entry| entry.value().clone()))
    }

    async fn count_by_slug(&self, uid: &ContentTypeUid, slug: &str) -> Result<u64> {
        let count = self
            .items
            .iter()
            .filter(|entry| &entry.key().0 == uid && entry.value().slug.as_deref() == Some(slug))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn upsert(&self, uid: &ContentTypeUid, item: ContentItem) -> Result<Option<ContentItem>> {
        let key = (uid.clone(), item.id.clone());
        Ok(self.items.insert(key, item))
    }

    async fn delete(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<Option<ContentItem>> {
        let key = (uid.clone(), id.clone());
        Ok(self.items.remove(&key).map(|(_, item)| item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> ContentTypeUid {
        ContentTypeUid::new("api::article.article")
    }

    fn item(id: u64, slug: &str) -> ContentItem {
        ContentItem::new(id, Some(slug.to_string()))
    }

    #[tokio::test]
    async fn upsert_returns_previous_version() {
        let repo = InMemoryContentRepository::new();

        assert!(repo.upsert(&article(), item(1, "one")).await.unwrap().is_none());
        let previous = repo.upsert(&article(), item(1, "uno")).await.unwrap();

        assert_eq!(previous, Some(item(1, "one")));
        assert_eq!(
            repo.find(&article(), &EntityId::from(1u64)).await.unwrap(),
            Some(item(1, "uno"))
        );
    }

    #[tokio::test]
    async fn count_by_slug_is_scoped_to_type() {
        let repo = InMemoryContentRepository::new();
        let category = ContentTypeUid::new("api::category.category");
        repo.upsert(&article(), item(1, "rust")).await.unwrap();
        repo.upsert(&category, item(1, "rust")).await.unwrap();
        repo.upsert(&article(), item(2, "go")).await.unwrap();

        assert_eq!(repo.count_by_slug(&article(), "rust").await.unwrap(), 1);
        assert_eq!(repo.count_by_slug(&article(), "zig").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_removes_item() {
        let repo = InMemoryContentRepository::new();
        repo.upsert(&article(), item(1, "one")).await.unwrap();

        let removed = repo.delete(&article(), &EntityId::from(1u64)).await.unwrap();
        assert_eq!(removed, Some(item(1, "one")));
        assert_eq!(repo.count_by_slug(&article(), "one").await.unwrap(), 0);
        assert!(repo
            .delete(&article(), &EntityId::from(1u64))
            .await
            .unwrap()
            .is_none());
    }
}
