use async_trait::async_trait;
use detour_core::content::{AttributeSchema, SchemaInfo};
use detour_core::{
    ContentItem, ContentTypeRegistry, ContentTypeSchema, ContentTypeUid, EntityId, NewRedirect,
    ReadContentRepository, ReadRedirectStore, Redirect, RedirectFilter, RedirectId, RedirectPatch,
    RedirectSort, RedirectStore, Result, StorageError,
};
use detour_storage::InMemoryRedirectStore;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn article() -> ContentTypeUid {
    ContentTypeUid::new("api::article.article")
}

pub fn category() -> ContentTypeUid {
    ContentTypeUid::new("api::category.category")
}

fn schema(uid: &str, display: &str, plural: &str, slug: bool) -> ContentTypeSchema {
    let mut attributes = BTreeMap::new();
    if slug {
        attributes.insert(
            "slug".to_string(),
            AttributeSchema {
                kind: "uid".to_string(),
            },
        );
    }
    ContentTypeSchema {
        uid: uid.to_string(),
        info: SchemaInfo {
            display_name: Some(display.to_string()),
            plural_name: Some(plural.to_string()),
        },
        attributes,
    }
}

pub fn registry() -> ContentTypeRegistry {
    ContentTypeRegistry::from_schemas([
        schema("api::article.article", "Article", "articles", true),
        schema("api::category.category", "Category", "categories", true),
        schema("api::author.author", "Author", "authors", false),
        schema("plugin::i18n.locale", "Locale", "locales", true),
    ])
    .expect("valid test registry")
}

/// Active `(from, to)` pairs in id order.
pub fn active_pairs(store: &InMemoryRedirectStore) -> Vec<(String, String)> {
    store
        .snapshot()
        .into_iter()
        .filter(|r| r.is_active)
        .map(|r| (r.from_path, r.to_path))
        .collect()
}

/// A redirect store that counts writes and can be told to fail them.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub inner: InMemoryRedirectStore,
    writes: AtomicUsize,
    reads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("write rejected".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ReadRedirectStore for RecordingStore {
    async fn get(&self, id: RedirectId) -> Result<Option<Redirect>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn find_many(
        &self,
        filter: &RedirectFilter,
        sort: RedirectSort,
        limit: Option<usize>,
    ) -> Result<Vec<Redirect>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_many(filter, sort, limit).await
    }

    async fn count(&self, filter: &RedirectFilter) -> Result<u64> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.count(filter).await
    }
}

#[async_trait]
impl RedirectStore for RecordingStore {
    async fn create(&self, data: NewRedirect) -> Result<Redirect> {
        self.write_guard()?;
        self.inner.create(data).await
    }

    async fn update(&self, id: RedirectId, patch: RedirectPatch) -> Result<Redirect> {
        self.write_guard()?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: RedirectId) -> Result<bool> {
        self.write_guard()?;
        self.inner.delete(id).await
    }
}

/// A content repository whose reads always fail.
#[derive(Debug, Default)]
pub struct UnreachableContent;

#[async_trait]
impl ReadContentRepository for UnreachableContent {
    async fn find(&self, _uid: &ContentTypeUid, _id: &EntityId) -> Result<Option<ContentItem>> {
        Err(StorageError::Unavailable("content store offline".to_string()))
    }

    async fn count_by_slug(&self, _uid: &ContentTypeUid, _slug: &str) -> Result<u64> {
        Err(StorageError::Unavailable("content store offline".to_string()))
    }
}
