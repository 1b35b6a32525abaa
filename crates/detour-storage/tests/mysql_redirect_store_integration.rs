use detour_core::{
    ContentItem, ContentTypeUid, EntityId, GlobalSettings, NewRedirect, RedirectFilter,
    RedirectPatch, RedirectSort,
};
use detour_storage::{
    ContentRepository, MySqlContentRepository, MySqlRedirectStore, MySqlSettings,
    ReadContentRepository, ReadRedirectStore, RedirectStore, SettingsSource, SettingsStore,
    StorageError,
};
use sqlx::MySqlPool;
use detour_test_infra::mysql::{MySqlServer, MysqlConfig};

struct Fixture {
    _mysql: MySqlServer,
    pool: MySqlPool,
    store: MySqlRedirectStore,
    settings: MySqlSettings,
    content: MySqlContentRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let pool = mysql.pool().await.expect("connect mysql");

        let store = MySqlRedirectStore::new(pool.clone());
        store.ensure_schema().await.expect("create redirects schema");
        let settings = MySqlSettings::new(pool.clone());
        settings
            .ensure_schema()
            .await
            .expect("create settings schema");
        let content = MySqlContentRepository::new(pool.clone());
        content.ensure_schema().await.expect("create content schema");

        Self {
            _mysql: mysql,
            pool,
            store,
            settings,
            content,
        }
    }
}

#[tokio::test]
async fn create_and_get_redirect() {
    let fixture = Fixture::start().await;

    let created = fixture
        .store
        .create(NewRedirect::permanent("/articles/old", "/articles/new").with_description("seed"))
        .await
        .unwrap();

    let got = fixture.store.get(created.id).await.unwrap().unwrap();
    assert_eq!(got, created);
    assert_eq!(got.status_code, 301);
    assert_eq!(got.priority, 100);
    assert!(got.is_active);
}

#[tokio::test]
async fn find_many_filters_by_prefix_and_activity() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    store
        .create(NewRedirect::permanent("/a", "/articles/one").with_priority(5))
        .await
        .unwrap();
    store
        .create(NewRedirect::permanent("/b", "/articles/two").with_priority(1))
        .await
        .unwrap();
    store
        .create(NewRedirect::permanent("/c", "/articles_x/three"))
        .await
        .unwrap();
    store
        .create(NewRedirect::permanent("/d", "/articles/four").with_active(false))
        .await
        .unwrap();

    let filter = RedirectFilter::active().with_to_path_prefix("/articles/");
    let found = store
        .find_many(&filter, RedirectSort::PriorityAsc, None)
        .await
        .unwrap();

    let froms: Vec<_> = found.iter().map(|r| r.from_path.as_str()).collect();
    assert_eq!(froms, vec!["/b", "/a"]);
    assert_eq!(store.count(&filter).await.unwrap(), 2);
}

#[tokio::test]
async fn update_applies_partial_patch() {
    let fixture = Fixture::start().await;
    let created = fixture
        .store
        .create(NewRedirect::permanent("/a", "/b"))
        .await
        .unwrap();

    let updated = fixture
        .store
        .update(
            created.id,
            RedirectPatch {
                is_active: Some(false),
                description: Some("retired".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!updated.is_active);
    assert_eq!(updated.description, "retired");
    assert_eq!(updated.to_path, "/b");
}

#[tokio::test]
async fn update_missing_record_is_not_found() {
    let fixture = Fixture::start().await;

    let err = fixture
        .store
        .update(detour_core::RedirectId(999), RedirectPatch::default())
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn delete_removes_record() {
    let fixture = Fixture::start().await;
    let created = fixture
        .store
        .create(NewRedirect::permanent("/a", "/b"))
        .await
        .unwrap();

    assert!(fixture.store.delete(created.id).await.unwrap());
    assert!(fixture.store.get(created.id).await.unwrap().is_none());
    assert!(!fixture.store.delete(created.id).await.unwrap());
}

#[tokio::test]
async fn settings_round_trip_through_singleton_row() {
    let fixture = Fixture::start().await;

    assert!(fixture.settings.load().await.unwrap().is_none());

    let settings = GlobalSettings::default().with_mapping("article", "blog");
    fixture.settings.save(&settings).await.unwrap();
    fixture.settings.save(&settings).await.unwrap();

    assert_eq!(fixture.settings.load().await.unwrap(), Some(settings));
}

#[tokio::test]
async fn path_comparisons_are_case_sensitive() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;
    store
        .create(NewRedirect::permanent("/articles/A", "/Articles/B"))
        .await
        .unwrap();

    let lower_from = RedirectFilter::active().with_from_path("/articles/a");
    let lower_to = RedirectFilter::active().with_to_path("/articles/b");
    let lower_prefix = RedirectFilter::active().with_to_path_prefix("/articles/");
    assert_eq!(store.count(&lower_from).await.unwrap(), 0);
    assert_eq!(store.count(&lower_to).await.unwrap(), 0);
    assert_eq!(store.count(&lower_prefix).await.unwrap(), 0);

    let exact = RedirectFilter::active()
        .with_from_path("/articles/A")
        .with_to_path_prefix("/Articles/");
    assert_eq!(store.count(&exact).await.unwrap(), 1);
}

fn article() -> ContentTypeUid {
    ContentTypeUid::new("api::article.article")
}

#[tokio::test]
async fn content_upsert_and_delete_return_previous_versions() {
    let fixture = Fixture::start().await;
    let content = &fixture.content;
    let id = EntityId::from(1u64);

    let first = ContentItem::new(1u64, Some("hello".to_string()));
    assert!(content.upsert(&article(), first.clone()).await.unwrap().is_none());
    let previous = content
        .upsert(&article(), ContentItem::new(1u64, Some("Hello".to_string())))
        .await
        .unwrap();
    assert_eq!(previous, Some(first));

    assert_eq!(content.count_by_slug(&article(), "hello").await.unwrap(), 0);
    assert_eq!(content.count_by_slug(&article(), "Hello").await.unwrap(), 1);

    let removed = content.delete(&article(), &id).await.unwrap();
    assert_eq!(removed.and_then(|item| item.slug).as_deref(), Some("Hello"));
    assert!(content.delete(&article(), &id).await.unwrap().is_none());
    assert!(content.find(&article(), &id).await.unwrap().is_none());
}

#[tokio::test]
async fn content_survives_a_new_repository_on_the_same_database() {
    let fixture = Fixture::start().await;
    fixture
        .content
        .upsert(&article(), ContentItem::new(7u64, Some("kept".to_string())))
        .await
        .unwrap();
    fixture
        .content
        .upsert(
            &ContentTypeUid::new("api::category.category"),
            ContentItem::new(7u64, Some("kept".to_string())),
        )
        .await
        .unwrap();

    let restarted = MySqlContentRepository::new(fixture.pool.clone());
    restarted.ensure_schema().await.unwrap();

    assert_eq!(restarted.count_by_slug(&article(), "kept").await.unwrap(), 1);
    assert_eq!(
        restarted
            .find(&article(), &EntityId::from(7u64))
            .await
            .unwrap()
            .and_then(|item| item.slug)
            .as_deref(),
        Some("kept")
    );
}
