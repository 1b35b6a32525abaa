mod cli;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use detour_core::content::{AttributeSchema, SchemaInfo};
use detour_core::{
    ContentRepository, ContentTypeRegistry, ContentTypeSchema, RedirectStore, SettingsStore,
};
use detour_engine::TrackerConfig;
use detour_gateway::App;
use detour_storage::{
    InMemoryContentRepository, InMemoryRedirectStore, InMemorySettings, MySqlContentRepository,
    MySqlRedirectStore, MySqlSettings,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    detour_telemetry::init(config.log_format.into())?;

    let registry = Arc::new(load_registry(&config).await?);
    let tracker = TrackerConfig::builder()
        .max_capacity(config.slug_cache_capacity)
        .ttl(Duration::from_secs(config.slug_cache_ttl_secs))
        .build();

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        content_types = registry.len(),
        "starting gateway server"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run_server(
                config.listen_addr,
                registry,
                InMemoryRedirectStore::new(),
                InMemoryContentRepository::new(),
                InMemorySettings::new(),
                tracker,
            )
            .await
        }
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlRedirectStore::connect(&dsn).await?;
            store.ensure_schema().await?;
            let settings = MySqlSettings::new(store.pool().clone());
            settings.ensure_schema().await?;
            let content = MySqlContentRepository::new(store.pool().clone());
            content.ensure_schema().await?;
            run_server(
                config.listen_addr,
                registry,
                store,
                content,
                settings,
                tracker,
            )
            .await
        }
    }
}

async fn run_server<S: RedirectStore, C: ContentRepository, G: SettingsStore>(
    listen_addr: SocketAddr,
    registry: Arc<ContentTypeRegistry>,
    store: S,
    content: C,
    settings: G,
    tracker: TrackerConfig,
) -> anyhow::Result<()> {
    let state = App::state(
        registry,
        Arc::new(store),
        Arc::new(content),
        Arc::new(settings),
        tracker,
    );

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");
    axum::serve(listener, App::router(state)).await?;
    Ok(())
}

async fn load_registry(config: &CLI) -> anyhow::Result<ContentTypeRegistry> {
    let schemas = match &config.content_types {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<Vec<ContentTypeSchema>>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => default_schemas(),
    };
    Ok(ContentTypeRegistry::from_schemas(schemas)?)
}

fn default_schemas() -> Vec<ContentTypeSchema> {
    let schema = |uid: &str, display: &str, plural: &str, slug: bool| {
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
    };

    vec![
        schema("api::article.article", "Article", "articles", true),
        schema("api::category.category", "Category", "categories", true),
        schema("api::author.author", "Author", "authors", false),
    ]
}
