use crate::content::ContentService;
use crate::handlers::{
    active_redirects_handler, bulk_import_handler, create_redirect_handler,
    delete_content_handler, delete_redirect_handler, get_content_handler, get_global_handler,
    get_redirect_handler, health_handler, list_redirects_handler, put_content_handler,
    put_global_handler, update_redirect_handler,
};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use detour_core::{ContentRepository, ContentTypeRegistry, LifecycleBus, RedirectStore, SettingsStore};
use detour_engine::{EventDispatcher, TrackerConfig};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct App {}

impl App {
    /// Wires the engine to the content host and builds the shared state.
    ///
    /// The dispatcher is subscribed exactly once, here.
    pub fn state<S, C, G>(
        registry: Arc<ContentTypeRegistry>,
        store: Arc<S>,
        content: Arc<C>,
        settings: Arc<G>,
        tracker: TrackerConfig,
    ) -> AppState
    where
        S: RedirectStore,
        C: ContentRepository,
        G: SettingsStore,
    {
        let dispatcher = EventDispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            Arc::clone(&content),
            Arc::clone(&settings),
            tracker,
        );
        let mut bus = LifecycleBus::new();
        bus.subscribe(Arc::new(dispatcher));

        let content = ContentService::new(content, registry, Arc::new(bus));
        AppState::new(store, settings, content)
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest(
                "/api/redirects",
                Router::new()
                    .route(
                        "/",
                        get(list_redirects_handler).post(create_redirect_handler),
                    )
                    .route("/active", get(active_redirects_handler))
                    .route("/bulk-import", post(bulk_import_handler))
                    .route(
                        "/{id}",
                        get(get_redirect_handler)
                            .put(update_redirect_handler)
                            .delete(delete_redirect_handler),
                    ),
            )
            .route(
                "/api/global",
                get(get_global_handler).put(put_global_handler),
            )
            .route(
                "/api/content/{uid}/{id}",
                get(get_content_handler)
                    .put(put_content_handler)
                    .delete(delete_content_handler),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
