use crate::content::ContentService;
use detour_core::{RedirectStore, SettingsStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    redirects: Arc<dyn RedirectStore>,
    settings: Arc<dyn SettingsStore>,
    content: ContentService,
}

impl AppState {
    pub fn new(
        redirects: Arc<dyn RedirectStore>,
        settings: Arc<dyn SettingsStore>,
        content: ContentService,
    ) -> Self {
        Self {
            redirects,
            settings,
            content,
        }
    }

    pub fn redirects(&self) -> &dyn RedirectStore {
        self.redirects.as_ref()
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }
}
