use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The global settings singleton of the content host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Frontend path segment per content type name, e.g. `article -> blog`.
    #[serde(default)]
    pub redirect_url_mappings: BTreeMap<String, String>,
}

impl GlobalSettings {
    pub fn with_mapping(mut self, type_name: impl Into<String>, segment: impl Into<String>) -> Self {
        self.redirect_url_mappings
            .insert(type_name.into(), segment.into());
        self
    }

    /// Returns the override for `type_name`, if one is configured.
    pub fn path_override(&self, type_name: &str) -> Option<&str> {
        self.redirect_url_mappings
            .get(type_name)
            .map(String::as_str)
    }
}

/// Source of the current [`GlobalSettings`] snapshot.
#[async_trait]
pub trait SettingsSource: Send + Sync + 'static {
    /// Loads the settings. Returns `Ok(None)` when the singleton was never saved.
    async fn load(&self) -> Result<Option<GlobalSettings>>;
}

/// A [`SettingsSource`] that can also be written, as the admin API does.
#[async_trait]
pub trait SettingsStore: SettingsSource {
    /// Replaces the singleton. The next `load` sees the new value.
    async fn save(&self, settings: &GlobalSettings) -> Result<()>;
}
