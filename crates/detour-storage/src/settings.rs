use async_trait::async_trait;
use detour_core::{GlobalSettings, Result, SettingsSource, SettingsStore};
use parking_lot::RwLock;

/// Process-local global settings that can be replaced at runtime.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    current: RwLock<Option<GlobalSettings>>,
}

impl InMemorySettings {
    /// Settings that were never saved; readers fall back to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: GlobalSettings) -> Self {
        Self {
            current: RwLock::new(Some(settings)),
        }
    }

    /// Replaces the singleton.
    pub fn replace(&self, settings: GlobalSettings) {
        *self.current.write() = Some(settings);
    }
}

#[async_trait]
impl SettingsSource for InMemorySettings {
    async fn load(&self) -> Result<Option<GlobalSettings>> {
        Ok(self.current.read().clone())
    }
}

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn save(&self, settings: &GlobalSettings) -> Result<()> {
        self.replace(settings.clone());
        Ok(())
    }
}
