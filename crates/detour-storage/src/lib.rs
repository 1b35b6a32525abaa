//! Storage backends for redirects, content items and global settings.
//!
//! Every backend implements the store traits from `detour_core`, so the
//! engine and the gateway never depend on a concrete backend.

pub mod content;
pub mod memory;
pub mod mysql;
pub mod settings;

pub use content::InMemoryContentRepository;
pub use detour_core::{
    ContentRepository, ReadContentRepository, ReadRedirectStore, RedirectStore, SettingsSource,
    SettingsStore, StorageError,
};
pub use memory::InMemoryRedirectStore;
pub use mysql::{MySqlContentRepository, MySqlRedirectStore, MySqlSettings};
pub use settings::InMemorySettings;
