//! Core types and traits for the Detour redirect engine.
//!
//! This crate provides the domain model shared by the storage backends,
//! the auto-redirect engine and the HTTP gateway: redirect records and
//! their store contracts, content-type descriptors, global settings and
//! the lifecycle event bus that connects a content host to the engine.

pub mod content;
pub mod error;
pub mod lifecycle;
pub mod redirect;
pub mod settings;

pub use content::{
    ContentItem, ContentRepository, ContentTypeDescriptor, ContentTypeRegistry,
    ContentTypeSchema, ContentTypeUid, EntityId, ReadContentRepository,
};
pub use error::{ConfigError, Result, StorageError};
pub use lifecycle::{LifecycleAction, LifecycleBus, LifecycleEvent, LifecycleSubscriber};
pub use redirect::{
    ActiveRedirect, NewRedirect, ReadRedirectStore, Redirect, RedirectFilter, RedirectId,
    RedirectPatch, RedirectSort, RedirectStore,
};
pub use settings::{GlobalSettings, SettingsSource, SettingsStore};
