//! The auto-redirect maintenance engine.
//!
//! The engine listens to content lifecycle events and keeps the redirect
//! table consistent with slug changes and deletions:
//!
//! - [`SlugTracker`] remembers the slug an entity had before an update.
//! - [`PathMapper`] turns a content type and slug into a public path.
//! - [`Resolver`] decides how a slug change is reflected in the redirect
//!   graph (chain collapse, loop reversal, creation).
//! - [`OrphanSweeper`] retires redirects whose target was deleted.
//! - [`EventDispatcher`] routes lifecycle events to the above.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use detour_core::{ContentTypeRegistry, LifecycleBus};
//! use detour_engine::{EventDispatcher, TrackerConfig};
//! use detour_storage::{InMemoryContentRepository, InMemoryRedirectStore, InMemorySettings};
//!
//! let registry = Arc::new(ContentTypeRegistry::new());
//! let dispatcher = EventDispatcher::new(
//!     registry,
//!     Arc::new(InMemoryRedirectStore::new()),
//!     Arc::new(InMemoryContentRepository::new()),
//!     Arc::new(InMemorySettings::new()),
//!     TrackerConfig::default(),
//! );
//!
//! let mut bus = LifecycleBus::new();
//! bus.subscribe(Arc::new(dispatcher));
//! ```

pub mod adapter;
pub mod dispatcher;
pub mod error;
pub mod path;
pub mod resolver;
pub mod sweeper;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use adapter::RedirectStoreAdapter;
pub use dispatcher::EventDispatcher;
pub use error::{EngineError, PathError, Result};
pub use path::PathMapper;
pub use resolver::{
    plan, ChainRewrite, Decision, Neighborhood, Plan, RedirectOutcome, Resolver, SlugChange,
};
pub use sweeper::{OrphanSweeper, SweepReport};
pub use tracker::{SlugTracker, TrackerConfig};
