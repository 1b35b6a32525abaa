//! HTTP surface of Detour.
//!
//! Serves the active redirect table to the edge, the admin CRUD and bulk
//! import routes, and a small content host whose mutations drive the
//! auto-redirect engine through the lifecycle bus.

pub mod app;
pub mod content;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use content::ContentService;
pub use error::{AppError, Result};
pub use state::AppState;
