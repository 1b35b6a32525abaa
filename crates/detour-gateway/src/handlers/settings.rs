use crate::error::{AppError, Result};
use crate::model::Data;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use detour_core::{GlobalSettings, SettingsSource, SettingsStore};
use tracing::info;

/// The global settings singleton; `{}` mappings when it was never saved.
pub async fn get_global_handler(
    State(state): State<AppState>,
) -> Result<Json<Data<GlobalSettings>>> {
    let settings = state.settings().load().await?.unwrap_or_default();
    Ok(Json(Data::new(settings)))
}

/// Replaces the singleton. The next slug change maps paths with it.
pub async fn put_global_handler(
    State(state): State<AppState>,
    Json(request): Json<Data<GlobalSettings>>,
) -> Result<Json<Data<GlobalSettings>>> {
    let settings = request.data;
    for (type_name, segment) in &settings.redirect_url_mappings {
        if segment.is_empty() || segment.contains('/') {
            return Err(AppError::BadRequest(format!(
                "Invalid path segment \"{segment}\" for \"{type_name}\""
            )));
        }
    }

    state.settings().save(&settings).await?;
    info!(
        mappings = settings.redirect_url_mappings.len(),
        "saved global settings"
    );
    Ok(Json(Data::new(settings)))
}
