use crate::error::{AppError, Result};
use crate::model::{BulkImportRequest, BulkImportResponse, Data};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use detour_core::{
    ActiveRedirect, NewRedirect, ReadRedirectStore, Redirect, RedirectFilter, RedirectId,
    RedirectPatch, RedirectSort, RedirectStore, StorageError,
};
use serde_json::Value;
use tracing::info;

const NOT_AN_ARRAY: &str = "Data must be an array of redirect objects";

/// Lookup table for the edge: active redirects, lowest priority first.
pub async fn active_redirects_handler(
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<ActiveRedirect>>>> {
    let active = state
        .redirects()
        .find_many(&RedirectFilter::active(), RedirectSort::PriorityAsc, None)
        .await?;
    Ok(Json(Data::new(
        active.into_iter().map(ActiveRedirect::from).collect(),
    )))
}

pub async fn list_redirects_handler(
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<Redirect>>>> {
    let all = state
        .redirects()
        .find_many(&RedirectFilter::new(), RedirectSort::Id, None)
        .await?;
    Ok(Json(Data::new(all)))
}

pub async fn get_redirect_handler(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Data<Redirect>>> {
    Ok(Json(Data::new(find(state.redirects(), RedirectId(id)).await?)))
}

pub async fn create_redirect_handler(
    State(state): State<AppState>,
    Json(request): Json<Data<NewRedirect>>,
) -> Result<(StatusCode, Json<Data<Redirect>>)> {
    let created = create(state.redirects(), request.data).await?;
    Ok((StatusCode::CREATED, Json(Data::new(created))))
}

pub async fn update_redirect_handler(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Json(request): Json<Data<RedirectPatch>>,
) -> Result<Json<Data<Redirect>>> {
    let store = state.redirects();
    let id = RedirectId(id);
    let mut candidate = find(store, id).await?;
    request.data.apply_to(&mut candidate);

    check_paths(&candidate.from_path, &candidate.to_path)?;
    if candidate.is_active {
        check_single_active(store, &candidate.from_path, Some(id)).await?;
    }

    let updated = store.update(id, request.data).await?;
    info!(id = %updated.id, from_path = %updated.from_path, to_path = %updated.to_path, "redirect updated");
    Ok(Json(Data::new(updated)))
}

pub async fn delete_redirect_handler(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Data<Redirect>>> {
    let store = state.redirects();
    let id = RedirectId(id);
    let existing = find(store, id).await?;
    if !store.delete(id).await? {
        return Err(AppError::NotFound(format!("redirect {id} not found")));
    }
    info!(id = %id, from_path = %existing.from_path, "redirect deleted");
    Ok(Json(Data::new(existing)))
}

/// Creates every redirect in `data`, in order.
///
/// Records created before a failing entry are kept.
pub async fn bulk_import_handler(
    State(state): State<AppState>,
    Json(request): Json<BulkImportRequest>,
) -> Result<Json<BulkImportResponse>> {
    let Value::Array(items) = request.data else {
        return Err(AppError::BadRequest(NOT_AN_ARRAY.to_string()));
    };

    let mut imported = Vec::with_capacity(items.len());
    for item in items {
        let data: NewRedirect = serde_json::from_value(item)
            .map_err(|e| AppError::BadRequest(format!("Import failed: {e}")))?;
        let created = create(state.redirects(), data)
            .await
            .map_err(|e| AppError::BadRequest(format!("Import failed: {e}")))?;
        imported.push(created);
    }

    info!(count = imported.len(), "bulk import finished");
    Ok(Json(BulkImportResponse::new(imported)))
}

async fn find(store: &dyn RedirectStore, id: RedirectId) -> Result<Redirect> {
    store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("redirect {id} not found")))
}

async fn create(store: &dyn RedirectStore, data: NewRedirect) -> Result<Redirect> {
    check_paths(&data.from_path, &data.to_path)?;
    if data.is_active {
        check_single_active(store, &data.from_path, None).await?;
    }
    let created = store.create(data).await?;
    info!(id = %created.id, from_path = %created.from_path, to_path = %created.to_path, "redirect created");
    Ok(created)
}

fn check_paths(from_path: &str, to_path: &str) -> Result<()> {
    if from_path.is_empty() || to_path.is_empty() {
        return Err(AppError::BadRequest(
            "fromPath and toPath are required".to_string(),
        ));
    }
    if from_path == to_path {
        return Err(AppError::BadRequest(format!(
            "redirect from {from_path} to itself"
        )));
    }
    Ok(())
}

/// At most one active redirect may leave a path.
async fn check_single_active(
    store: &dyn RedirectStore,
    from_path: &str,
    except: Option<RedirectId>,
) -> Result<()> {
    let filter = RedirectFilter::active().with_from_path(from_path);
    let clash = store
        .find_many(&filter, RedirectSort::Id, None)
        .await?
        .into_iter()
        .any(|r| Some(r.id) != except);
    if clash {
        return Err(StorageError::Conflict(format!(
            "an active redirect from {from_path} already exists"
        ))
        .into());
    }
    Ok(())
}
