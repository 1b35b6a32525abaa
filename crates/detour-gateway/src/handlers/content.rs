use crate::error::Result;
use crate::model::{Data, PutContentRequest};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use detour_core::{ContentItem, ContentTypeUid, EntityId};

pub async fn get_content_handler(
    Path((uid, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Data<ContentItem>>> {
    let item = state
        .content()
        .get(&ContentTypeUid::new(uid), &EntityId::new(id))
        .await?;
    Ok(Json(Data::new(item)))
}

pub async fn put_content_handler(
    Path((uid, id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<PutContentRequest>,
) -> Result<Json<Data<ContentItem>>> {
    let item = state
        .content()
        .put(&ContentTypeUid::new(uid), EntityId::new(id), request.data.slug)
        .await?;
    Ok(Json(Data::new(item)))
}

pub async fn delete_content_handler(
    Path((uid, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Data<ContentItem>>> {
    let item = state
        .content()
        .delete(&ContentTypeUid::new(uid), &EntityId::new(id))
        .await?;
    Ok(Json(Data::new(item)))
}
