mod content;
mod redirect;

pub use content::{ContentBody, PutContentRequest};
pub use redirect::{BulkImportRequest, BulkImportResponse};

use serde::{Deserialize, Serialize};

/// The `{ "data": ... }` envelope used by every API body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
