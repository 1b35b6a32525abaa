use detour_core::Redirect;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bulk import body. `data` is checked for being an array by the handler so
/// the error message can be specific.
#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct BulkImportResponse {
    pub message: String,
    pub data: Vec<Redirect>,
}

impl BulkImportResponse {
    pub fn new(data: Vec<Redirect>) -> Self {
        Self {
            message: format!("Successfully imported {} redirects", data.len()),
            data,
        }
    }
}
