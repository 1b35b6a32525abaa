use serde::Deserialize;

/// Writable attributes of a content item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBody {
    #[serde(default)]
    pub slug: Option<String>,
}

pub type PutContentRequest = super::Data<ContentBody>;
