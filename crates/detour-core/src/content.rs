use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

const API_NAMESPACE: &str = "api::";
const INTERNAL_NAMESPACES: [&str; 2] = ["admin::", "plugin::"];
const UID_ATTRIBUTE_KIND: &str = "uid";
const SLUG_ATTRIBUTE: &str = "slug";

/// A content-type identifier such as `api::article.article`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTypeUid(String);

impl ContentTypeUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for types owned by the host itself (`admin::`, `plugin::`).
    pub fn is_internal(&self) -> bool {
        INTERNAL_NAMESPACES
            .iter()
            .any(|namespace| self.0.starts_with(namespace))
    }

    /// The bare type name: `api::article.article` becomes `article`.
    pub fn type_name(&self) -> &str {
        let name = self.0.strip_prefix(API_NAMESPACE).unwrap_or(&self.0);
        match name.find('.') {
            Some(dot) => &name[..dot],
            None => name,
        }
    }
}

impl Display for ContentTypeUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentTypeUid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a content item within its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The slice of a content item the engine cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: EntityId,
    #[serde(default)]
    pub slug: Option<String>,
}

impl ContentItem {
    pub fn new(id: impl Into<EntityId>, slug: Option<String>) -> Self {
        Self {
            id: id.into(),
            slug,
        }
    }
}

/// Raw content-type schema as declared by the content host.
///
/// ```json
/// {
///   "uid": "api::article.article",
///   "info": { "displayName": "Article", "pluralName": "articles" },
///   "attributes": { "slug": { "type": "uid" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeSchema {
    pub uid: String,
    #[serde(default)]
    pub info: SchemaInfo,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub plural_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    #[serde(rename = "type")]
    pub kind: String,
}

/// What the engine needs to know about a content type, resolved once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeDescriptor {
    pub uid: ContentTypeUid,
    /// Key used to look up path overrides in the global settings.
    pub type_name: String,
    pub display_name: String,
    pub plural_name: String,
    /// `true` if the type carries a unique-identifier slug attribute.
    pub tracks_slugs: bool,
}

impl ContentTypeDescriptor {
    /// Returns `true` if slug changes of this type should maintain redirects.
    pub fn participates(&self) -> bool {
        self.tracks_slugs && !self.uid.is_internal()
    }
}

impl TryFrom<ContentTypeSchema> for ContentTypeDescriptor {
    type Error = ConfigError;

    fn try_from(schema: ContentTypeSchema) -> std::result::Result<Self, Self::Error> {
        if schema.uid.trim().is_empty() {
            return Err(ConfigError::EmptyUid);
        }

        let uid = ContentTypeUid::new(schema.uid);
        let type_name = uid.type_name().to_string();
        if type_name.is_empty() {
            return Err(ConfigError::EmptyTypeName {
                uid: uid.to_string(),
            });
        }

        let plural_name = schema
            .info
            .plural_name
            .unwrap_or_else(|| format!("{type_name}s"));
        if plural_name.is_empty() || plural_name.contains('/') {
            return Err(ConfigError::InvalidPluralName {
                uid: uid.to_string(),
                plural: plural_name,
            });
        }

        let tracks_slugs = schema
            .attributes
            .get(SLUG_ATTRIBUTE)
            .is_some_and(|attribute| attribute.kind == UID_ATTRIBUTE_KIND);

        Ok(Self {
            display_name: schema
                .info
                .display_name
                .unwrap_or_else(|| type_name.clone()),
            uid,
            type_name,
            plural_name,
            tracks_slugs,
        })
    }
}

/// The set of content types known to the host, built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeRegistry {
    types: HashMap<ContentTypeUid, ContentTypeDescriptor>,
}

impl ContentTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from raw schemas, failing on the first invalid one.
    pub fn from_schemas(
        schemas: impl IntoIterator<Item = ContentTypeSchema>,
    ) -> std::result::Result<Self, ConfigError> {
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, schema: ContentTypeSchema) -> std::result::Result<(), ConfigError> {
        let descriptor = ContentTypeDescriptor::try_from(schema)?;
        if self.types.contains_key(&descriptor.uid) {
            return Err(ConfigError::Duplicate(descriptor.uid.to_string()));
        }
        tracing::debug!(
            uid = %descriptor.uid,
            plural = %descriptor.plural_name,
            tracks_slugs = descriptor.tracks_slugs,
            "registered content type"
        );
        self.types.insert(descriptor.uid.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, uid: &ContentTypeUid) -> Option<&ContentTypeDescriptor> {
        self.types.get(uid)
    }

    /// Returns the descriptor only if the type participates in redirect tracking.
    pub fn tracked(&self, uid: &ContentTypeUid) -> Option<&ContentTypeDescriptor> {
        self.get(uid).filter(|descriptor| descriptor.participates())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentTypeDescriptor> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A read-only view of the content host's storage.
#[async_trait]
pub trait ReadContentRepository: Send + Sync + 'static {
    /// Retrieves a content item. Returns `None` if it does not exist.
    async fn find(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<Option<ContentItem>>;

    /// Counts live items of `uid` whose slug equals `slug`.
    async fn count_by_slug(&self, uid: &ContentTypeUid, slug: &str) -> Result<u64>;
}

#[async_trait]
pub trait ContentRepository: ReadContentRepository {
    /// Inserts or replaces an item. Returns the previous version, if any.
    async fn upsert(&self, uid: &ContentTypeUid, item: ContentItem) -> Result<Option<ContentItem>>;

    /// Removes an item. Returns the removed version, if any.
    async fn delete(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<Option<ContentItem>>;
}
