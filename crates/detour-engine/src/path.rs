use crate::error::PathError;
use detour_core::{ContentTypeRegistry, ContentTypeUid, GlobalSettings, SettingsSource};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps content types and slugs to the paths the frontend serves them under.
///
/// The segment for a type is, in order of preference: the override in
/// `redirectUrlMappings`, the declared plural name, or `<typeName>s`. The
/// mapper holds no mutable state; callers pass the settings snapshot.
#[derive(Debug, Clone)]
pub struct PathMapper {
    registry: Arc<ContentTypeRegistry>,
}

impl PathMapper {
    pub fn new(registry: Arc<ContentTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ContentTypeRegistry {
        &self.registry
    }

    /// The first path segment for `uid`, without slashes.
    pub fn segment(
        &self,
        settings: &GlobalSettings,
        uid: &ContentTypeUid,
    ) -> Result<String, PathError> {
        let type_name = uid.type_name();

        if let Some(segment) = settings.path_override(type_name) {
            if is_valid_segment(segment) {
                return Ok(segment.to_string());
            }
            warn!(
                uid = %uid,
                segment = %segment,
                "ignoring malformed redirect url mapping"
            );
        }

        if let Some(descriptor) = self.registry.get(uid) {
            return Ok(descriptor.plural_name.clone());
        }

        if type_name.is_empty() {
            return Err(PathError::NoSegment(uid.clone()));
        }
        Ok(format!("{type_name}s"))
    }

    /// The public path of the item of type `uid` with `slug`, e.g. `/articles/hello`.
    pub fn map_path(
        &self,
        settings: &GlobalSettings,
        uid: &ContentTypeUid,
        slug: &str,
    ) -> Result<String, PathError> {
        if slug.is_empty() {
            return Err(PathError::EmptySlug(uid.clone()));
        }
        let segment = self.segment(settings, uid)?;
        Ok(format!("/{segment}/{slug}"))
    }

    /// The prefix shared by every path of type `uid`, e.g. `/articles/`.
    pub fn path_prefix(
        &self,
        settings: &GlobalSettings,
        uid: &ContentTypeUid,
    ) -> Result<String, PathError> {
        let segment = self.segment(settings, uid)?;
        Ok(format!("/{segment}/"))
    }

    /// Human-readable name used in redirect annotations.
    pub fn display_name<'a>(&'a self, uid: &'a ContentTypeUid) -> &'a str {
        self.registry
            .get(uid)
            .map(|descriptor| descriptor.display_name.as_str())
            .unwrap_or_else(|| uid.type_name())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/')
}

/// Extracts the slug from a path under `prefix`.
///
/// Query strings and fragments are not part of the slug. Returns `None` when
/// the path is not under the prefix or nothing follows it.
pub fn slug_from_path<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let slug = &rest[..end];
    (!slug.is_empty()).then_some(slug)
}

/// Loads the current settings, falling back to defaults on any failure.
pub async fn load_settings<G: SettingsSource + ?Sized>(source: &G) -> GlobalSettings {
    match source.load().await {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            debug!("global settings not found, using defaults");
            GlobalSettings::default()
        }
        Err(e) => {
            warn!(error = %e, "failed to load global settings, using defaults");
            GlobalSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{article, registry};

    fn mapper() -> PathMapper {
        PathMapper::new(Arc::new(registry()))
    }

    #[test]
    fn plural_name_is_the_default_segment() {
        let path = mapper()
            .map_path(&GlobalSettings::default(), &article(), "hello")
            .unwrap();
        assert_eq!(path, "/articles/hello");
    }

    #[test]
    fn override_wins_over_plural_name() {
        let settings = GlobalSettings::default().with_mapping("article", "blog");
        let path = mapper().map_path(&settings, &article(), "hello").unwrap();
        assert_eq!(path, "/blog/hello");
    }

    #[test]
    fn malformed_override_falls_back() {
        let mapper = mapper();
        for bad in ["", "blog/posts"] {
            let settings = GlobalSettings::default().with_mapping("article", bad);
            assert_eq!(
                mapper.map_path(&settings, &article(), "x").unwrap(),
                "/articles/x"
            );
        }
    }

    #[test]
    fn unregistered_type_uses_type_name() {
        let uid = ContentTypeUid::new("api::page.page");
        let path = mapper()
            .map_path(&GlobalSettings::default(), &uid, "about")
            .unwrap();
        assert_eq!(path, "/pages/about");
    }

    #[test]
    fn unmappable_type_is_an_error() {
        let uid = ContentTypeUid::new("api::.broken");
        let err = mapper()
            .path_prefix(&GlobalSettings::default(), &uid)
            .unwrap_err();
        assert_eq!(err, PathError::NoSegment(uid));
    }

    #[test]
    fn empty_slug_is_an_error() {
        let err = mapper()
            .map_path(&GlobalSettings::default(), &article(), "")
            .unwrap_err();
        assert_eq!(err, PathError::EmptySlug(article()));
    }

    #[test]
    fn mapping_is_deterministic() {
        let mapper = mapper();
        let settings = GlobalSettings::default().with_mapping("article", "news");
        let first = mapper.map_path(&settings, &article(), "a").unwrap();
        let second = mapper.map_path(&settings, &article(), "a").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn prefix_and_display_name() {
        let mapper = mapper();
        assert_eq!(
            mapper
                .path_prefix(&GlobalSettings::default(), &article())
                .unwrap(),
            "/articles/"
        );
        assert_eq!(mapper.display_name(&article()), "Article");
        assert_eq!(
            mapper.display_name(&ContentTypeUid::new("api::page.page")),
            "page"
        );
    }

    #[test]
    fn slug_extraction() {
        assert_eq!(slug_from_path("/articles/", "/articles/hello"), Some("hello"));
        assert_eq!(slug_from_path("/articles/", "/articles/hello?x=1"), Some("hello"));
        assert_eq!(slug_from_path("/articles/", "/articles/hello#top"), Some("hello"));
        assert_eq!(slug_from_path("/articles/", "/articles/"), None);
        assert_eq!(slug_from_path("/articles/", "/blog/hello"), None);
    }
}
