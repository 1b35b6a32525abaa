use async_trait::async_trait;
use detour_core::{
    ContentItem, ContentRepository, ContentTypeUid, EntityId, GlobalSettings, NewRedirect,
    ReadContentRepository, ReadRedirectStore, Redirect, RedirectFilter, RedirectId,
    RedirectPatch, RedirectSort, RedirectStore, Result, SettingsSource, SettingsStore,
    StorageError,
};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder, Row};
use std::collections::BTreeMap;

const REDIRECT_COLUMNS: &str =
    "id, from_path, to_path, status_code, is_active, priority, description, created_at, updated_at";

/// The global settings table holds a single row with this id.
const SETTINGS_ROW_ID: u8 = 1;

/// MySQL implementation of the redirect store.
///
/// Records are never soft-deleted here: retiring a redirect is done by the
/// engine through `is_active`, and `delete` is reserved for administrators.
#[derive(Debug, Clone)]
pub struct MySqlRedirectStore {
    pool: MySqlPool,
}

impl MySqlRedirectStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Creates the `redirects` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(include_str!("../ddl/mysql/redirects.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_timestamp(column: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{seconds}': {e}"))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

/// Escapes `LIKE` metacharacters so a prefix matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &RedirectFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(from_path) = &filter.from_path {
        builder.push(" AND from_path = ").push_bind(from_path.clone());
    }
    if let Some(to_path) = &filter.to_path {
        builder.push(" AND to_path = ").push_bind(to_path.clone());
    }
    if let Some(prefix) = &filter.to_path_prefix {
        builder
            .push(" AND to_path LIKE ")
            .push_bind(format!("{}%", escape_like(prefix)));
    }
    if let Some(is_active) = filter.is_active {
        builder.push(" AND is_active = ").push_bind(is_active);
    }
}

fn redirect_from_row(row: &MySqlRow) -> Result<Redirect> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let status_code: i32 = row.try_get("status_code").map_err(map_sqlx_error)?;
    let status_code = u16::try_from(status_code).map_err(|_| {
        StorageError::InvalidData(format!("invalid status code {status_code} on redirect {id}"))
    })?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;

    Ok(Redirect {
        id: RedirectId(id),
        from_path: row.try_get("from_path").map_err(map_sqlx_error)?,
        to_path: row.try_get("to_path").map_err(map_sqlx_error)?,
        status_code,
        is_active: row.try_get("is_active").map_err(map_sqlx_error)?,
        priority: row.try_get("priority").map_err(map_sqlx_error)?,
        description: row.try_get("description").map_err(map_sqlx_error)?,
        created_at: parse_timestamp("created_at", created_at)?,
        updated_at: parse_timestamp("updated_at", updated_at)?,
    })
}

#[async_trait]
impl ReadRedirectStore for MySqlRedirectStore {
    async fn get(&self, id: RedirectId) -> Result<Option<Redirect>> {
        let row = sqlx::query(&format!(
            "SELECT {REDIRECT_COLUMNS} FROM redirects WHERE id = ? LIMIT 1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(redirect_from_row).transpose()
    }

    async fn find_many(
        &self,
        filter: &RedirectFilter,
        sort: RedirectSort,
        limit: Option<usize>,
    ) -> Result<Vec<Redirect>> {
        let mut builder =
            QueryBuilder::<MySql>::new(format!("SELECT {REDIRECT_COLUMNS} FROM redirects"));
        push_filter(&mut builder, filter);
        builder.push(match sort {
            RedirectSort::Id => " ORDER BY id ASC",
            RedirectSort::PriorityAsc => " ORDER BY priority ASC, id ASC",
        });
        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(limit as u64);
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(redirect_from_row).collect()
    }

    async fn count(&self, filter: &RedirectFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<MySql>::new("SELECT COUNT(*) AS total FROM redirects");
        push_filter(&mut builder, filter);

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;

        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl RedirectStore for MySqlRedirectStore {
    async fn create(&self, data: NewRedirect) -> Result<Redirect> {
        let now = now_unix_seconds();

        let result = sqlx::query(
            r#"
            INSERT INTO redirects
                (from_path, to_path, status_code, is_active, priority, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.from_path)
        .bind(&data.to_path)
        .bind(i32::from(data.status_code))
        .bind(data.is_active)
        .bind(data.priority)
        .bind(&data.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => RedirectId(done.last_insert_id()),
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(data.from_path))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        self.get(id).await?.ok_or_else(|| {
            StorageError::InvalidData(format!("redirect {id} vanished after insert"))
        })
    }

    async fn update(&self, id: RedirectId, patch: RedirectPatch) -> Result<Redirect> {
        if !patch.is_empty() {
            let mut builder = QueryBuilder::<MySql>::new("UPDATE redirects SET ");
            let mut set = builder.separated(", ");
            if let Some(from_path) = patch.from_path {
                set.push("from_path = ").push_bind_unseparated(from_path);
            }
            if let Some(to_path) = patch.to_path {
                set.push("to_path = ").push_bind_unseparated(to_path);
            }
            if let Some(status_code) = patch.status_code {
                set.push("status_code = ")
                    .push_bind_unseparated(i32::from(status_code));
            }
            if let Some(is_active) = patch.is_active {
                set.push("is_active = ").push_bind_unseparated(is_active);
            }
            if let Some(priority) = patch.priority {
                set.push("priority = ").push_bind_unseparated(priority);
            }
            if let Some(description) = patch.description {
                set.push("description = ").push_bind_unseparated(description);
            }
            set.push("updated_at = ")
                .push_bind_unseparated(now_unix_seconds());
            builder.push(" WHERE id = ").push_bind(id.0);

            builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }

        // MySQL reports zero affected rows for no-op updates, so existence is
        // checked by reading the row back.
        self.get(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("redirect {id}")))
    }

    async fn delete(&self, id: RedirectId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM redirects WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Global settings stored as a single row of the `global_settings` table.
#[derive(Debug, Clone)]
pub struct MySqlSettings {
    pool: MySqlPool,
}

impl MySqlSettings {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates the `global_settings` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(include_str!("../ddl/mysql/global_settings.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MySqlSettings {
    async fn save(&self, settings: &GlobalSettings) -> Result<()> {
        let mappings = serde_json::to_string(&settings.redirect_url_mappings)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO global_settings (id, redirect_url_mappings)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE redirect_url_mappings = VALUES(redirect_url_mappings)
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .bind(mappings)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl SettingsSource for MySqlSettings {
    async fn load(&self) -> Result<Option<GlobalSettings>> {
        let row = sqlx::query("SELECT redirect_url_mappings FROM global_settings WHERE id = ?")
            .bind(SETTINGS_ROW_ID)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: Option<String> = row
            .try_get("redirect_url_mappings")
            .map_err(map_sqlx_error)?;
        let redirect_url_mappings = match raw {
            Some(raw) => serde_json::from_str::<BTreeMap<String, String>>(&raw).map_err(|e| {
                StorageError::InvalidData(format!("invalid redirect_url_mappings: {e}"))
            })?,
            None => BTreeMap::new(),
        };

        Ok(Some(GlobalSettings {
            redirect_url_mappings,
        }))
    }
}

/// Content items of the built-in content host, persisted next to the
/// redirects so orphan sweeps see the same items after a restart.
#[derive(Debug, Clone)]
pub struct MySqlContentRepository {
    pool: MySqlPool,
}

impl MySqlContentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates the `content_items` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(include_str!("../ddl/mysql/content_items.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn content_from_row(row: &MySqlRow) -> Result<ContentItem> {
    let id: String = row.try_get("entity_id").map_err(map_sqlx_error)?;
    Ok(ContentItem {
        id: EntityId::new(id),
        slug: row.try_get("slug").map_err(map_sqlx_error)?,
    })
}

/// Reads one item and locks its row for the rest of the transaction.
async fn find_for_update(
    conn: &mut MySqlConnection,
    uid: &ContentTypeUid,
    id: &EntityId,
) -> Result<Option<ContentItem>> {
    let row = sqlx::query(
        "SELECT entity_id, slug FROM content_items WHERE uid = ? AND entity_id = ? FOR UPDATE",
    )
    .bind(uid.as_str())
    .bind(id.as_str())
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx_error)?;

    row.as_ref().map(content_from_row).transpose()
}

#[async_trait]
impl ReadContentRepository for MySqlContentRepository {
    async fn find(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<Option<ContentItem>> {
        let row =
            sqlx::query("SELECT entity_id, slug FROM content_items WHERE uid = ? AND entity_id = ?")
                .bind(uid.as_str())
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.as_ref().map(content_from_row).transpose()
    }

    async fn count_by_slug(&self, uid: &ContentTypeUid, slug: &str) -> Result<u64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS total FROM content_items WHERE uid = ? AND slug = ?")
                .bind(uid.as_str())
                .bind(slug)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;

        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl ContentRepository for MySqlContentRepository {
    async fn upsert(&self, uid: &ContentTypeUid, item: ContentItem) -> Result<Option<ContentItem>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let previous = find_for_update(&mut *tx, uid, &item.id).await?;

        sqlx::query(
            r#"
            INSERT INTO content_items (uid, entity_id, slug)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE slug = VALUES(slug)
            "#,
        )
        .bind(uid.as_str())
        .bind(item.id.as_str())
        .bind(item.slug.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(previous)
    }

    async fn delete(&self, uid: &ContentTypeUid, id: &EntityId) -> Result<Option<ContentItem>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let Some(previous) = find_for_update(&mut *tx, uid, id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM content_items WHERE uid = ? AND entity_id = ?")
            .bind(uid.as_str())
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(previous))
    }
}
