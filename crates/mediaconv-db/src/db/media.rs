use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use mediaconv_core::{FileType, MediaItem, NewMediaItem};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::traits::MediaStore;

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: Uuid,
    file_name: Option<String>,
    file_type: String,
    raw_payload: Vec<u8>,
    processed_variants: Vec<Vec<u8>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for MediaItem {
    type Error = StoreError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        let file_type: FileType = row.file_type.parse().map_err(|e| {
            StoreError::Corrupt(format!("media {} has invalid file_type: {}", row.id, e))
        })?;

        Ok(MediaItem {
            id: row.id,
            file_name: row.file_name,
            file_type,
            raw_payload: Bytes::from(row.raw_payload),
            processed_variants: row
                .processed_variants
                .into_iter()
                .map(Bytes::from)
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL media repository.
///
/// Variants live in a single `bytea[]` column, so replacing them is one row update.
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaStore for MediaRepository {
    #[tracing::instrument(skip(self, item), fields(file_type = %item.file_type))]
    async fn create(&self, item: NewMediaItem) -> StoreResult<MediaItem> {
        let row = sqlx::query_as::<Postgres, MediaRow>(
            r#"
            INSERT INTO media_items (id, file_name, file_type, raw_payload, processed_variants)
            VALUES ($1, $2, $3, $4, '{}')
            RETURNING id, file_name, file_type, raw_payload, processed_variants, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(item.file_name)
        .bind(item.file_type.to_string())
        .bind(item.raw_payload.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert media item");
            StoreError::from(e)
        })?;

        let media = MediaItem::try_from(row)?;
        tracing::info!(media_id = %media.id, "Media item created");
        Ok(media)
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: Uuid) -> StoreResult<Option<MediaItem>> {
        let row = sqlx::query_as::<Postgres, MediaRow>(
            r#"
            SELECT id, file_name, file_type, raw_payload, processed_variants, created_at, updated_at
            FROM media_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MediaItem::try_from).transpose()
    }

    #[tracing::instrument(skip(self, variants), fields(variant_count = variants.len()))]
    async fn replace_variants(&self, id: Uuid, variants: Vec<Bytes>) -> StoreResult<()> {
        let payloads: Vec<Vec<u8>> = variants.into_iter().map(|b| b.to_vec()).collect();

        let result = sqlx::query(
            r#"
            UPDATE media_items
            SET processed_variants = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payloads)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        tracing::debug!(media_id = %id, "Processed variants replaced");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn rename(&self, id: Uuid, file_name: Option<String>) -> StoreResult<MediaItem> {
        let row = sqlx::query_as::<Postgres, MediaRow>(
            r#"
            UPDATE media_items
            SET file_name = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, file_name, file_type, raw_payload, processed_variants, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        MediaItem::try_from(row)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM media_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
