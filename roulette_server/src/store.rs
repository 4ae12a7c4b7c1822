use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use roulette_shared::{ApiError, Folder, Image};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct FolderRow {
    id: String,
    name: String,
    created_at: i64,
}

impl From<FolderRow> for Folder {
    fn from(row: FolderRow) -> Self {
        Folder {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: String,
    folder_id: String,
    filename: String,
    url: String,
    created_at: i64,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            folder_id: row.folder_id,
            filename: row.filename,
            url: row.url,
            created_at: row.created_at,
        }
    }
}

/// Ids end up in filesystem paths, so only plain tokens are accepted.
pub fn validate_id(id: &str) -> Result<(), ApiError> {
    let ok = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ApiError::Invalid(format!("Invalid id: {id}")))
    }
}

/// Folder/image metadata in sqlite, image bytes under `images_dir/<folder>/`.
#[derive(Clone)]
pub struct Store {
    db: SqlitePool,
    images_dir: PathBuf,
}

impl Store {
    pub async fn open(database_url: &str, images_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&images_dir)
            .await
            .with_context(|| format!("create {}", images_dir.display()))?;
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("connect {database_url}"))?;
        Self::from_pool(db, images_dir).await
    }

    pub async fn from_pool(db: SqlitePool, images_dir: PathBuf) -> anyhow::Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        Ok(Self { db, images_dir })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn folder_dir(&self, folder_id: &str) -> PathBuf {
        self.images_dir.join(folder_id)
    }

    /// Newest first.
    pub async fn list_folders(&self) -> sqlx::Result<Vec<Folder>> {
        let rows = sqlx::query_as::<_, FolderRow>(
            "SELECT id, name, created_at FROM folders ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Folder::from).collect())
    }

    pub async fn create_folder(&self, name: &str) -> sqlx::Result<Folder> {
        let folder = Folder {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now().timestamp_millis(),
        };
        sqlx::query("INSERT INTO folders (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&folder.id)
            .bind(&folder.name)
            .bind(folder.created_at)
            .execute(&self.db)
            .await?;
        Ok(folder)
    }

    /// Removes the folder row and its image rows. Unknown ids are not an error.
    pub async fn delete_folder(&self, folder_id: &str) -> sqlx::Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM images WHERE folder_id = ?")
            .bind(folder_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(folder_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }

    /// Upload order.
    pub async fn list_images(&self, folder_id: &str) -> sqlx::Result<Vec<Image>> {
        let rows = sqlx::query_as::<_, ImageRow>(
            "SELECT id, folder_id, filename, url, created_at FROM images WHERE folder_id = ? ORDER BY seq ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Image::from).collect())
    }

    pub async fn get_image(&self, id: &str) -> sqlx::Result<Option<Image>> {
        let row = sqlx::query_as::<_, ImageRow>(
            "SELECT id, folder_id, filename, url, created_at FROM images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Image::from))
    }

    /// Inserts one row per `(id, filename)` pair. Either every row lands or none.
    pub async fn add_images(
        &self,
        folder_id: &str,
        files: &[(String, String)],
    ) -> sqlx::Result<Vec<Image>> {
        let created_at = Utc::now().timestamp_millis();
        let mut tx = self.db.begin().await?;
        let mut images = Vec::with_capacity(files.len());
        for (id, filename) in files {
            let image = Image {
                id: id.clone(),
                folder_id: folder_id.to_string(),
                filename: filename.clone(),
                url: format!("/uploads/{folder_id}/{filename}"),
                created_at,
            };
            sqlx::query(
                "INSERT INTO images (id, folder_id, filename, url, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&image.id)
            .bind(&image.folder_id)
            .bind(&image.filename)
            .bind(&image.url)
            .bind(image.created_at)
            .execute(&mut *tx)
            .await?;
            images.push(image);
        }
        tx.commit().await?;
        Ok(images)
    }

    pub async fn delete_image(&self, id: &str) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
