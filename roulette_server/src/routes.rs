use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use roulette_shared::{CreateFolderRequest, DeleteResponse, Folder, Image};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::resize::{process_upload, ResizeSettings};
use crate::store::{validate_id, Store};

pub const MAX_FILES_PER_UPLOAD: usize = 20;
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
const UPLOAD_BODY_LIMIT: usize = MAX_FILES_PER_UPLOAD * MAX_FILE_BYTES + 64 * 1024;
const ALLOWED_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

pub struct AppState {
    pub store: Store,
    pub resize: ResizeSettings,
}

pub fn router(state: Arc<AppState>, public_dir: &FsPath) -> Router {
    let uploads = ServeDir::new(state.store.images_dir());
    Router::new()
        .route("/api/folders", get(list_folders).post(create_folder))
        .route("/api/folders/:id", delete(delete_folder))
        .route(
            "/api/folders/:id/images",
            get(list_images)
                .post(upload_images)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/images/:id", delete(delete_image))
        .nest_service("/uploads", uploads)
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn list_folders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Folder>>, AppError> {
    Ok(Json(state.store.list_folders().await?))
}

async fn create_folder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Folder>), AppError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::invalid("Name required"))?;
    let folder = state.store.create_folder(name).await?;
    tokio::fs::create_dir_all(state.store.folder_dir(&folder.id)).await?;
    info!(id = %folder.id, name = %folder.name, "folder created");
    Ok((StatusCode::CREATED, Json(folder)))
}

async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    validate_id(&id)?;
    state.store.delete_folder(&id).await?;
    match tokio::fs::remove_dir_all(state.store.folder_dir(&id)).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    info!(%id, "folder deleted");
    Ok(Json(DeleteResponse::ok()))
}

async fn list_images(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Image>>, AppError> {
    validate_id(&id)?;
    Ok(Json(state.store.list_images(&id).await?))
}

/// Extension and mime type must both name an image format.
fn is_allowed_image(filename: &str, mime: &str) -> bool {
    let ext = FsPath::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = mime.to_ascii_lowercase();
    ALLOWED_TYPES.iter().any(|t| ext.contains(t)) && ALLOWED_TYPES.iter().any(|t| mime.contains(t))
}

struct Upload {
    ext: String,
    bytes: Vec<u8>,
}

async fn upload_images(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Image>>), AppError> {
    validate_id(&folder_id)?;

    let mut uploads = Vec::new();
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("images") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().unwrap_or_default().to_string();
        if !is_allowed_image(&filename, &mime) {
            warn!(%filename, %mime, "rejected upload");
            return Err(AppError::invalid("Only images allowed"));
        }
        if uploads.len() == MAX_FILES_PER_UPLOAD {
            return Err(AppError::invalid("Too many files"));
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > MAX_FILE_BYTES {
                return Err(AppError::invalid("File too large"));
            }
            bytes.extend_from_slice(&chunk);
        }
        let ext = FsPath::new(&filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg")
            .to_ascii_lowercase();
        uploads.push(Upload { ext, bytes });
    }

    let dir = state.store.folder_dir(&folder_id);
    tokio::fs::create_dir_all(&dir).await?;

    let mut written = Vec::with_capacity(uploads.len());
    let stored = match store_uploads(&state, &folder_id, &dir, uploads, &mut written).await {
        Ok(stored) => stored,
        Err(err) => {
            for filename in &written {
                if let Err(e) = tokio::fs::remove_file(dir.join(filename)).await {
                    warn!(%filename, error = %e, "could not remove partial upload");
                }
            }
            return Err(err);
        }
    };
    info!(folder = %folder_id, count = stored.len(), "images uploaded");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Writes every file, then inserts all rows at once. `written` collects the
/// filenames on disk so the caller can remove them on failure.
async fn store_uploads(
    state: &AppState,
    folder_id: &str,
    dir: &FsPath,
    uploads: Vec<Upload>,
    written: &mut Vec<String>,
) -> Result<Vec<Image>, AppError> {
    let mut files = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let (bytes, ext) = process_upload(state.resize, upload.bytes, upload.ext).await;
        let id = Uuid::new_v4().to_string();
        let filename = format!("{id}.{ext}");
        tokio::fs::write(dir.join(&filename), &bytes).await?;
        written.push(filename.clone());
        files.push((id, filename));
    }
    Ok(state.store.add_images(folder_id, &files).await?)
}

async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    validate_id(&id)?;
    let image = state
        .store
        .get_image(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Image not found"))?;
    let path = state.store.folder_dir(&image.folder_id).join(&image.filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    state.store.delete_image(&id).await?;
    Ok(Json(DeleteResponse::ok()))
}
