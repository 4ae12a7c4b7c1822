use std::path::Path;

use anyhow::{bail, Context};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use roulette_core::{CatalogError, ImageCatalog};
use roulette_shared::{CreateFolderRequest, DeleteResponse, ErrorBody, Folder, Image};

/// HTTP client for the folder/image store. No retries.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn check(res: Response) -> anyhow::Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    match res.json::<ErrorBody>().await {
        Ok(body) => bail!("{status}: {}", body.error),
        Err(_) => bail!("{status}"),
    }
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    pub async fn folders(&self) -> anyhow::Result<Vec<Folder>> {
        let res = self.http.get(self.url("/folders")).send().await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn create_folder(&self, name: &str) -> anyhow::Result<Folder> {
        let req = CreateFolderRequest {
            name: Some(name.to_string()),
        };
        let res = self.http.post(self.url("/folders")).json(&req).send().await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn delete_folder(&self, id: &str) -> anyhow::Result<DeleteResponse> {
        let res = self
            .http
            .delete(self.url(&format!("/folders/{id}")))
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn images(&self, folder_id: &str) -> anyhow::Result<Vec<Image>> {
        let res = self
            .http
            .get(self.url(&format!("/folders/{folder_id}/images")))
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn add_images(&self, folder_id: &str, paths: &[impl AsRef<Path>]) -> anyhow::Result<Vec<Image>> {
        let mut form = Form::new();
        for path in paths {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("read {}", path.display()))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let part = Part::bytes(bytes).file_name(name).mime_str(mime_for(path))?;
            form = form.part("images", part);
        }
        let res = self
            .http
            .post(self.url(&format!("/folders/{folder_id}/images")))
            .multipart(form)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn delete_image(&self, id: &str) -> anyhow::Result<DeleteResponse> {
        let res = self
            .http
            .delete(self.url(&format!("/images/{id}")))
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }
}

impl ImageCatalog for ApiClient {
    async fn list_images(&self, folder_id: &str) -> Result<Vec<Image>, CatalogError> {
        self.images(folder_id)
            .await
            .map_err(|err| CatalogError::Fetch(format!("{err:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        let client = ApiClient::new("http://127.0.0.1:8080/");
        assert_eq!(client.url("/folders"), "http://127.0.0.1:8080/api/folders");
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("b.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("notes.txt")), "application/octet-stream");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_catalog_error() {
        // port 9 (discard) is not expected to serve http
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client.list_images("f1").await.unwrap_err();
        assert!(matches!(err, CatalogError::Fetch(_)));
    }
}
