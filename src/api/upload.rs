//! Product asset uploads.
//!
//! Files land under `<upload_dir>/products/<slug>/<images|3dmodels>/` and the
//! returned URL is relative to the upload root, so it can be stored on the
//! product as-is and served back through `/products/*`.

use axum::{extract::{Multipart, Query, State}, Json};
use serde::Deserialize;
use std::path::Path;
use super::AppState;
use crate::{Result, StorefrontError, UploadResponse};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const MODEL_EXTENSIONS: &[&str] = &["glb", "gltf", "usdz"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Model,
}

impl AssetKind {
    fn folder(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Model => "3dmodels",
        }
    }

    fn allows(self, extension: &str) -> bool {
        let allowed = match self {
            Self::Image => IMAGE_EXTENSIONS,
            Self::Model => MODEL_EXTENSIONS,
        };
        allowed.contains(&extension)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    #[serde(default)]
    pub product_name: String,
}

pub async fn upload_image(State(s): State<AppState>, Query(p): Query<UploadParams>, multipart: Multipart) -> Result<Json<UploadResponse>> {
    store_upload(&s, &p, multipart, AssetKind::Image).await
}

pub async fn upload_model(State(s): State<AppState>, Query(p): Query<UploadParams>, multipart: Multipart) -> Result<Json<UploadResponse>> {
    store_upload(&s, &p, multipart, AssetKind::Model).await
}

async fn store_upload(s: &AppState, p: &UploadParams, mut multipart: Multipart, kind: AssetKind) -> Result<Json<UploadResponse>> {
    let slug = slugify(&p.product_name);
    if slug.is_empty() { return Err(StorefrontError::BadRequest("productName is required".into())); }

    let bad_multipart = |e: axum::extract::multipart::MultipartError| StorefrontError::BadRequest(e.to_string());
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(original) = field.file_name().map(str::to_string) else { continue };
        let file_name = sanitize_file_name(&original);
        let extension = extension_of(&file_name);
        if !kind.allows(&extension) {
            return Err(StorefrontError::BadRequest(format!("Unsupported file type: .{extension}")));
        }
        let bytes = field.bytes().await.map_err(bad_multipart)?;

        let relative = format!("products/{slug}/{}/{file_name}", kind.folder());
        let target = s.upload_dir.join(&relative);
        if let Some(dir) = target.parent() { tokio::fs::create_dir_all(dir).await?; }
        tokio::fs::write(&target, &bytes).await?;
        tracing::info!(path = %target.display(), size = bytes.len(), "asset uploaded");
        return Ok(Json(UploadResponse { url: relative }));
    }
    Err(StorefrontError::BadRequest("No file uploaded".into()))
}

/// Lowercase, with every run of non-alphanumerics collapsed into one dash.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name).file_name().and_then(|n| n.to_str()).unwrap_or_default();
    base.chars().map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '-' }).collect()
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name).extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase()
}
