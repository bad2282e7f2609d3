//! Image uploads stored below the configured upload root.
//!
//! Files are identified by their leading bytes rather than the declared
//! content type, and stored under generated names.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use axum::extract::Multipart;
use tracing::warn;

use crate::error::AppError;
use crate::i18n::{fill, LanguageStrings};

/// Accepted image kinds by file extension
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// An image accepted from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Collect every file sent under `field` (or `field[]`), validating type and size.
/// At least one file is required.
pub async fn read_images(
    multipart: &mut Multipart,
    field: &str,
    max_bytes: usize,
    strings: &LanguageStrings,
) -> Result<Vec<ImageUpload>, AppError> {
    let label = field.replace('_', " ");
    let required = || AppError::invalid(field, fill(strings.field_required, &[("field", label.clone())]));
    let array_field = format!("{}[]", field);
    let mut images = Vec::new();

    loop {
        let next = multipart.next_field().await.map_err(|e| {
            warn!("Malformed multipart upload: {}", e);
            required()
        })?;
        let Some(part) = next else {
            break;
        };

        let name = part.name().unwrap_or_default().to_string();
        if name != field && name != array_field {
            continue;
        }

        let bytes = part.bytes().await.map_err(|e| {
            warn!("Failed to read upload field {}: {}", name, e);
            required()
        })?;

        if bytes.is_empty() {
            return Err(required());
        }
        if bytes.len() > max_bytes {
            return Err(AppError::invalid(
                field,
                fill(
                    strings.file_too_large,
                    &[("field", label.clone()), ("max", (max_bytes / 1024).to_string())],
                ),
            ));
        }
        let Some(extension) = sniff_image(&bytes) else {
            return Err(AppError::invalid(
                field,
                fill(strings.file_type, &[("field", label.clone())]),
            ));
        };

        images.push(ImageUpload {
            extension,
            bytes: bytes.to_vec(),
        });
    }

    if images.is_empty() {
        return Err(required());
    }
    Ok(images)
}

/// A single image sent under `field`; extra files are ignored
pub async fn read_image(
    multipart: &mut Multipart,
    field: &str,
    max_bytes: usize,
    strings: &LanguageStrings,
) -> Result<ImageUpload, AppError> {
    let images = read_images(multipart, field, max_bytes, strings).await?;
    images.into_iter().next().ok_or_else(|| {
        AppError::invalid(
            field,
            fill(strings.field_required, &[("field", field.replace('_', " "))]),
        )
    })
}

/// Reject absolute paths and `..` so stored paths never leave the upload root
fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let safe = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    safe.then(|| root.join(relative))
}

/// Write an image under `dir` and return its path relative to the root
pub async fn store(root: &Path, dir: &str, image: &ImageUpload) -> Result<String> {
    let relative = format!("{}/{}.{}", dir, uuid::Uuid::new_v4().simple(), image.extension);
    let target = resolve(root, &relative).context("Upload directory escapes the upload root")?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&target, &image.bytes)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    Ok(relative)
}

/// Best-effort removal of a stored file
pub async fn remove_file(root: &Path, relative: &str) {
    if let Some(path) = resolve(root, relative) {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Write every image under `dir`; on failure the files already written are removed
pub async fn store_all(root: &Path, dir: &str, images: &[ImageUpload]) -> Result<Vec<String>> {
    let mut stored = Vec::with_capacity(images.len());
    for image in images {
        match store(root, dir, image).await {
            Ok(relative) => stored.push(relative),
            Err(e) => {
                remove_files(root, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

/// Best-effort removal of several stored files
pub async fn remove_files(root: &Path, relatives: &[String]) {
    for relative in relatives {
        remove_file(root, relative).await;
    }
}

/// Best-effort removal of a stored directory and its contents
pub async fn remove_dir(root: &Path, relative: &str) {
    if let Some(path) = resolve(root, relative) {
        if let Err(e) = tokio::fs::remove_dir_all(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Directory holding a listing's gallery
pub fn property_dir(property_id: i64) -> String {
    format!("properties/{}", property_id)
}
