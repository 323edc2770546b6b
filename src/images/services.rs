use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    storage::StorageClient,
};

/// A file taken from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Store `image` as `<dir>/<stem>.<ext>` and return that key.
///
/// The stem is always generated by the caller (an id or a fresh uuid), never
/// taken from user input.
pub async fn upload_image(
    storage: &dyn StorageClient,
    dir: &str,
    stem: &str,
    field: &str,
    image: UploadItem,
) -> AppResult<String> {
    let ext = ensure_image(&image, field)?;
    let key = format!("{dir}/{stem}.{ext}");
    storage
        .put_object(&key, image.body, &image.content_type)
        .await?;
    info!(key = %key, "image uploaded");
    Ok(key)
}

/// File extension for `image`, or a validation error naming `field` when it
/// is not an image type we serve.
pub fn ensure_image(image: &UploadItem, field: &str) -> AppResult<&'static str> {
    ext_from_mime(&image.content_type).ok_or_else(|| {
        AppError::Validation(format!("{field} must be a jpeg, png, webp or heic image"))
    })
}

/// Fresh stem for an object key: 32 hex characters.
pub fn generated_stem() -> String {
    Uuid::new_v4().simple().to_string()
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::storage::LocalStorage;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn generated_keys_fit_the_image_column() {
        let stem = generated_stem();
        assert_eq!(stem.len(), 32);
        assert!(format!("images/{stem}.webp").len() <= 50);
    }

    #[tokio::test]
    async fn upload_writes_under_generated_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = upload_image(
            &storage,
            "avatars",
            "7",
            "avatar",
            UploadItem {
                body: Bytes::from_static(b"img"),
                content_type: "image/png".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(key, "avatars/7.png");
        assert!(dir.path().join("avatars/7.png").exists());
    }

    #[tokio::test]
    async fn upload_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let err = upload_image(
            &storage,
            "images",
            "x",
            "item_img",
            UploadItem {
                body: Bytes::from_static(b"#!/bin/sh"),
                content_type: "text/x-shellscript".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
