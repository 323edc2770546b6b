use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};

use super::services::UploadItem;
use crate::error::{AppError, AppResult};

/// A multipart form read into memory: text fields and uploaded files by name.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadItem>,
}

fn malformed(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("malformed form data: {e}"))
}

impl Form {
    pub async fn read(mut mp: Multipart) -> AppResult<Self> {
        let mut form = Form::default();
        while let Some(field) = mp.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(malformed)?;
                // browsers send an empty part for an untouched file input
                if !body.is_empty() {
                    form.files.insert(name, UploadItem { body, content_type });
                }
            } else {
                let text = field.text().await.map_err(malformed)?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    /// Text value of `name`; missing fields read as empty.
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadItem> {
        self.files.remove(name)
    }
}

#[async_trait]
impl<S> FromRequest<S> for Form
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mp = Multipart::from_request(req, state).await?;
        Self::read(mp).await
    }
}
