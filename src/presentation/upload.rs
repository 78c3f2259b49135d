// Multipart upload parsing and image checks
use crate::domain::error::ValidationError;
use crate::infrastructure::http_response::ApiError;
use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;

/// Extensions accepted by the disease detector
pub const DETECT_EXTENSIONS: [&str; 5] = ["bmp", "jpeg", "jpg", "png", "webp"];

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    /// Content type must be `image/*`, the file non-empty and within `max_bytes`
    pub fn validate_image(&self, max_bytes: usize) -> Result<(), ValidationError> {
        let content_type = self.content_type.as_deref().unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ValidationError::NotAnImage(if content_type.is_empty() {
                "none".to_string()
            } else {
                content_type.to_string()
            }));
        }
        self.validate_size(max_bytes)
    }

    pub fn validate_size(&self, max_bytes: usize) -> Result<(), ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }
        if self.bytes.len() > max_bytes {
            return Err(ValidationError::FileTooLarge {
                size: self.bytes.len(),
                limit: max_bytes,
            });
        }
        Ok(())
    }

    /// Lowercase extension of the file name when it is one the detector reads
    pub fn detect_extension(&self) -> Result<String, ValidationError> {
        let extension = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if DETECT_EXTENSIONS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(ValidationError::UnsupportedExtension(
                DETECT_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            ))
        }
    }
}

/// The `file` part plus every other field as text
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<ImageUpload>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "file" {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                form.file = Some(ImageUpload {
                    bytes,
                    file_name,
                    content_type,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self) -> Result<ImageUpload, ValidationError> {
        self.file.take().ok_or(ValidationError::MissingField("file"))
    }

    /// A text field that is present and not blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn float(&self, name: &'static str) -> Result<Option<f64>, ValidationError> {
        self.text(name)
            .map(|value| {
                value.parse::<f64>().map_err(|_| ValidationError::InvalidField {
                    field: name,
                    reason: format!("'{value}' is not a number"),
                })
            })
            .transpose()
    }
}
