// ABOUTME: Input validation for discovery queries and image attachments
// ABOUTME: Rejects empty sends and unsupported or oversized uploads before any I/O

use thiserror::Error;

use crate::constants::ALLOWED_IMAGE_TYPES;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("A message or an image is required")]
    EmptyQuery,

    #[error("Unsupported image type: {0}. Must be one of: {1}")]
    UnsupportedImageType(String, String),

    #[error("Image is {size} bytes, exceeding the {limit} byte limit")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Image is empty")]
    EmptyImage,
}

/// A staged upload. Exists only between selection and send.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    bytes: Vec<u8>,
    content_type: String,
}

impl ImageAttachment {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Validate an image selection and turn it into a staged attachment
pub fn validate_image(
    bytes: Vec<u8>,
    content_type: &str,
    max_bytes: usize,
) -> Result<ImageAttachment, ValidationError> {
    // Strip parameters such as "; charset=binary"
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
        return Err(ValidationError::UnsupportedImageType(
            content_type.to_string(),
            ALLOWED_IMAGE_TYPES.join(", "),
        ));
    }

    if bytes.is_empty() {
        return Err(ValidationError::EmptyImage);
    }

    if bytes.len() > max_bytes {
        return Err(ValidationError::ImageTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    Ok(ImageAttachment {
        bytes,
        content_type: mime,
    })
}

/// Trim an utterance; an empty utterance is only acceptable alongside an image
pub fn validate_utterance(utterance: &str, has_image: bool) -> Result<String, ValidationError> {
    let trimmed = utterance.trim();
    if trimmed.is_empty() && !has_image {
        return Err(ValidationError::EmptyQuery);
    }
    Ok(trimmed.to_string())
}
