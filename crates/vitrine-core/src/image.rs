//! Image blob model

use serde::{Deserialize, Serialize};

/// MIME-type tag for stored image blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Jpeg,
    Png,
}

impl ImageType {
    /// Map a MIME type to the stored tag
    ///
    /// Anything under `image/` that is not JPEG is treated as PNG.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/jpeg") {
            ImageType::Jpeg
        } else {
            ImageType::Png
        }
    }

    /// Parse the database tag form
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "jpeg" => Some(ImageType::Jpeg),
            "png" => Some(ImageType::Png),
            _ => None,
        }
    }

    /// Database tag form
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Jpeg => "jpeg",
            ImageType::Png => "png",
        }
    }

    /// Full MIME type for serving
    pub fn as_mime(&self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
        }
    }
}

/// A persisted image blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub id: i64,
    pub data: Vec<u8>,
    pub image_type: ImageType,
}

/// A decoded image payload that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub data: Vec<u8>,
    pub image_type: ImageType,
}

impl NewImage {
    pub fn new(data: Vec<u8>, image_type: ImageType) -> Self {
        Self { data, image_type }
    }
}
