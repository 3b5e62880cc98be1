use serde::{Deserialize, Serialize};

/// Media kind, classified from the MIME type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    /// `image/*`, `video/*` and `audio/*` map to their kind, anything else is a document.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let normalized = mime_type.trim().to_ascii_lowercase();
        if normalized.starts_with("image/") {
            MediaKind::Image
        } else if normalized.starts_with("video/") {
            MediaKind::Video
        } else if normalized.starts_with("audio/") {
            MediaKind::Audio
        } else {
            MediaKind::Document
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable reference to an uploaded file, stored on the parent entity.
///
/// Field names follow the entity API (`type`, `url`, `mimeType`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub mime_type: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}
