//! Upload planning and validation
//!
//! Media goes to the host in fixed-size chunks. This module decides the
//! chunk ranges, enforces per-category ceilings and turns the host's reply
//! into a [`MediaDescriptor`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MB: u64 = 1024 * 1024;

/// Bytes per chunk (the media host rejects non-final chunks under 5 MB)
pub const CHUNK_SIZE: u64 = 6 * MB;

/// Kind of media being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Video,
    Audio,
    Image,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Video => "video",
            MediaCategory::Audio => "audio",
            MediaCategory::Image => "image",
        }
    }

    /// Largest accepted file, in bytes
    pub fn max_bytes(&self) -> u64 {
        match self {
            MediaCategory::Video => 100 * MB,
            MediaCategory::Audio => 25 * MB,
            MediaCategory::Image => 10 * MB,
        }
    }

    /// Guess the category from a MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        let major = mime.split('/').next()?.trim().to_ascii_lowercase();
        match major.as_str() {
            "video" => Some(MediaCategory::Video),
            "audio" => Some(MediaCategory::Audio),
            "image" => Some(MediaCategory::Image),
            _ => None,
        }
    }

    /// Resource type segment of the host's upload endpoint
    pub fn resource_type(&self) -> &'static str {
        match self {
            // The host files audio under video
            MediaCategory::Video | MediaCategory::Audio => "video",
            MediaCategory::Image => "image",
        }
    }
}

/// Upload failures (Display is shown to the visitor)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UploadError {
    #[error("The file is empty.")]
    Empty,
    #[error("This {category} is too large ({size_mb:.1} MB). The limit is {limit_mb} MB.")]
    TooLarge {
        category: &'static str,
        size_mb: f64,
        limit_mb: u64,
    },
    #[error("Upload failed: {0}")]
    Network(String),
    #[error("The media host rejected the upload: {0}")]
    Rejected(String),
    #[error("Unexpected response from the media host.")]
    BadResponse,
}

/// Inclusive byte range of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: u64,
    /// Inclusive
    pub end: u64,
}

impl ChunkRange {
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// A validated upload split into chunks
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPlan {
    pub category: MediaCategory,
    pub total: u64,
    pub chunks: Vec<ChunkRange>,
}

impl UploadPlan {
    pub fn new(category: MediaCategory, size: u64) -> Result<Self, UploadError> {
        Self::with_chunk_size(category, size, CHUNK_SIZE)
    }

    pub fn with_chunk_size(
        category: MediaCategory,
        size: u64,
        chunk_size: u64,
    ) -> Result<Self, UploadError> {
        if size == 0 {
            return Err(UploadError::Empty);
        }
        let limit = category.max_bytes();
        if size > limit {
            return Err(UploadError::TooLarge {
                category: category.as_str(),
                size_mb: size as f64 / MB as f64,
                limit_mb: limit / MB,
            });
        }

        let chunk_size = chunk_size.max(1);
        let chunks = (0..size.div_ceil(chunk_size))
            .map(|i| {
                let start = i * chunk_size;
                ChunkRange {
                    start,
                    end: (start + chunk_size).min(size) - 1,
                }
            })
            .collect();

        Ok(Self {
            category,
            total: size,
            chunks,
        })
    }

    /// Fraction transferred after `bytes_done` bytes, in `[0, 1]`
    pub fn progress(&self, bytes_done: u64) -> f64 {
        (bytes_done as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Stored media, as recorded on a wish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub file_url: String,
    pub file_type: MediaCategory,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Final reply from the media host
#[derive(Debug, Clone, Deserialize)]
pub struct HostResponse {
    pub secure_url: Option<String>,
    pub bytes: Option<u64>,
    pub duration: Option<f64>,
    pub error: Option<HostError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostError {
    pub message: String,
}

impl HostResponse {
    pub fn parse(json: &str) -> Result<Self, UploadError> {
        serde_json::from_str(json).map_err(|_| UploadError::BadResponse)
    }

    /// Convert to a descriptor for the planned upload
    pub fn into_descriptor(self, plan: &UploadPlan) -> Result<MediaDescriptor, UploadError> {
        if let Some(error) = self.error {
            return Err(UploadError::Rejected(error.message));
        }
        let file_url = self.secure_url.ok_or(UploadError::BadResponse)?;
        let thumbnail_url = match plan.category {
            MediaCategory::Video => video_thumbnail(&file_url),
            _ => None,
        };
        Ok(MediaDescriptor {
            file_size: self.bytes.unwrap_or(plan.total),
            file_type: plan.category,
            duration: self.duration,
            thumbnail_url,
            file_url,
        })
    }
}

/// Poster frame URL for a delivered video (same path, `.jpg` extension)
pub fn video_thumbnail(url: &str) -> Option<String> {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let dot = path[file_start..].rfind('.')? + file_start;
    let mut thumb = format!("{}.jpg", &path[..dot]);
    if let Some(query) = query {
        thumb.push('?');
        thumb.push_str(query);
    }
    Some(thumb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_chunks_cover_file() {
        let plan = UploadPlan::with_chunk_size(MediaCategory::Video, 25, 10).unwrap();
        assert_eq!(
            plan.chunks,
            vec![
                ChunkRange { start: 0, end: 9 },
                ChunkRange { start: 10, end: 19 },
                ChunkRange { start: 20, end: 24 },
            ]
        );
        assert_eq!(plan.chunks.iter().map(ChunkRange::len).sum::<u64>(), 25);
        assert_eq!(plan.chunks[2].content_range(25), "bytes 20-24/25");
    }

    #[test]
    fn test_plan_exact_multiple() {
        let plan = UploadPlan::new(MediaCategory::Video, 2 * CHUNK_SIZE).unwrap();
        assert_eq!(plan.chunks.len(), 2);
        assert_eq!(plan.chunks[1].end, 2 * CHUNK_SIZE - 1);
    }

    #[test]
    fn test_size_ceilings() {
        assert_eq!(
            UploadPlan::new(MediaCategory::Image, 0),
            Err(UploadError::Empty)
        );
        assert!(UploadPlan::new(MediaCategory::Image, 10 * MB).is_ok());
        let err = UploadPlan::new(MediaCategory::Image, 10 * MB + 1).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { limit_mb: 10, .. }));
        assert!(err.to_string().contains("image"));
        assert!(UploadPlan::new(MediaCategory::Audio, 26 * MB).is_err());
        assert!(UploadPlan::new(MediaCategory::Video, 99 * MB).is_ok());
    }

    #[test]
    fn test_progress_clamped() {
        let plan = UploadPlan::new(MediaCategory::Audio, 1000).unwrap();
        assert_eq!(plan.progress(0), 0.0);
        assert_eq!(plan.progress(500), 0.5);
        assert_eq!(plan.progress(5000), 1.0);
    }

    #[test]
    fn test_category_from_mime() {
        assert_eq!(MediaCategory::from_mime("video/webm"), Some(MediaCategory::Video));
        assert_eq!(MediaCategory::from_mime("Audio/ogg"), Some(MediaCategory::Audio));
        assert_eq!(MediaCategory::from_mime("image/png"), Some(MediaCategory::Image));
        assert_eq!(MediaCategory::from_mime("text/plain"), None);
    }

    #[test]
    fn test_response_to_descriptor() {
        let plan = UploadPlan::new(MediaCategory::Video, 2048).unwrap();
        let response = HostResponse::parse(
            r#"{"secure_url":"https://media.example/v1/wish.webm","bytes":2048,"duration":12.5}"#,
        )
        .unwrap();
        let descriptor = response.into_descriptor(&plan).unwrap();
        assert_eq!(descriptor.file_url, "https://media.example/v1/wish.webm");
        assert_eq!(descriptor.file_type, MediaCategory::Video);
        assert_eq!(descriptor.duration, Some(12.5));
        assert_eq!(
            descriptor.thumbnail_url.as_deref(),
            Some("https://media.example/v1/wish.jpg")
        );
    }

    #[test]
    fn test_host_error_rejected() {
        let plan = UploadPlan::new(MediaCategory::Image, 10).unwrap();
        let response = HostResponse::parse(r#"{"error":{"message":"Invalid image file"}}"#).unwrap();
        assert_eq!(
            response.into_descriptor(&plan),
            Err(UploadError::Rejected("Invalid image file".into()))
        );
        assert!(matches!(
            HostResponse::parse("not json"),
            Err(UploadError::BadResponse)
        ));
    }

    #[test]
    fn test_video_thumbnail() {
        assert_eq!(
            video_thumbnail("https://h/a.b/clip.mp4?x=1").as_deref(),
            Some("https://h/a.b/clip.jpg?x=1")
        );
        assert_eq!(video_thumbnail("https://h/a.b/clip"), None);
    }

    #[test]
    fn test_descriptor_json_shape() {
        let descriptor = MediaDescriptor {
            file_url: "u".into(),
            file_type: MediaCategory::Audio,
            file_size: 3,
            duration: None,
            thumbnail_url: None,
        };
        let json = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(json, r#"{"file_url":"u","file_type":"audio","file_size":3}"#);
    }
}
