//! Wish submissions and moderation
//!
//! New wishes land as pending; admins approve or reject them and only
//! approved wishes reach the public wall. Cached to LocalStorage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::{MediaCategory, MediaDescriptor};

/// Longest accepted name (characters)
pub const MAX_NAME_LEN: usize = 100;
/// Longest accepted message (characters)
pub const MAX_MESSAGE_LEN: usize = 1000;
/// Longest accepted org/city/contact (characters)
pub const MAX_FIELD_LEN: usize = 200;

/// What kind of wish was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishKind {
    Video,
    Photo,
    Audio,
    Text,
}

impl WishKind {
    /// Media the wish must carry (`None` for text)
    pub fn media_category(&self) -> Option<MediaCategory> {
        match self {
            WishKind::Video => Some(MediaCategory::Video),
            WishKind::Photo => Some(MediaCategory::Image),
            WishKind::Audio => Some(MediaCategory::Audio),
            WishKind::Text => None,
        }
    }
}

/// Moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Submission and moderation failures (Display is shown to the visitor)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WishError {
    #[error("Please enter your name.")]
    NameRequired,
    #[error("Please agree to have your wish shown on the site.")]
    ConsentRequired,
    #[error("Please write a message.")]
    MessageRequired,
    #[error("Please attach your {0}.")]
    MediaRequired(&'static str),
    #[error("The attached file is not a {expected}.")]
    MediaMismatch { expected: &'static str },
    #[error("{field} is too long (max {max} characters).")]
    TooLong { field: &'static str, max: usize },
    #[error("Wish {0} not found.")]
    NotFound(u64),
}

/// A wish as submitted by a visitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWish {
    #[serde(rename = "type")]
    pub kind: WishKind,
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    pub consent: bool,
    #[serde(default)]
    pub media: Option<MediaDescriptor>,
}

fn check_len(value: Option<&str>, field: &'static str, max: usize) -> Result<(), WishError> {
    match value {
        Some(v) if v.chars().count() > max => Err(WishError::TooLong { field, max }),
        _ => Ok(()),
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl NewWish {
    pub fn validate(&self) -> Result<(), WishError> {
        if self.name.trim().is_empty() {
            return Err(WishError::NameRequired);
        }
        if !self.consent {
            return Err(WishError::ConsentRequired);
        }
        check_len(Some(&self.name), "Name", MAX_NAME_LEN)?;
        check_len(self.message.as_deref(), "Message", MAX_MESSAGE_LEN)?;
        check_len(self.org.as_deref(), "Organisation", MAX_FIELD_LEN)?;
        check_len(self.city.as_deref(), "City", MAX_FIELD_LEN)?;
        check_len(self.contact.as_deref(), "Contact", MAX_FIELD_LEN)?;

        match self.kind.media_category() {
            None => {
                if !non_blank(&self.message) {
                    return Err(WishError::MessageRequired);
                }
            }
            Some(expected) => match &self.media {
                None => return Err(WishError::MediaRequired(expected.as_str())),
                Some(media) if media.file_type != expected => {
                    return Err(WishError::MediaMismatch {
                        expected: expected.as_str(),
                    });
                }
                Some(_) => {}
            },
        }
        Ok(())
    }
}

/// A stored wish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub id: u64,
    #[serde(flatten)]
    pub submission: NewWish,
    #[serde(default)]
    pub status: WishStatus,
    /// Unix timestamp (ms) when submitted
    pub created_at: f64,
}

/// Moderated storage for wishes
pub trait SubmissionStore {
    /// Validate and store a new wish as pending
    fn create(&mut self, wish: NewWish, now: f64) -> Result<Wish, WishError>;
    /// Wishes with `status`, newest first
    fn by_status(&self, status: WishStatus) -> Vec<Wish>;
    fn set_status(&mut self, id: u64, status: WishStatus) -> Result<(), WishError>;
    fn delete(&mut self, id: u64) -> Result<Wish, WishError>;
}

/// Per-status totals for the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// In-memory wish store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WishBook {
    /// Sorted newest first
    pub entries: Vec<Wish>,
    #[serde(default)]
    next_id: u64,
}

impl WishBook {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "birthday_wishes";

    pub fn new() -> Self {
        Self::default()
    }

    /// Approved wishes for the public wall
    pub fn wall(&self) -> Vec<Wish> {
        self.by_status(WishStatus::Approved)
    }

    pub fn counts(&self) -> StatusCounts {
        self.entries
            .iter()
            .fold(StatusCounts::default(), |mut counts, wish| {
                match wish.status {
                    WishStatus::Pending => counts.pending += 1,
                    WishStatus::Approved => counts.approved += 1,
                    WishStatus::Rejected => counts.rejected += 1,
                }
                counts
            })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load cached wishes from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        use crate::platform::storage::{load_json, local_storage};

        if let Some(book) = local_storage().and_then(|s| load_json::<WishBook>(&s, Self::STORAGE_KEY)) {
            log::info!("Loaded {} wishes", book.entries.len());
            return book;
        }
        log::info!("No cached wishes, starting fresh");
        Self::new()
    }

    /// Save wishes to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        use crate::platform::storage::{local_storage, save_json};

        if let Some(storage) = local_storage() {
            if save_json(&storage, Self::STORAGE_KEY, self) {
                log::info!("Wishes saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

impl SubmissionStore for WishBook {
    fn create(&mut self, wish: NewWish, now: f64) -> Result<Wish, WishError> {
        wish.validate()?;

        // Caches written without a counter still hold ids
        let highest = self.entries.iter().map(|w| w.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(highest) + 1;
        let stored = Wish {
            id: self.next_id,
            submission: wish,
            status: WishStatus::Pending,
            created_at: now,
        };

        // Keep newest first; equal timestamps keep submission order
        let pos = self
            .entries
            .iter()
            .position(|w| now > w.created_at)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, stored.clone());

        log::info!("Wish {} received ({:?})", stored.id, stored.submission.kind);
        Ok(stored)
    }

    fn by_status(&self, status: WishStatus) -> Vec<Wish> {
        self.entries
            .iter()
            .filter(|w| w.status == status)
            .cloned()
            .collect()
    }

    fn set_status(&mut self, id: u64, status: WishStatus) -> Result<(), WishError> {
        let wish = self
            .entries
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(WishError::NotFound(id))?;
        wish.status = status;
        log::info!("Wish {id} marked {status:?}");
        Ok(())
    }

    fn delete(&mut self, id: u64) -> Result<Wish, WishError> {
        let pos = self
            .entries
            .iter()
            .position(|w| w.id == id)
            .ok_or(WishError::NotFound(id))?;
        log::info!("Wish {id} deleted");
        Ok(self.entries.remove(pos))
    }
}
