use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// File types accepted for upload.
///
/// `Jpg` and `Jpeg` name the same content format; they are kept apart because the
/// caller's declared spelling is what gets stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Pdf,
    Png,
    Jpg,
    Jpeg,
}

impl FileType {
    /// Still-image types in the order the detector tries them.
    pub const IMAGE_PREFERENCE: [FileType; 3] = [FileType::Png, FileType::Jpg, FileType::Jpeg];

    /// True when both types describe the same content format (JPG == JPEG).
    pub fn same_format(&self, other: &FileType) -> bool {
        matches!(
            (self, other),
            (FileType::Pdf, FileType::Pdf)
                | (FileType::Png, FileType::Png)
                | (FileType::Jpg | FileType::Jpeg, FileType::Jpg | FileType::Jpeg)
        )
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileType::Pdf => write!(f, "PDF"),
            FileType::Png => write!(f, "PNG"),
            FileType::Jpg => write!(f, "JPG"),
            FileType::Jpeg => write!(f, "JPEG"),
        }
    }
}

impl FromStr for FileType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PDF" => Ok(FileType::Pdf),
            "PNG" => Ok(FileType::Png),
            "JPG" => Ok(FileType::Jpg),
            "JPEG" => Ok(FileType::Jpeg),
            _ => Err(anyhow::anyhow!("Invalid file type: {}", s)),
        }
    }
}

/// Stored record for one uploaded file and its derived variants.
///
/// `raw_payload` and `file_type` never change after creation. `processed_variants` is
/// either empty or the complete output of one successful conversion run; it is only
/// ever replaced as a whole.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub file_type: FileType,
    pub raw_payload: Bytes,
    pub processed_variants: Vec<Bytes>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the submission path; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewMediaItem {
    pub file_name: Option<String>,
    pub file_type: FileType,
    pub raw_payload: Bytes,
}

impl NewMediaItem {
    pub fn into_item(self, id: Uuid, now: DateTime<Utc>) -> MediaItem {
        MediaItem {
            id,
            file_name: self.file_name,
            file_type: self.file_type,
            raw_payload: self.raw_payload,
            processed_variants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Which payloads a retrieval request wants back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    Raw,
    Processed,
    All,
}

impl MediaSource {
    pub fn includes_raw(&self) -> bool {
        matches!(self, MediaSource::Raw | MediaSource::All)
    }

    pub fn includes_processed(&self) -> bool {
        matches!(self, MediaSource::Processed | MediaSource::All)
    }
}

impl Display for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaSource::Raw => write!(f, "raw"),
            MediaSource::Processed => write!(f, "processed"),
            MediaSource::All => write!(f, "all"),
        }
    }
}

impl FromStr for MediaSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(MediaSource::Raw),
            "processed" => Ok(MediaSource::Processed),
            "all" => Ok(MediaSource::All),
            _ => Err(anyhow::anyhow!("Invalid media source: {}", s)),
        }
    }
}

/// Bounded, validated view of a media item produced by partial retrieval.
///
/// Payloads are still raw bytes here; the transport layer decides how to encode them.
#[derive(Debug, Clone)]
pub struct MediaView {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub file_type: FileType,
    pub indices: Vec<i64>,
    pub processed_total_count: usize,
    pub processed_count: usize,
    pub raw_payload: Option<Bytes>,
    pub processed_variants: Option<Vec<Bytes>>,
}
