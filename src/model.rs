use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::error::{Error, FetchError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum ProjectStatus {
    #[serde(alias = "Completato")]
    Completed,
    #[serde(rename = "In-Progress", alias = "In Progress", alias = "InProgress", alias = "In Corso")]
    InProgress,
    #[serde(alias = "Concettuale")]
    Conceptual,
    #[serde(alias = "Da fare", alias = "To Do")]
    Todo,
}

/// One portfolio project as stored by the admin backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    /// Remote URL, `data:` URI or local path of the cover image.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: f64,
    pub status: ProjectStatus,
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    Full,
    Compact,
    TextOnly,
}

impl Layout {
    pub const ALL: [Layout; 3] = [Layout::Full, Layout::Compact, Layout::TextOnly];

    /// Name used in the output file name.
    pub fn name(self) -> &'static str {
        match self {
            Layout::Full => "Full",
            Layout::Compact => "Compact",
            Layout::TextOnly => "TextOnly",
        }
    }

    pub fn items_per_page(self) -> Option<usize> {
        match self {
            Layout::Full => Some(3),
            Layout::Compact => Some(6),
            Layout::TextOnly => None,
        }
    }

    pub fn wants_images(self) -> bool {
        !matches!(self, Layout::TextOnly)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Layout::Full),
            "compact" => Ok(Layout::Compact),
            "text-only" | "textonly" | "text_only" => Ok(Layout::TextOnly),
            _ => Err(Error::UnknownLayout(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BitmapData {
    /// Baseline JPEG stream embedded as-is with DCTDecode.
    Jpeg { data: Vec<u8>, gray: bool },
    /// 8-bit RGB samples, row-major, plus an optional 8-bit alpha plane.
    Rgb { samples: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub data: BitmapData,
}

#[derive(Clone, Debug)]
pub enum ImageSlot {
    /// The layout never shows images, so nothing was fetched.
    Skipped,
    Loaded(Bitmap),
    Failed(FetchError),
}

#[derive(Clone, Debug)]
pub struct NormalizedRecord {
    pub record: ProjectRecord,
    pub image: ImageSlot,
}

impl NormalizedRecord {
    pub fn without_image(record: ProjectRecord) -> Self {
        Self {
            record,
            image: ImageSlot::Skipped,
        }
    }
}
