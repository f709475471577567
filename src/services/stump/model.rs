//! Record shapes of the Stump GraphQL schema

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mediaserver::{MediaServerBookId, MediaServerLibraryId, MediaServerSeriesId};

macro_rules! stump_id {
    ($name:ident, $domain:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&$domain> for $name {
            fn from(id: &$domain) -> Self {
                Self(id.0.clone())
            }
        }

        impl From<$name> for $domain {
            fn from(id: $name) -> Self {
                $domain(id.0)
            }
        }
    };
}

stump_id!(StumpLibraryId, MediaServerLibraryId);
stump_id!(StumpSeriesId, MediaServerSeriesId);
stump_id!(StumpMediaId, MediaServerBookId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpTag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpThumbnailConfig {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub quality: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StumpLibraryConfig {
    pub convert_rar_to_zip: bool,
    pub hard_delete_conversions: bool,
    pub generate_file_hashes: bool,
    pub process_metadata: bool,
    pub thumbnail_config: Option<StumpThumbnailConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpLibrary {
    pub id: StumpLibraryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub path: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<StumpTag>,
    #[serde(default)]
    pub config: Option<StumpLibraryConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpSeriesMetadata {
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub age_rating: Option<i32>,
    #[serde(default)]
    pub booktype: Option<String>,
    #[serde(default)]
    pub comicid: Option<i32>,
    #[serde(default)]
    pub imprint: Option<String>,
    #[serde(default)]
    pub meta_type: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub volume: Option<i32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub writers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpSeries {
    pub id: StumpSeriesId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub path: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub library_id: StumpLibraryId,
    #[serde(default)]
    pub media_count: i32,
    #[serde(default)]
    pub tags: Vec<StumpTag>,
    #[serde(default)]
    pub metadata: Option<StumpSeriesMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpMediaMetadata {
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub age_rating: Option<i32>,
    #[serde(default)]
    pub day: Option<i32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub month: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_sort: Option<String>,
    #[serde(default)]
    pub volume: Option<i32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub identifier_isbn: Option<String>,
    #[serde(default)]
    pub writers: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub colorists: Vec<String>,
    #[serde(default)]
    pub cover_artists: Vec<String>,
    #[serde(default)]
    pub editors: Vec<String>,
    #[serde(default)]
    pub inkers: Vec<String>,
    #[serde(default)]
    pub letterers: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub pencillers: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
}

/// Series summary selected alongside a media record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpMediaSeriesSelection {
    pub id: StumpSeriesId,
    pub name: String,
    pub resolved_name: String,
    #[serde(default)]
    pub metadata: Option<StumpSeriesMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpMedia {
    pub id: StumpMediaId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub path: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub pages: i32,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub series_id: StumpSeriesId,
    #[serde(default)]
    pub library_id: Option<StumpLibraryId>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub series_position: i32,
    #[serde(default)]
    pub metadata: Option<StumpMediaMetadata>,
    #[serde(default)]
    pub series: Option<StumpMediaSeriesSelection>,
}

/// Media record with its parent series' summary fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StumpMediaWithSeries {
    #[serde(flatten)]
    pub media: StumpMedia,
}

impl StumpMediaWithSeries {
    pub fn series(&self) -> Option<&StumpMediaSeriesSelection> {
        self.media.series.as_ref()
    }
}

/// `OffsetPaginationInfo` as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpPaginationInfo {
    pub total_pages: i32,
    #[serde(default)]
    pub total_items: Option<i64>,
    pub current_page: i32,
    pub page_size: i32,
    #[serde(default)]
    pub page_offset: i32,
    #[serde(default)]
    pub zero_based: Option<bool>,
}

impl StumpPaginationInfo {
    /// `zeroBased` does not shift either bound.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }
}

/// One page of records plus derived navigation flags
#[derive(Debug, Clone, PartialEq)]
pub struct StumpPage<T> {
    pub content: Vec<T>,
    pub total_pages: Option<i32>,
    pub total_elements: Option<i64>,
    pub current_page: i32,
    pub page_size: i32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> StumpPage<T> {
    /// Build a page from the server's pagination info, falling back to the
    /// requested page/size when the server did not report any.
    pub fn from_nodes(
        content: Vec<T>,
        page_info: Option<StumpPaginationInfo>,
        requested_page: i32,
        requested_size: i32,
    ) -> Self {
        match page_info {
            Some(info) => Self {
                content,
                total_pages: Some(info.total_pages),
                total_elements: info.total_items,
                current_page: info.current_page,
                page_size: info.page_size,
                has_next: info.has_next(),
                has_previous: info.has_previous(),
            },
            None => Self {
                content,
                total_pages: None,
                total_elements: None,
                current_page: requested_page,
                page_size: requested_size,
                has_next: false,
                has_previous: false,
            },
        }
    }
}
