//! Vendor-neutral media server records

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($name:ident) => {
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

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(MediaServerLibraryId);
string_id!(MediaServerSeriesId);
string_id!(MediaServerBookId);
string_id!(MediaServerThumbnailId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaServerLibrary {
    pub id: MediaServerLibraryId,
    pub name: String,
    pub roots: Vec<String>,
}

/// Publication status of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesStatus {
    Ongoing,
    Completed,
    Abandoned,
    Hiatus,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaServerAuthor {
    pub name: String,
    pub role: String,
}

impl MediaServerAuthor {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaServerSeriesMetadata {
    pub status: SeriesStatus,
    pub title: String,
    pub title_sort: String,
    pub alternative_titles: Vec<String>,
    pub summary: String,
    pub publisher: Option<String>,
    pub age_rating: Option<i32>,
    pub language: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub total_book_count: Option<i32>,
    pub authors: Vec<MediaServerAuthor>,
    pub release_year: Option<i32>,
    pub links: Vec<WebLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaServerSeries {
    pub id: MediaServerSeriesId,
    pub library_id: MediaServerLibraryId,
    pub name: String,
    pub books_count: i32,
    pub metadata: MediaServerSeriesMetadata,
    pub url: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaServerBookMetadata {
    pub title: String,
    pub summary: Option<String>,
    pub number: String,
    pub number_sort: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub authors: Vec<MediaServerAuthor>,
    pub tags: Vec<String>,
    pub isbn: Option<String>,
    pub links: Vec<WebLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaServerBook {
    pub id: MediaServerBookId,
    pub series_id: MediaServerSeriesId,
    pub library_id: Option<MediaServerLibraryId>,
    pub series_title: String,
    pub name: String,
    pub url: String,
    pub number: i32,
    pub oneshot: bool,
    pub metadata: MediaServerBookMetadata,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaServerSeriesThumbnail {
    pub id: MediaServerThumbnailId,
    pub series_id: MediaServerSeriesId,
    pub kind: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaServerBookThumbnail {
    pub id: MediaServerThumbnailId,
    pub book_id: MediaServerBookId,
    pub kind: String,
    pub selected: bool,
}

/// Raw image bytes with the content type reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page_number: i32,
    pub total_elements: Option<i64>,
    pub total_pages: Option<i32>,
}

/// Series metadata changes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaServerSeriesMetadataUpdate {
    pub status: Option<SeriesStatus>,
    pub title: Option<String>,
    pub title_sort: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub age_rating: Option<i32>,
    pub genres: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub authors: Option<Vec<MediaServerAuthor>>,
    pub links: Option<Vec<WebLink>>,
}

/// Book metadata changes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaServerBookMetadataUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub number: Option<String>,
    pub number_sort: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub authors: Option<Vec<MediaServerAuthor>>,
    pub tags: Option<Vec<String>>,
    pub isbn: Option<String>,
    pub links: Option<Vec<WebLink>>,
}
