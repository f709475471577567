//! [MediaServerClient] implementation backed by [StumpClient]

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::client::{DEFAULT_PAGE_SIZE, StumpClient};
use super::model::{
    StumpLibrary, StumpLibraryId, StumpMedia, StumpMediaId, StumpMediaMetadata, StumpSeries,
    StumpSeriesId, StumpSeriesMetadata,
};
use super::request::{StumpMediaMetadataInput, StumpSeriesMetadataInput};
use crate::mediaserver::{
    Image, MediaServerAuthor, MediaServerBook, MediaServerBookId, MediaServerBookMetadata,
    MediaServerBookMetadataUpdate, MediaServerBookThumbnail, MediaServerClient, MediaServerLibrary,
    MediaServerLibraryId, MediaServerSeries, MediaServerSeriesId, MediaServerSeriesMetadata,
    MediaServerSeriesMetadataUpdate, MediaServerSeriesThumbnail, MediaServerThumbnailId, Page,
    SeriesStatus, WebLink,
};

const WRITER: &str = "WRITER";
const PENCILLER: &str = "PENCILLER";
const INKER: &str = "INKER";
const COLORIST: &str = "COLORIST";
const LETTERER: &str = "LETTERER";
const EDITOR: &str = "EDITOR";

const UNKNOWN_SERIES: &str = "Unknown Series";

/// Stump keeps one cover per item; it is reported under this thumbnail id.
const DEFAULT_THUMBNAIL_ID: &str = "default";

pub struct StumpMediaServerClientAdapter {
    client: Arc<StumpClient>,
}

impl StumpMediaServerClientAdapter {
    pub fn new(client: Arc<StumpClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn parse_series_status(status: Option<&str>) -> SeriesStatus {
    match status.map(str::to_lowercase).as_deref() {
        Some("completed") => SeriesStatus::Completed,
        Some("cancelled") | Some("abandoned") => SeriesStatus::Abandoned,
        Some("hiatus") => SeriesStatus::Hiatus,
        Some("ended") => SeriesStatus::Ended,
        _ => SeriesStatus::Ongoing,
    }
}

pub(crate) fn series_status_input(status: SeriesStatus) -> &'static str {
    match status {
        SeriesStatus::Ongoing => "ongoing",
        SeriesStatus::Completed => "completed",
        SeriesStatus::Abandoned => "cancelled",
        SeriesStatus::Hiatus => "hiatus",
        SeriesStatus::Ended => "ended",
    }
}

pub(crate) fn release_date(year: Option<i32>, month: Option<i32>, day: Option<i32>) -> Option<NaiveDate> {
    let month = u32::try_from(month.unwrap_or(1)).ok()?;
    let day = u32::try_from(day.unwrap_or(1)).ok()?;
    NaiveDate::from_ymd_opt(year?, month, day)
}

/// `1.0` renders as `1`, `1.5` stays `1.5`.
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

fn links(urls: &[String]) -> Vec<WebLink> {
    urls.iter()
        .map(|url| WebLink {
            label: url.clone(),
            url: url.clone(),
        })
        .collect()
}

fn file_stem(path: &str) -> Option<String> {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

fn names_with_role(authors: &Option<Vec<MediaServerAuthor>>, role: &str) -> Option<Vec<String>> {
    authors.as_ref().map(|authors| {
        authors
            .iter()
            .filter(|a| a.role.eq_ignore_ascii_case(role))
            .map(|a| a.name.clone())
            .collect()
    })
}

fn to_library(library: StumpLibrary) -> MediaServerLibrary {
    MediaServerLibrary {
        id: library.id.into(),
        name: library.name,
        roots: vec![library.path],
    }
}

fn series_metadata(metadata: &StumpSeriesMetadata, series: &StumpSeries) -> MediaServerSeriesMetadata {
    MediaServerSeriesMetadata {
        status: parse_series_status(metadata.status.as_deref()),
        title: metadata.title.clone().unwrap_or_else(|| series.name.clone()),
        title_sort: series.name.clone(),
        alternative_titles: Vec::new(),
        summary: metadata.summary.clone().unwrap_or_default(),
        publisher: metadata.publisher.clone(),
        age_rating: metadata.age_rating,
        language: None,
        genres: metadata.genres.clone(),
        tags: Vec::new(),
        total_book_count: None,
        authors: metadata
            .writers
            .iter()
            .map(|w| MediaServerAuthor::new(w.clone(), WRITER))
            .collect(),
        release_year: metadata.year,
        links: links(&metadata.links),
    }
}

fn default_series_metadata(series: &StumpSeries) -> MediaServerSeriesMetadata {
    MediaServerSeriesMetadata {
        status: SeriesStatus::Ongoing,
        title: series.name.clone(),
        title_sort: series.name.clone(),
        alternative_titles: Vec::new(),
        summary: series.description.clone().unwrap_or_default(),
        publisher: None,
        age_rating: None,
        language: None,
        genres: Vec::new(),
        tags: Vec::new(),
        total_book_count: (series.media_count > 0).then_some(series.media_count),
        authors: Vec::new(),
        release_year: None,
        links: Vec::new(),
    }
}

pub(crate) fn to_series(series: StumpSeries) -> MediaServerSeries {
    let metadata = match &series.metadata {
        Some(metadata) => series_metadata(metadata, &series),
        None => default_series_metadata(&series),
    };
    MediaServerSeries {
        id: series.id.into(),
        library_id: series.library_id.into(),
        name: series.name,
        books_count: series.media_count,
        metadata,
        url: series.path,
        deleted: false,
    }
}

fn book_metadata(metadata: &StumpMediaMetadata) -> MediaServerBookMetadata {
    let roles: [(&[String], &str); 6] = [
        (metadata.writers.as_slice(), WRITER),
        (metadata.pencillers.as_slice(), PENCILLER),
        (metadata.inkers.as_slice(), INKER),
        (metadata.colorists.as_slice(), COLORIST),
        (metadata.letterers.as_slice(), LETTERER),
        (metadata.editors.as_slice(), EDITOR),
    ];
    let authors = roles
        .iter()
        .flat_map(|(names, role)| {
            names
                .iter()
                .map(move |name| MediaServerAuthor::new(name.clone(), *role))
        })
        .collect();

    MediaServerBookMetadata {
        title: metadata.title.clone().unwrap_or_default(),
        summary: metadata.summary.clone(),
        number: metadata
            .number
            .map(format_number)
            .unwrap_or_else(|| "0".to_string()),
        number_sort: metadata.number.map(format_number),
        release_date: release_date(metadata.year, metadata.month, metadata.day),
        authors,
        tags: metadata.genres.clone(),
        isbn: metadata.identifier_isbn.clone(),
        links: links(&metadata.links),
    }
}

fn default_book_metadata(media: &StumpMedia) -> MediaServerBookMetadata {
    MediaServerBookMetadata {
        title: media.name.clone(),
        summary: media.description.clone(),
        number: media.series_position.to_string(),
        number_sort: Some(media.series_position.to_string()),
        release_date: None,
        authors: Vec::new(),
        tags: Vec::new(),
        isbn: None,
        links: Vec::new(),
    }
}

pub(crate) fn to_book(media: StumpMedia) -> MediaServerBook {
    let name = file_stem(&media.path).unwrap_or_else(|| media.name.clone());
    let number = media
        .metadata
        .as_ref()
        .and_then(|m| m.number)
        .map(|n| n as i32)
        .unwrap_or(media.series_position);
    let metadata = match &media.metadata {
        Some(metadata) => book_metadata(metadata),
        None => default_book_metadata(&media),
    };
    let series_title = media
        .series
        .as_ref()
        .map(|s| s.resolved_name.clone())
        .unwrap_or_else(|| UNKNOWN_SERIES.to_string());

    MediaServerBook {
        id: media.id.into(),
        series_id: media.series_id.into(),
        library_id: media.library_id.map(Into::into),
        series_title,
        name,
        url: media.path,
        number,
        oneshot: false,
        metadata,
        deleted: false,
    }
}

pub(crate) fn series_input(update: MediaServerSeriesMetadataUpdate) -> StumpSeriesMetadataInput {
    let writers = names_with_role(&update.authors, WRITER);
    StumpSeriesMetadataInput {
        title: update.title,
        summary: update.summary,
        publisher: update.publisher,
        status: update.status.map(|s| series_status_input(s).to_string()),
        age_rating: update.age_rating,
        genres: update.genres,
        links: update
            .links
            .map(|links| links.into_iter().map(|l| l.url).collect()),
        writers,
        ..Default::default()
    }
}

pub(crate) fn media_input(update: MediaServerBookMetadataUpdate) -> StumpMediaMetadataInput {
    let date = update.release_date;
    StumpMediaMetadataInput {
        title: update.title,
        summary: update.summary,
        number: update.number.as_deref().and_then(|n| n.trim().parse().ok()),
        year: date.map(|d| d.year()),
        month: date.map(|d| d.month() as i32),
        day: date.map(|d| d.day() as i32),
        writers: names_with_role(&update.authors, WRITER),
        pencillers: names_with_role(&update.authors, PENCILLER),
        inkers: names_with_role(&update.authors, INKER),
        colorists: names_with_role(&update.authors, COLORIST),
        letterers: names_with_role(&update.authors, LETTERER),
        editors: names_with_role(&update.authors, EDITOR),
        genres: update.tags,
        identifier_isbn: update.isbn,
        links: update
            .links
            .map(|links| links.into_iter().map(|l| l.url).collect()),
        ..Default::default()
    }
}

#[async_trait]
impl MediaServerClient for StumpMediaServerClientAdapter {
    async fn get_series(&self, series_id: &MediaServerSeriesId) -> Result<MediaServerSeries> {
        let series = self
            .client
            .get_series(&StumpSeriesId::from(series_id))
            .await
            .with_context(|| format!("Failed to fetch series {series_id}"))?;
        Ok(to_series(series))
    }

    async fn get_series_page(
        &self,
        library_id: &MediaServerLibraryId,
        page_number: i32,
    ) -> Result<Page<MediaServerSeries>> {
        let page = self
            .client
            .get_series_page(&StumpLibraryId::from(library_id), page_number, DEFAULT_PAGE_SIZE)
            .await
            .with_context(|| format!("Failed to fetch series of library {library_id}"))?;
        Ok(Page {
            page_number: page.current_page,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            content: page.content.into_iter().map(to_series).collect(),
        })
    }

    async fn get_series_thumbnail(&self, series_id: &MediaServerSeriesId) -> Result<Option<Image>> {
        match self.client.get_series_cover(&StumpSeriesId::from(series_id)).await {
            Ok(image) => Ok(Some(image)),
            Err(e) => {
                debug!(series_id = %series_id, error = %e, "No series cover");
                Ok(None)
            }
        }
    }

    async fn get_series_thumbnails(
        &self,
        series_id: &MediaServerSeriesId,
    ) -> Result<Vec<MediaServerSeriesThumbnail>> {
        let thumbnails = self
            .get_series_thumbnail(series_id)
            .await?
            .map(|_| MediaServerSeriesThumbnail {
                id: MediaServerThumbnailId::new(DEFAULT_THUMBNAIL_ID),
                series_id: series_id.clone(),
                kind: "generated".to_string(),
                selected: true,
            });
        Ok(thumbnails.into_iter().collect())
    }

    async fn get_book(&self, book_id: &MediaServerBookId) -> Result<MediaServerBook> {
        let media = self
            .client
            .get_media_with_series(&StumpMediaId::from(book_id))
            .await
            .with_context(|| format!("Failed to fetch book {book_id}"))?;
        Ok(to_book(media.media))
    }

    async fn get_books(&self, series_id: &MediaServerSeriesId) -> Result<Vec<MediaServerBook>> {
        let media = self
            .client
            .get_all_media(&StumpSeriesId::from(series_id))
            .await
            .with_context(|| format!("Failed to fetch books of series {series_id}"))?;
        Ok(media.into_iter().map(to_book).collect())
    }

    async fn get_book_thumbnails(
        &self,
        book_id: &MediaServerBookId,
    ) -> Result<Vec<MediaServerBookThumbnail>> {
        let thumbnails = self
            .get_book_thumbnail(book_id)
            .await?
            .map(|_| MediaServerBookThumbnail {
                id: MediaServerThumbnailId::new(DEFAULT_THUMBNAIL_ID),
                book_id: book_id.clone(),
                kind: "generated".to_string(),
                selected: true,
            });
        Ok(thumbnails.into_iter().collect())
    }

    async fn get_book_thumbnail(&self, book_id: &MediaServerBookId) -> Result<Option<Image>> {
        match self.client.get_media_cover(&StumpMediaId::from(book_id)).await {
            Ok(image) => Ok(Some(image)),
            Err(e) => {
                debug!(book_id = %book_id, error = %e, "No book cover");
                Ok(None)
            }
        }
    }

    async fn get_library(&self, library_id: &MediaServerLibraryId) -> Result<MediaServerLibrary> {
        let library = self
            .client
            .get_library(&StumpLibraryId::from(library_id))
            .await
            .with_context(|| format!("Failed to fetch library {library_id}"))?;
        Ok(to_library(library))
    }

    async fn get_libraries(&self) -> Result<Vec<MediaServerLibrary>> {
        let libraries = self
            .client
            .get_libraries()
            .await
            .context("Failed to fetch libraries")?;
        Ok(libraries.into_iter().map(to_library).collect())
    }

    async fn update_series_metadata(
        &self,
        series_id: &MediaServerSeriesId,
        metadata: MediaServerSeriesMetadataUpdate,
    ) -> Result<()> {
        self.client
            .update_series_metadata(&StumpSeriesId::from(series_id), &series_input(metadata))
            .await
            .with_context(|| format!("Failed to update metadata of series {series_id}"))
    }

    async fn delete_series_thumbnail(
        &self,
        series_id: &MediaServerSeriesId,
        thumbnail_id: &MediaServerThumbnailId,
    ) -> Result<()> {
        debug!(series_id = %series_id, thumbnail_id = %thumbnail_id, "Stump cannot delete series thumbnails, skipping");
        Ok(())
    }

    async fn update_book_metadata(
        &self,
        book_id: &MediaServerBookId,
        metadata: MediaServerBookMetadataUpdate,
    ) -> Result<()> {
        self.client
            .update_media_metadata(&StumpMediaId::from(book_id), &media_input(metadata))
            .await
            .with_context(|| format!("Failed to update metadata of book {book_id}"))
    }

    async fn delete_book_thumbnail(
        &self,
        book_id: &MediaServerBookId,
        thumbnail_id: &MediaServerThumbnailId,
    ) -> Result<()> {
        debug!(book_id = %book_id, thumbnail_id = %thumbnail_id, "Stump cannot delete book thumbnails, skipping");
        Ok(())
    }

    async fn reset_book_metadata(
        &self,
        book_id: &MediaServerBookId,
        book_name: &str,
        book_number: Option<i32>,
    ) -> Result<()> {
        debug!(book_id = %book_id, book_name, ?book_number, "Stump cannot reset book metadata, skipping");
        Ok(())
    }

    async fn reset_series_metadata(
        &self,
        series_id: &MediaServerSeriesId,
        series_name: &str,
    ) -> Result<()> {
        debug!(series_id = %series_id, series_name, "Stump cannot reset series metadata, skipping");
        Ok(())
    }

    async fn upload_series_thumbnail(
        &self,
        series_id: &MediaServerSeriesId,
        thumbnail: Image,
        _selected: bool,
        _lock: bool,
    ) -> Result<Option<MediaServerSeriesThumbnail>> {
        self.client
            .upload_series_cover(&StumpSeriesId::from(series_id), &thumbnail)
            .await
            .with_context(|| format!("Failed to upload cover of series {series_id}"))?;
        // the mutation does not report thumbnail metadata
        Ok(None)
    }

    async fn upload_book_thumbnail(
        &self,
        book_id: &MediaServerBookId,
        thumbnail: Image,
        _selected: bool,
        _lock: bool,
    ) -> Result<Option<MediaServerBookThumbnail>> {
        self.client
            .upload_media_cover(&StumpMediaId::from(book_id), &thumbnail)
            .await
            .with_context(|| format!("Failed to upload cover of book {book_id}"))?;
        Ok(None)
    }

    async fn refresh_metadata(
        &self,
        library_id: &MediaServerLibraryId,
        series_id: &MediaServerSeriesId,
    ) -> Result<()> {
        debug!(library_id = %library_id, series_id = %series_id, "Stump has no metadata refresh, skipping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn media(value: serde_json::Value) -> StumpMedia {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_series_status_mapping() {
        assert_eq!(parse_series_status(Some("Cancelled")), SeriesStatus::Abandoned);
        assert_eq!(parse_series_status(Some("abandoned")), SeriesStatus::Abandoned);
        assert_eq!(parse_series_status(Some("HIATUS")), SeriesStatus::Hiatus);
        assert_eq!(parse_series_status(Some("unknown")), SeriesStatus::Ongoing);
        assert_eq!(parse_series_status(None), SeriesStatus::Ongoing);
        assert_eq!(series_status_input(SeriesStatus::Abandoned), "cancelled");
    }

    #[test]
    fn test_release_date_defaults_month_and_day() {
        assert_eq!(release_date(Some(2020), None, None), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(release_date(Some(2020), Some(13), Some(1)), None);
        assert_eq!(release_date(None, Some(2), Some(3)), None);
    }

    #[test]
    fn test_book_without_metadata_uses_record_defaults() {
        let book = to_book(media(json!({
            "id": "42",
            "name": "Saga 001",
            "description": "First issue",
            "path": "/comics/Saga/Saga 001.cbz",
            "seriesId": "7",
            "seriesPosition": 3
        })));

        assert_eq!(book.name, "Saga 001");
        assert_eq!(book.number, 3);
        assert_eq!(book.series_title, UNKNOWN_SERIES);
        assert_eq!(book.library_id, None);
        assert_eq!(book.metadata.title, "Saga 001");
        assert_eq!(book.metadata.number, "3");
        assert_eq!(book.metadata.summary.as_deref(), Some("First issue"));
    }

    #[test]
    fn test_book_metadata_roles_and_number() {
        let book = to_book(media(json!({
            "id": "42",
            "name": "ignored",
            "path": "/comics/Saga/Saga 002.cbz",
            "seriesId": "7",
            "libraryId": "1",
            "seriesPosition": 9,
            "series": { "id": "7", "name": "saga", "resolvedName": "Saga" },
            "metadata": {
                "title": "Chapter Two",
                "number": 2.0,
                "year": 2012,
                "month": 4,
                "writers": ["Brian K. Vaughan"],
                "pencillers": ["Fiona Staples"],
                "links": ["https://example.com/saga"]
            }
        })));

        assert_eq!(book.name, "Saga 002");
        assert_eq!(book.number, 2);
        assert_eq!(book.series_title, "Saga");
        assert_eq!(book.metadata.number, "2");
        assert_eq!(book.metadata.release_date, NaiveDate::from_ymd_opt(2012, 4, 1));
        assert_eq!(
            book.metadata.authors,
            vec![
                MediaServerAuthor::new("Brian K. Vaughan", WRITER),
                MediaServerAuthor::new("Fiona Staples", PENCILLER),
            ]
        );
        assert_eq!(book.metadata.links[0].label, "https://example.com/saga");
    }

    #[test]
    fn test_series_without_metadata() {
        let series: StumpSeries = serde_json::from_value(json!({
            "id": "7",
            "name": "Saga",
            "path": "/comics/Saga",
            "libraryId": "1",
            "mediaCount": 0
        }))
        .unwrap();
        let series = to_series(series);

        assert_eq!(series.metadata.title, "Saga");
        assert_eq!(series.metadata.summary, "");
        assert_eq!(series.metadata.total_book_count, None);
        assert_eq!(series.metadata.status, SeriesStatus::Ongoing);
    }

    #[test]
    fn test_update_inputs_keep_absent_fields_absent() {
        let input = series_input(MediaServerSeriesMetadataUpdate {
            status: Some(SeriesStatus::Abandoned),
            authors: Some(vec![
                MediaServerAuthor::new("Writer", "writer"),
                MediaServerAuthor::new("Artist", PENCILLER),
            ]),
            ..Default::default()
        });
        assert_eq!(input.status.as_deref(), Some("cancelled"));
        assert_eq!(input.writers, Some(vec!["Writer".to_string()]));
        assert_eq!(input.genres, None);

        let input = media_input(MediaServerBookMetadataUpdate {
            number: Some("12.5".into()),
            release_date: NaiveDate::from_ymd_opt(2021, 6, 15),
            ..Default::default()
        });
        assert_eq!(input.number, Some(12.5));
        assert_eq!((input.year, input.month, input.day), (Some(2021), Some(6), Some(15)));
        assert_eq!(input.writers, None);
    }
}
