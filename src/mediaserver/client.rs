use anyhow::Result;
use async_trait::async_trait;

use super::model::{
    Image, MediaServerBook, MediaServerBookId, MediaServerBookMetadataUpdate,
    MediaServerBookThumbnail, MediaServerLibrary, MediaServerLibraryId, MediaServerSeries,
    MediaServerSeriesId, MediaServerSeriesMetadataUpdate, MediaServerSeriesThumbnail,
    MediaServerThumbnailId, Page,
};

/// Operations the host application performs against any media server.
#[async_trait]
pub trait MediaServerClient: Send + Sync {
    async fn get_series(&self, series_id: &MediaServerSeriesId) -> Result<MediaServerSeries>;

    async fn get_series_page(
        &self,
        library_id: &MediaServerLibraryId,
        page_number: i32,
    ) -> Result<Page<MediaServerSeries>>;

    async fn get_series_thumbnail(&self, series_id: &MediaServerSeriesId) -> Result<Option<Image>>;

    async fn get_series_thumbnails(
        &self,
        series_id: &MediaServerSeriesId,
    ) -> Result<Vec<MediaServerSeriesThumbnail>>;

    async fn get_book(&self, book_id: &MediaServerBookId) -> Result<MediaServerBook>;

    async fn get_books(&self, series_id: &MediaServerSeriesId) -> Result<Vec<MediaServerBook>>;

    async fn get_book_thumbnails(
        &self,
        book_id: &MediaServerBookId,
    ) -> Result<Vec<MediaServerBookThumbnail>>;

    async fn get_book_thumbnail(&self, book_id: &MediaServerBookId) -> Result<Option<Image>>;

    async fn get_library(&self, library_id: &MediaServerLibraryId) -> Result<MediaServerLibrary>;

    async fn get_libraries(&self) -> Result<Vec<MediaServerLibrary>>;

    async fn update_series_metadata(
        &self,
        series_id: &MediaServerSeriesId,
        metadata: MediaServerSeriesMetadataUpdate,
    ) -> Result<()>;

    async fn delete_series_thumbnail(
        &self,
        series_id: &MediaServerSeriesId,
        thumbnail_id: &MediaServerThumbnailId,
    ) -> Result<()>;

    async fn update_book_metadata(
        &self,
        book_id: &MediaServerBookId,
        metadata: MediaServerBookMetadataUpdate,
    ) -> Result<()>;

    async fn delete_book_thumbnail(
        &self,
        book_id: &MediaServerBookId,
        thumbnail_id: &MediaServerThumbnailId,
    ) -> Result<()>;

    async fn reset_book_metadata(
        &self,
        book_id: &MediaServerBookId,
        book_name: &str,
        book_number: Option<i32>,
    ) -> Result<()>;

    async fn reset_series_metadata(
        &self,
        series_id: &MediaServerSeriesId,
        series_name: &str,
    ) -> Result<()>;

    /// Returns the created thumbnail when the server reports one.
    async fn upload_series_thumbnail(
        &self,
        series_id: &MediaServerSeriesId,
        thumbnail: Image,
        selected: bool,
        lock: bool,
    ) -> Result<Option<MediaServerSeriesThumbnail>>;

    /// Returns the created thumbnail when the server reports one.
    async fn upload_book_thumbnail(
        &self,
        book_id: &MediaServerBookId,
        thumbnail: Image,
        selected: bool,
        lock: bool,
    ) -> Result<Option<MediaServerBookThumbnail>>;

    async fn refresh_metadata(
        &self,
        library_id: &MediaServerLibraryId,
        series_id: &MediaServerSeriesId,
    ) -> Result<()>;
}
