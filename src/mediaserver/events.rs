//! Change events delivered to the host application

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::model::{MediaServerBookId, MediaServerLibraryId, MediaServerSeriesId};

/// A book that appeared (or disappeared) on the media server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookEvent {
    pub library_id: MediaServerLibraryId,
    pub series_id: MediaServerSeriesId,
    pub book_id: MediaServerBookId,
}

/// A series that changed or was removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesEvent {
    pub library_id: MediaServerLibraryId,
    pub series_id: MediaServerSeriesId,
}

/// Observer of media server changes.
///
/// Every method defaults to a no-op so a listener only implements what it
/// cares about. Returning an error is logged by the notifier and never stops
/// delivery to the remaining listeners.
#[async_trait]
pub trait MediaServerEventListener: Send + Sync {
    async fn on_books_added(&self, events: Vec<BookEvent>) -> Result<()> {
        let _ = events;
        Ok(())
    }

    async fn on_books_deleted(&self, events: Vec<BookEvent>) -> Result<()> {
        let _ = events;
        Ok(())
    }

    async fn on_series_changed(&self, events: Vec<SeriesEvent>) -> Result<()> {
        let _ = events;
        Ok(())
    }

    async fn on_series_deleted(&self, events: Vec<SeriesEvent>) -> Result<()> {
        let _ = events;
        Ok(())
    }
}
