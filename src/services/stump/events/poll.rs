//! Periodic enumeration of the Stump catalog for servers without subscriptions

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fanout::EventFanout;
use super::seen::{LibrarySnapshot, SeenState};
use crate::error::Result;
use crate::mediaserver::{MediaServerLibraryId, MediaServerSeriesId};
use crate::services::stump::client::StumpClient;
use crate::services::stump::model::{StumpLibraryId, StumpSeriesId};

/// Read access to the catalog needed for change detection
#[async_trait]
pub trait LibraryCatalog: Send + Sync {
    async fn library_ids(&self) -> Result<Vec<MediaServerLibraryId>>;

    /// Complete listing of one library. An error means the listing is
    /// incomplete and must not be recorded.
    async fn library_snapshot(&self, library_id: &MediaServerLibraryId) -> Result<LibrarySnapshot>;
}

#[async_trait]
impl LibraryCatalog for StumpClient {
    async fn library_ids(&self) -> Result<Vec<MediaServerLibraryId>> {
        let libraries = self.get_libraries().await?;
        Ok(libraries.into_iter().map(|l| l.id.into()).collect())
    }

    async fn library_snapshot(&self, library_id: &MediaServerLibraryId) -> Result<LibrarySnapshot> {
        let mut snapshot = LibrarySnapshot::default();
        let series = self.get_all_series(&StumpLibraryId::from(library_id)).await?;
        for series in series {
            let series_id = MediaServerSeriesId::from(series.id.clone());
            snapshot.add_series(series_id.clone());
            for media in self.get_all_media(&StumpSeriesId::from(&series_id)).await? {
                snapshot.add_book(series_id.clone(), media.id.into());
            }
        }
        Ok(snapshot)
    }
}

/// Outcome of one sweep over every library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub libraries: usize,
    pub failed_libraries: usize,
    pub books_added: usize,
    pub series_removed: usize,
}

/// Enumerate every library once, diff against `seen` and notify listeners.
///
/// Fails only when the library list itself cannot be fetched; a library whose
/// listing fails is skipped and keeps its previous snapshot. Once `token` is
/// cancelled no further library is listed and an in-flight listing is
/// abandoned without touching `seen`.
pub async fn poll_once(
    catalog: &dyn LibraryCatalog,
    seen: &mut SeenState,
    fanout: &EventFanout,
    token: &CancellationToken,
) -> Result<SweepReport> {
    let library_ids = tokio::select! {
        biased;
        _ = token.cancelled() => return Ok(SweepReport::default()),
        ids = catalog.library_ids() => ids?,
    };
    let listed: HashSet<MediaServerLibraryId> = library_ids.iter().cloned().collect();
    seen.retain_libraries(&listed);

    let mut report = SweepReport {
        libraries: library_ids.len(),
        ..Default::default()
    };
    for library_id in &library_ids {
        let listing = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(library_id = %library_id, "Poll sweep cancelled");
                break;
            }
            listing = catalog.library_snapshot(library_id) => listing,
        };
        let snapshot = match listing {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(library_id = %library_id, error = %e, "Failed to list Stump library");
                report.failed_libraries += 1;
                continue;
            }
        };

        let baseline = !seen.contains(library_id);
        let changes = seen.apply(library_id, snapshot);
        if baseline {
            debug!(library_id = %library_id, "Recorded baseline for library");
        }
        if changes.is_empty() {
            continue;
        }
        report.books_added += changes.added_books.len();
        report.series_removed += changes.removed_series.len();

        fanout.notify_books_added(changes.added_books).await;
        fanout.notify_series_deleted(changes.removed_series).await;
    }
    Ok(report)
}

/// Poll until the token is cancelled. The token is checked before each
/// library listing and during the sleep between sweeps.
pub(super) async fn run_poll_loop(
    catalog: &dyn LibraryCatalog,
    fanout: &EventFanout,
    interval: Duration,
    token: &CancellationToken,
) {
    info!(interval_secs = interval.as_secs(), "Polling Stump for new media");
    let mut seen = SeenState::new();

    while !token.is_cancelled() {
        let started = Instant::now();
        match poll_once(catalog, &mut seen, fanout, token).await {
            Ok(report) => debug!(
                libraries = report.libraries,
                failed = report.failed_libraries,
                books_added = report.books_added,
                series_removed = report.series_removed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Poll sweep finished"
            ),
            Err(e) => warn!(error = %e, "Failed to list Stump libraries"),
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Poll loop stopped");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::StumpError;
    use crate::mediaserver::{BookEvent, MediaServerBookId, MediaServerEventListener};

    #[derive(Default)]
    struct FakeCatalog {
        libraries: Mutex<HashMap<String, Vec<(&'static str, &'static str)>>>,
        failing: Mutex<HashSet<String>>,
        list_fails: Mutex<bool>,
    }

    #[async_trait]
    impl LibraryCatalog for FakeCatalog {
        async fn library_ids(&self) -> Result<Vec<MediaServerLibraryId>> {
            if *self.list_fails.lock() {
                return Err(StumpError::EmptyResponse);
            }
            let mut ids: Vec<_> = self.libraries.lock().keys().cloned().collect();
            ids.sort();
            Ok(ids.into_iter().map(MediaServerLibraryId::from).collect())
        }

        async fn library_snapshot(&self, library_id: &MediaServerLibraryId) -> Result<LibrarySnapshot> {
            if self.failing.lock().contains(library_id.as_str()) {
                return Err(StumpError::NotFound(library_id.to_string()));
            }
            let mut snapshot = LibrarySnapshot::default();
            for (series, book) in self.libraries.lock()[library_id.as_str()].iter() {
                snapshot.add_book(MediaServerSeriesId::new(*series), MediaServerBookId::new(*book));
            }
            Ok(snapshot)
        }
    }

    #[derive(Default)]
    struct Collect {
        added: Mutex<Vec<BookEvent>>,
    }

    #[async_trait]
    impl MediaServerEventListener for Collect {
        async fn on_books_added(&self, events: Vec<BookEvent>) -> anyhow::Result<()> {
            self.added.lock().extend(events);
            Ok(())
        }
    }

    fn setup() -> (FakeCatalog, Arc<Collect>, EventFanout) {
        let catalog = FakeCatalog::default();
        catalog
            .libraries
            .lock()
            .insert("1".into(), vec![("7", "42")]);
        let collect = Arc::new(Collect::default());
        let fanout = EventFanout::new(vec![collect.clone() as Arc<dyn MediaServerEventListener>], None);
        (catalog, collect, fanout)
    }

    #[tokio::test]
    async fn test_second_identical_poll_emits_nothing() {
        let (catalog, collect, fanout) = setup();
        let mut seen = SeenState::new();
        let token = CancellationToken::new();

        poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();
        let report = poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();

        assert_eq!(report.books_added, 0);
        assert!(collect.added.lock().is_empty());
    }

    #[tokio::test]
    async fn test_new_media_is_reported_once() {
        let (catalog, collect, fanout) = setup();
        let mut seen = SeenState::new();
        let token = CancellationToken::new();
        poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();

        catalog
            .libraries
            .lock()
            .insert("1".into(), vec![("7", "42"), ("7", "43")]);
        poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();
        poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();

        let added = collect.added.lock();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].book_id.as_str(), "43");
        assert_eq!(added[0].library_id.as_str(), "1");
    }

    #[tokio::test]
    async fn test_failed_listing_keeps_previous_snapshot() {
        let (catalog, collect, fanout) = setup();
        let mut seen = SeenState::new();
        let token = CancellationToken::new();
        poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();

        catalog
            .libraries
            .lock()
            .insert("1".into(), vec![("7", "42"), ("7", "43")]);
        catalog.failing.lock().insert("1".into());
        let report = poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();
        assert_eq!(report.failed_libraries, 1);

        catalog.failing.lock().clear();
        poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();
        assert_eq!(collect.added.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_library_list_failure_is_an_error() {
        let (catalog, _collect, fanout) = setup();
        let mut seen = SeenState::new();
        let token = CancellationToken::new();
        poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();

        *catalog.list_fails.lock() = true;
        assert!(poll_once(&catalog, &mut seen, &fanout, &token).await.is_err());
        assert!(seen.contains(&MediaServerLibraryId::new("1")));
    }

    /// Cancels the token while the first library is being listed
    struct CancellingCatalog {
        token: CancellationToken,
        listed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LibraryCatalog for CancellingCatalog {
        async fn library_ids(&self) -> Result<Vec<MediaServerLibraryId>> {
            Ok(["1", "2", "3"].into_iter().map(MediaServerLibraryId::new).collect())
        }

        async fn library_snapshot(&self, library_id: &MediaServerLibraryId) -> Result<LibrarySnapshot> {
            self.listed.lock().push(library_id.to_string());
            self.token.cancel();
            let mut snapshot = LibrarySnapshot::default();
            snapshot.add_book(MediaServerSeriesId::new("7"), MediaServerBookId::new("42"));
            Ok(snapshot)
        }
    }

    #[tokio::test]
    async fn test_cancelled_sweep_lists_no_further_library() {
        let token = CancellationToken::new();
        let catalog = CancellingCatalog {
            token: token.clone(),
            listed: Mutex::new(Vec::new()),
        };
        let (_unused, _collect, fanout) = setup();
        let mut seen = SeenState::new();

        let report = poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();

        assert_eq!(*catalog.listed.lock(), vec!["1".to_string()]);
        assert_eq!(report.libraries, 3);
        assert!(seen.contains(&MediaServerLibraryId::new("1")));
        assert!(!seen.contains(&MediaServerLibraryId::new("2")));
    }

    #[tokio::test]
    async fn test_cancelled_before_sweep_lists_nothing() {
        let (catalog, collect, fanout) = setup();
        let mut seen = SeenState::new();
        let token = CancellationToken::new();
        token.cancel();

        let report = poll_once(&catalog, &mut seen, &fanout, &token).await.unwrap();

        assert_eq!(report, SweepReport::default());
        assert!(!seen.contains(&MediaServerLibraryId::new("1")));
        assert!(collect.added.lock().is_empty());
    }
}
