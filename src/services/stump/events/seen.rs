//! Per-library memory of what the previous poll saw

use std::collections::{HashMap, HashSet};

use crate::mediaserver::{
    BookEvent, MediaServerBookId, MediaServerLibraryId, MediaServerSeriesId, SeriesEvent,
};

/// Full listing of one library at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySnapshot {
    /// Books in listing order, with the series they belong to
    pub books: Vec<(MediaServerSeriesId, MediaServerBookId)>,
    pub series: HashSet<MediaServerSeriesId>,
}

impl LibrarySnapshot {
    pub fn add_series(&mut self, series_id: MediaServerSeriesId) {
        self.series.insert(series_id);
    }

    pub fn add_book(&mut self, series_id: MediaServerSeriesId, book_id: MediaServerBookId) {
        self.series.insert(series_id.clone());
        self.books.push((series_id, book_id));
    }

    fn book_ids(&self) -> HashSet<&MediaServerBookId> {
        self.books.iter().map(|(_, book)| book).collect()
    }
}

/// What changed between two snapshots of a library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub added_books: Vec<BookEvent>,
    pub removed_series: Vec<SeriesEvent>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added_books.is_empty() && self.removed_series.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SeenState {
    libraries: HashMap<MediaServerLibraryId, LibrarySnapshot>,
}

impl SeenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, library_id: &MediaServerLibraryId) -> bool {
        self.libraries.contains_key(library_id)
    }

    /// Record a complete listing of `library_id` and return what changed since
    /// the previous one. The first listing of a library is a baseline and
    /// reports nothing.
    pub fn apply(&mut self, library_id: &MediaServerLibraryId, snapshot: LibrarySnapshot) -> Changes {
        let Some(previous) = self.libraries.get(library_id) else {
            self.libraries.insert(library_id.clone(), snapshot);
            return Changes::default();
        };

        let known = previous.book_ids();
        let mut emitted = HashSet::new();
        let added_books = snapshot
            .books
            .iter()
            .filter(|(_, book)| !known.contains(book) && emitted.insert(book.clone()))
            .map(|(series, book)| BookEvent {
                library_id: library_id.clone(),
                series_id: series.clone(),
                book_id: book.clone(),
            })
            .collect();

        let mut removed: Vec<&MediaServerSeriesId> =
            previous.series.difference(&snapshot.series).collect();
        removed.sort();
        let removed_series = removed
            .into_iter()
            .map(|series| SeriesEvent {
                library_id: library_id.clone(),
                series_id: series.clone(),
            })
            .collect();

        self.libraries.insert(library_id.clone(), snapshot);
        Changes {
            added_books,
            removed_series,
        }
    }

    /// Forget libraries that are no longer listed.
    pub fn retain_libraries(&mut self, listed: &HashSet<MediaServerLibraryId>) {
        self.libraries.retain(|id, _| listed.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn snapshot(books: &[(&str, &str)], extra_series: &[&str]) -> LibrarySnapshot {
        let mut snapshot = LibrarySnapshot::default();
        for (series, book) in books {
            snapshot.add_book(MediaServerSeriesId::new(*series), MediaServerBookId::new(*book));
        }
        for series in extra_series {
            snapshot.add_series(MediaServerSeriesId::new(*series));
        }
        snapshot
    }

    fn library() -> MediaServerLibraryId {
        MediaServerLibraryId::new("1")
    }

    #[test]
    fn test_first_listing_is_baseline() {
        let mut seen = SeenState::new();
        let changes = seen.apply(&library(), snapshot(&[("7", "42")], &[]));
        assert!(changes.is_empty());
        assert!(seen.contains(&library()));
    }

    #[test]
    fn test_unchanged_listing_reports_nothing() {
        let mut seen = SeenState::new();
        seen.apply(&library(), snapshot(&[("7", "42"), ("7", "43")], &[]));
        let changes = seen.apply(&library(), snapshot(&[("7", "42"), ("7", "43")], &[]));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_added_books_in_listing_order() {
        let mut seen = SeenState::new();
        seen.apply(&library(), snapshot(&[("7", "42")], &[]));
        let changes = seen.apply(
            &library(),
            snapshot(&[("8", "50"), ("7", "42"), ("7", "44")], &[]),
        );

        let ids: Vec<_> = changes
            .added_books
            .iter()
            .map(|e| (e.series_id.as_str(), e.book_id.as_str()))
            .collect();
        assert_eq!(ids, vec![("8", "50"), ("7", "44")]);
        assert!(changes.added_books.iter().all(|e| e.library_id == library()));

        let again = seen.apply(
            &library(),
            snapshot(&[("8", "50"), ("7", "42"), ("7", "44")], &[]),
        );
        assert!(again.is_empty());
    }

    #[test]
    fn test_removed_series() {
        let mut seen = SeenState::new();
        seen.apply(&library(), snapshot(&[("7", "42"), ("8", "50")], &["9"]));
        let changes = seen.apply(&library(), snapshot(&[("7", "42")], &[]));

        let removed: Vec<_> = changes
            .removed_series
            .iter()
            .map(|e| e.series_id.as_str())
            .collect();
        assert_eq!(removed, vec!["8", "9"]);
        assert!(changes.added_books.is_empty());
    }

    #[test]
    fn test_libraries_are_tracked_separately_and_forgotten() {
        let mut seen = SeenState::new();
        let other = MediaServerLibraryId::new("2");
        seen.apply(&library(), snapshot(&[("7", "42")], &[]));
        seen.apply(&other, snapshot(&[("8", "42")], &[]));
        assert!(seen.contains(&library()));
        assert!(seen.contains(&other));

        seen.retain_libraries(&HashSet::from([other.clone()]));
        assert!(!seen.contains(&library()));

        let changes = seen.apply(&library(), snapshot(&[("7", "42"), ("7", "43")], &[]));
        assert!(changes.is_empty());
    }
}
