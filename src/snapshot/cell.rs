//! Atomic publication of the active snapshot.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::{build, BuildRequest, Snapshot};
use crate::package::PackageLocator;

/// Holds the snapshot readers currently query.
///
/// Readers load an `Arc` and keep using it for as long as they like; a
/// concurrent [`publish`](Self::publish) only affects later loads, so a reader
/// sees either the old snapshot or the new one in full.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: ArcSwapOption<Snapshot>,
}

impl SnapshotCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active snapshot, returning the previous one.
    pub fn publish(&self, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        self.current.swap(Some(Arc::new(snapshot)))
    }

    /// Removes the active snapshot, returning it.
    pub fn clear(&self) -> Option<Arc<Snapshot>> {
        self.current.swap(None)
    }

    /// The active snapshot, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Rebuilds from `request` and stores the outcome in one swap.
    ///
    /// A failed build clears the cell, so readers never keep querying a
    /// snapshot built for options or holdings that no longer apply. Returns
    /// whether a snapshot is now published.
    pub fn refresh(&self, request: &BuildRequest<'_>, locator: &dyn PackageLocator) -> bool {
        let rebuilt = build(request, locator).map(Arc::new);
        let published = rebuilt.is_some();
        self.current.store(rebuilt);
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionTable;
    use crate::package::{
        ExternalInterpreter, ExtractionError, MockPackageReader, PackageLocation, PackageReader,
        RawCategories, RawItems, RawLocations,
    };
    use rstest::{fixture, rstest};
    use std::cell::Cell;

    /// Serves an empty package until switched off.
    struct TogglingLocator {
        available: Cell<bool>,
    }

    impl PackageLocator for TogglingLocator {
        fn locate(
            &self,
            _location: &PackageLocation,
            _interpreter: Option<&dyn ExternalInterpreter>,
        ) -> Result<Option<Box<dyn PackageReader>>, ExtractionError> {
            if !self.available.get() {
                return Ok(None);
            }
            let mut reader = MockPackageReader::new();
            reader.expect_options().returning(|| Ok(OptionTable::new()));
            reader
                .expect_extract_categories()
                .returning(|_| Ok(RawCategories::default()));
            reader
                .expect_extract_items()
                .returning(|| Ok(RawItems::default()));
            reader
                .expect_extract_locations()
                .returning(|_| Ok(RawLocations::default()));
            Ok(Some(Box::new(reader)))
        }
    }

    #[fixture]
    fn package() -> PackageLocation {
        PackageLocation::new("Manual_Empty_Someone", "/packages")
    }

    #[rstest]
    fn starts_empty() {
        assert!(SnapshotCell::new().current().is_none());
    }

    #[rstest]
    fn refresh_publishes_and_clears(package: PackageLocation) {
        let options = OptionTable::new();
        let request = BuildRequest::new(&package, &options);
        let locator = TogglingLocator {
            available: Cell::new(true),
        };
        let cell = SnapshotCell::new();

        assert!(cell.refresh(&request, &locator));
        let first = cell.current().expect("snapshot published");
        assert_eq!(first.game(), "Manual_Empty_Someone");

        locator.available.set(false);
        assert!(!cell.refresh(&request, &locator));
        assert!(cell.current().is_none());
        assert_eq!(first.game(), "Manual_Empty_Someone");
    }

    #[rstest]
    fn publish_returns_previous_snapshot(package: PackageLocation) {
        let options = OptionTable::new();
        let request = BuildRequest::new(&package, &options);
        let locator = TogglingLocator {
            available: Cell::new(true),
        };
        let snapshot = build(&request, &locator).expect("snapshot builds");
        let cell = SnapshotCell::new();

        assert!(cell.publish(snapshot.clone()).is_none());
        let previous = cell.publish(snapshot.clone()).expect("previous snapshot");
        assert_eq!(*previous, snapshot);
        assert!(cell.clear().is_some());
        assert!(cell.current().is_none());
    }
}
