//! Shared fixtures for tracker index tests.
//!
//! Provides a small sample package (as an extractor document and as an
//! unpacked directory), a locator serving fixed tables and an assertion
//! helper checking the cross-index invariants every snapshot must satisfy.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;
use tracker_index::package::ManualTables;
use tracker_index::{
    ExternalInterpreter, ExtractionError, PackageLocation, PackageLocator, PackageReader,
    Snapshot, TablesReader, DATA_DIR,
};

/// Game name of the sample package.
pub const SAMPLE_GAME: &str = "Manual_Sample_Tester";

/// Extractor document of the sample package.
///
/// With the package's own option defaults, `DLC` (needs `include_dlc`) and
/// `Hard Mode` (needs `easy_mode` off) are disabled; `Keys` is hidden.
#[must_use]
pub fn sample_document() -> Value {
    json!({
        "items.json": [
            {"name": "Sword", "category": ["Weapons"]},
            {"name": "Bow", "category": ["Weapons"]},
            {"name": "Small Key", "count": 3, "category": ["Keys"]},
            {"name": "Coin Pouch", "count": 4, "value": {"Coins": 10}},
            {"name": "Gold Bar", "value": {"Coins": 50, "Treasure": 1}},
            {"name": "DLC Shield", "category": ["DLC", "Weapons"]},
            {"name": "Spiked Boots", "category": ["Hard Mode"]},
            {"name": "Rock"}
        ],
        "locations.json": [
            {"name": "Starting Chest"},
            {"name": "Key Door", "category": ["Keys"], "requires": "|Small Key:2|"},
            {"name": "Armory", "category": ["Weapons"], "requires": ["Sword", "Bow"]},
            {"name": "DLC Cave", "category": ["DLC"], "requires": "|DLC Shield|"},
            {"name": "Hard Ledge", "category": ["Hard Mode"], "requires": "|Spiked Boots|"},
            {"name": "Victory A", "victory": true, "requires": "|Sword|"},
            {"name": "Victory B", "victory": true, "requires": "|Bow| and |Coins:60|"}
        ],
        "categories.json": {
            "Weapons": {},
            "Keys": {"hidden": true},
            "DLC": {"yaml_option": ["include_dlc"]},
            "Hard Mode": {"yaml_option": ["!easy_mode"]}
        },
        "options.json": {
            "core": {"goal": {"type": "Choice", "default": 0}},
            "user": {
                "include_dlc": {"type": "Toggle", "default": false},
                "easy_mode": {"type": "Toggle", "default": true}
            }
        }
    })
}

/// The sample package serialised as extractor output.
#[must_use]
pub fn sample_extractor_output() -> String {
    sample_document().to_string()
}

/// The sample package parsed into tables.
///
/// # Panics
/// Panics if the sample document does not parse.
#[must_use]
pub fn sample_tables() -> ManualTables {
    ManualTables::from_extractor_output(&sample_extractor_output())
        .unwrap_or_else(|err| panic!("sample package must parse: {err}"))
}

/// Writes `document` as an unpacked package for `game` under `root`.
///
/// Every top-level key of the document becomes one file in
/// `<root>/<game>/data/`. Returns the data directory.
///
/// # Errors
/// Returns any I/O error raised while writing.
pub fn write_directory_package(root: &Path, game: &str, document: &Value) -> io::Result<PathBuf> {
    let data = root.join(game).join(DATA_DIR);
    fs::create_dir_all(&data)?;
    if let Value::Object(tables) = document {
        for (name, table) in tables {
            fs::write(data.join(name), table.to_string())?;
        }
    }
    Ok(data)
}

/// Temporary package root holding the sample package as a directory.
///
/// # Panics
/// Panics if the temporary directory cannot be created or written.
#[must_use]
pub fn sample_package_root() -> TempDir {
    let root = TempDir::new().unwrap_or_else(|err| panic!("temp dir: {err}"));
    write_directory_package(root.path(), SAMPLE_GAME, &sample_document())
        .unwrap_or_else(|err| panic!("write sample package: {err}"));
    root
}

/// Locator serving fixed tables for every game, or no package at all.
#[derive(Clone, Debug, Default)]
pub struct StaticLocator {
    tables: Option<ManualTables>,
}

impl StaticLocator {
    /// Serves `tables` for every lookup.
    #[must_use]
    pub const fn serving(tables: ManualTables) -> Self {
        Self {
            tables: Some(tables),
        }
    }

    /// Reports that no package applies.
    #[must_use]
    pub const fn empty() -> Self {
        Self { tables: None }
    }
}

impl PackageLocator for StaticLocator {
    fn locate(
        &self,
        _location: &PackageLocation,
        _interpreter: Option<&dyn ExternalInterpreter>,
    ) -> Result<Option<Box<dyn PackageReader>>, ExtractionError> {
        Ok(self
            .tables
            .clone()
            .map(|tables| Box::new(TablesReader::new(tables)) as Box<dyn PackageReader>))
    }
}

/// Asserts the cross-index invariants of `snapshot`.
///
/// Checks inverse consistency of the item and location mappings, that the
/// disabled sets follow from the disabled categories, that category counts
/// aggregate the item counts and that phantom mappings mirror each other.
///
/// # Panics
/// Panics describing the first invariant that does not hold.
pub fn assert_snapshot_invariants(snapshot: &Snapshot) {
    for (item, categories) in snapshot.item_categories() {
        for category in categories {
            assert!(
                snapshot
                    .items_in(category.as_str())
                    .is_some_and(|items| items.contains(item)),
                "{item} lists {category} but {category} does not list {item}"
            );
        }
    }
    for (category, items) in snapshot.category_items() {
        for item in items {
            assert!(
                snapshot
                    .categories_of_item(item.as_str())
                    .is_some_and(|categories| categories.contains(category)),
                "{category} lists {item} but {item} does not list {category}"
            );
        }
    }
    for (category, locations) in snapshot.category_locations() {
        for location in locations {
            assert!(
                snapshot
                    .categories_of_location(location.as_str())
                    .is_some_and(|categories| categories.contains(category)),
                "{category} lists {location} but {location} does not list {category}"
            );
        }
    }
    for (location, categories) in snapshot.location_categories() {
        for category in categories {
            assert!(
                snapshot
                    .locations_in(category.as_str())
                    .is_some_and(|locations| locations.contains(location)),
                "{location} lists {category} but {category} does not list {location}"
            );
        }
    }

    let expected_locations: BTreeSet<&str> = snapshot
        .disabled_categories()
        .iter()
        .filter_map(|category| snapshot.locations_in(category.as_str()))
        .flatten()
        .map(|location| location.as_str())
        .collect();
    let actual_locations: BTreeSet<&str> = snapshot
        .disabled_locations()
        .iter()
        .map(|location| location.as_str())
        .collect();
    assert_eq!(actual_locations, expected_locations, "disabled locations");

    let expected_items: BTreeSet<&str> = snapshot
        .item_categories()
        .iter()
        .filter(|(_, categories)| {
            categories
                .iter()
                .any(|category| snapshot.is_category_disabled(category.as_str()))
        })
        .map(|(item, _)| item.as_str())
        .collect();
    let actual_items: BTreeSet<&str> = snapshot
        .disabled_items()
        .iter()
        .map(|item| item.as_str())
        .collect();
    assert_eq!(actual_items, expected_items, "disabled items");

    let mut expected_counts: BTreeMap<&str, u32> = BTreeMap::new();
    for (item, count) in snapshot.item_counts() {
        for category in snapshot
            .categories_of_item(item.as_str())
            .into_iter()
            .flatten()
        {
            let total = expected_counts.entry(category.as_str()).or_insert(0);
            *total = total.saturating_add(*count);
        }
    }
    let actual_counts: BTreeMap<&str, u32> = snapshot
        .category_counts()
        .iter()
        .map(|(category, count)| (category.as_str(), *count))
        .collect();
    assert_eq!(actual_counts, expected_counts, "category counts");

    for (item, phantoms) in snapshot.item_phantoms() {
        for (phantom, weight) in phantoms {
            assert!(
                snapshot
                    .items_behind(phantom.as_str())
                    .iter()
                    .any(|(backing, backing_weight)| backing == item && backing_weight == weight),
                "{phantom} does not list {item} x{weight}"
            );
        }
    }
    let forward_pairs: usize = snapshot.item_phantoms().values().map(Vec::len).sum();
    let reverse_pairs: usize = snapshot.phantom_items().values().map(Vec::len).sum();
    assert_eq!(forward_pairs, reverse_pairs, "phantom pair counts");
}
