//! End-to-end snapshot builds over the sample package, read both from an
//! unpacked directory and through a mocked extractor.

use std::cell::RefCell;
use std::fs;

use rstest::{fixture, rstest};
use tempfile::TempDir;
use test_utils::{
    assert_snapshot_invariants, sample_extractor_output, sample_package_root, sample_tables,
    write_directory_package, StaticLocator, SAMPLE_GAME,
};
use tracker_index::package::MockExternalInterpreter;
use tracker_index::{
    build, try_build, BuildErrorKind, BuildRequest, CategoryName, GoalData, ItemName,
    LocationName, ManualPackageLocator, OptionTable, PackageLocation, Requirement,
};

#[fixture]
fn root() -> TempDir {
    sample_package_root()
}

fn item_names(names: &[&str]) -> Vec<ItemName> {
    names.iter().copied().map(ItemName::from).collect()
}

#[rstest]
fn directory_package_builds_a_consistent_snapshot(root: TempDir) {
    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let held = item_names(&["Sword", "Small Key", "Small Key", "Coin Pouch", "Gold Bar"]);
    let request = BuildRequest::new(&location, &options).held(&held);

    let snapshot = build(&request, &ManualPackageLocator).expect("sample package builds");
    assert_snapshot_invariants(&snapshot);

    assert_eq!(snapshot.game(), SAMPLE_GAME);
    assert_eq!(snapshot.option("include_dlc"), Some(0));
    assert_eq!(snapshot.option("easy_mode"), Some(1));
    assert!(snapshot.is_category_disabled("DLC"));
    assert!(snapshot.is_category_disabled("Hard Mode"));
    assert!(!snapshot.is_category_disabled("Weapons"));
    assert!(snapshot.is_category_hidden("Keys"));

    let disabled_locations: Vec<&str> = snapshot
        .disabled_locations()
        .iter()
        .map(LocationName::as_str)
        .collect();
    assert_eq!(disabled_locations, ["DLC Cave", "Hard Ledge"]);
    let disabled_items: Vec<&str> = snapshot
        .disabled_items()
        .iter()
        .map(ItemName::as_str)
        .collect();
    assert_eq!(disabled_items, ["DLC Shield", "Spiked Boots"]);

    assert_eq!(snapshot.item_count("Small Key"), 2);
    assert_eq!(snapshot.item_pool_count("Small Key"), 3);
    assert_eq!(snapshot.category_count("Keys"), 2);
    assert_eq!(snapshot.category_count("Weapons"), 1);
    assert_eq!(snapshot.category_count("DLC"), 0);
    assert_eq!(snapshot.category_pool_count("Weapons"), 3);

    assert_eq!(
        snapshot.items_behind("Coins"),
        &[
            (ItemName::from("Coin Pouch"), 10),
            (ItemName::from("Gold Bar"), 50)
        ][..]
    );
    assert_eq!(snapshot.phantoms_of("Rock"), &[][..]);

    assert_eq!(
        snapshot.requirement("Armory").map(Requirement::as_str),
        Some("|Sword| and |Bow|")
    );
    assert_eq!(
        snapshot.requirement("Starting Chest").map(Requirement::as_str),
        Some("")
    );
    assert!(snapshot.requirement("Nowhere").is_none());
    assert!(snapshot
        .categories_of_item("Rock")
        .is_some_and(|categories| categories.is_empty()));
}

#[rstest]
fn goal_keeps_only_the_chosen_victory_location(root: TempDir) {
    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let goal = || {
        Some(GoalData {
            location: LocationName::from("Victory B"),
        })
    };
    let request = BuildRequest::new(&location, &options).goal(&goal);

    let snapshot = build(&request, &ManualPackageLocator).expect("sample package builds");
    assert!(snapshot.requirement("Victory B").is_some());
    assert!(snapshot.requirement("Victory A").is_none());
}

#[rstest]
fn category_options_and_hidden_categories_are_indexed() {
    let root = TempDir::new().expect("temp dir");
    let mut document = test_utils::sample_document();
    if let Some(items) = document["items.json"].as_array_mut() {
        items.push(serde_json::json!({"name": "Lucky Charm", "category": ["Bonus"]}));
    }
    write_directory_package(root.path(), SAMPLE_GAME, &document).expect("write package");

    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let request = BuildRequest::new(&location, &options);
    let snapshot = build(&request, &ManualPackageLocator).expect("package builds");
    assert_snapshot_invariants(&snapshot);

    let dlc_options: Option<Vec<&str>> = snapshot
        .category_options("DLC")
        .map(|keys| keys.iter().map(String::as_str).collect());
    assert_eq!(dlc_options, Some(vec!["include_dlc"]));
    assert!(snapshot
        .category_options("Weapons")
        .is_some_and(|keys| keys.is_empty()));
    assert!(snapshot
        .category_options("Bonus")
        .is_some_and(|keys| keys.is_empty()));
    assert!(snapshot.category_options("Nowhere").is_none());

    let hidden: Vec<&str> = snapshot
        .hidden_categories()
        .iter()
        .map(CategoryName::as_str)
        .collect();
    assert_eq!(hidden, ["Keys"]);
    assert!(!snapshot.is_category_hidden("Bonus"));
    assert!(!snapshot.is_category_disabled("Bonus"));
}

#[rstest]
fn oversized_item_pools_still_build() {
    let root = TempDir::new().expect("temp dir");
    let mut document = test_utils::sample_document();
    document["items.json"] = serde_json::json!([
        {"name": "Gem Heap", "count": 3_000_000_000_u32, "category": ["Big"]},
        {"name": "Ore Heap", "count": 3_000_000_000_u32, "category": ["Big"]}
    ]);
    write_directory_package(root.path(), SAMPLE_GAME, &document).expect("write package");

    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let request = BuildRequest::new(&location, &options);
    let snapshot = build(&request, &ManualPackageLocator).expect("oversized pools build");

    assert_eq!(snapshot.item_pool_count("Gem Heap"), 3_000_000_000);
    assert_eq!(snapshot.category_pool_count("Big"), u32::MAX);
}

#[rstest]
fn archived_package_is_read_through_the_interpreter() {
    let root = TempDir::new().expect("temp dir");
    let archive = root.path().join(format!("{}.apworld", SAMPLE_GAME.to_lowercase()));
    fs::write(&archive, b"PK").expect("write archive");

    let mut interpreter = MockExternalInterpreter::new();
    interpreter
        .expect_extract()
        .withf(move |package| package == archive.as_path())
        .times(1)
        .returning(|_| Ok(sample_extractor_output()));

    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let request = BuildRequest::new(&location, &options).interpreter(&interpreter);

    let snapshot = build(&request, &ManualPackageLocator).expect("archive builds");
    assert_snapshot_invariants(&snapshot);
    assert!(snapshot.is_location_disabled("DLC Cave"));
}

#[rstest]
fn archive_without_interpreter_is_reported() {
    let root = TempDir::new().expect("temp dir");
    let archive = root.path().join(format!("{}.apworld", SAMPLE_GAME.to_lowercase()));
    fs::write(&archive, b"PK").expect("write archive");

    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let messages = RefCell::new(Vec::new());
    let sink = |message: &str| messages.borrow_mut().push(message.to_owned());
    let request = BuildRequest::new(&location, &options).sink(&sink);

    assert!(build(&request, &ManualPackageLocator).is_none());
    assert!(messages
        .borrow()
        .iter()
        .any(|message| message.contains("external interpreter")));
    let error = try_build(&request, &ManualPackageLocator).expect_err("needs interpreter");
    assert_eq!(error.kind(), BuildErrorKind::UnexpectedFailure);
}

#[rstest]
#[case("Zelda")]
#[case("Manual_Missing_Someone")]
fn inapplicable_games_yield_no_snapshot(root: TempDir, #[case] game: &str) {
    let location = PackageLocation::new(game, root.path());
    let options = OptionTable::new();
    let request = BuildRequest::new(&location, &options);

    let error = try_build(&request, &ManualPackageLocator).expect_err("no package");
    assert_eq!(error.kind(), BuildErrorKind::NotApplicable);
    assert!(build(&request, &ManualPackageLocator).is_none());
}

#[rstest]
fn duplicate_locations_fail_extraction() {
    let root = TempDir::new().expect("temp dir");
    let mut document = test_utils::sample_document();
    document["locations.json"] = serde_json::json!([
        {"name": "Chest"},
        {"name": "Chest"}
    ]);
    write_directory_package(root.path(), SAMPLE_GAME, &document).expect("write package");

    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let request = BuildRequest::new(&location, &options);

    let error = try_build(&request, &ManualPackageLocator).expect_err("duplicate name");
    assert_eq!(error.kind(), BuildErrorKind::ExtractionFailure);
}

#[rstest]
fn malformed_table_fails_extraction() {
    let root = TempDir::new().expect("temp dir");
    let data = write_directory_package(
        root.path(),
        SAMPLE_GAME,
        &test_utils::sample_document(),
    )
    .expect("write package");
    fs::write(data.join("items.json"), "{not json").expect("corrupt items");

    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let request = BuildRequest::new(&location, &options);
    let error = try_build(&request, &ManualPackageLocator).expect_err("malformed items");
    assert_eq!(error.kind(), BuildErrorKind::ExtractionFailure);
}

#[rstest]
fn static_tables_match_directory_package(root: TempDir) {
    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let held = item_names(&["Bow", "Coin Pouch"]);
    let request = BuildRequest::new(&location, &options).held(&held);

    let from_disk = build(&request, &ManualPackageLocator).expect("directory builds");
    let from_tables =
        build(&request, &StaticLocator::serving(sample_tables())).expect("tables build");
    assert_eq!(from_disk, from_tables);
}

#[rstest]
fn snapshot_serialises_to_json(root: TempDir) {
    let location = PackageLocation::new(SAMPLE_GAME, root.path());
    let options = OptionTable::new();
    let request = BuildRequest::new(&location, &options);
    let snapshot = build(&request, &ManualPackageLocator).expect("sample package builds");

    let json = serde_json::to_value(&snapshot).expect("serialise snapshot");
    assert_eq!(json["game"], SAMPLE_GAME);
    assert_eq!(json["disabled_categories"], serde_json::json!(["DLC", "Hard Mode"]));
    assert_eq!(
        json["phantom_items"]["Treasure"],
        serde_json::json!([["Gold Bar", 1]])
    );
}
