//! Snapshot assembly.
//!
//! [`try_build`] walks the stage machine `NotStarted → Reading → Inferring →
//! Assembled`, returning the first failure as a [`BuildError`]. [`build`] is
//! the outer boundary: it also catches collaborator panics, reports the
//! failure through the request's sink and collapses every failure to `None`.

use std::any::Any;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use log::debug;

use super::{freeze_map, freeze_membership, freeze_set, BuildError, BuildStage, Snapshot};
use crate::inference::{aggregate_count, closure, invert, invert_phantoms, Carrier};
use crate::logging::{LogSink, Progress};
use crate::names::{CategoryName, ItemName};
use crate::options::OptionTable;
use crate::package::{
    ExternalInterpreter, ExtractionError, GoalData, PackageLocation, PackageLocator,
    PackageReader, RawCategories, RawItems, RawLocations,
};

/// Callback producing the goal selection handed to location extraction.
pub type GoalSource<'a> = &'a dyn Fn() -> Option<GoalData>;

/// Inputs of one snapshot build.
///
/// # Examples
///
/// ```
/// use tracker_index::{BuildRequest, ItemName, OptionTable, PackageLocation};
///
/// let location = PackageLocation::new("Manual_Zelda_Someone", "/srv/packages");
/// let options = OptionTable::new();
/// let held = [ItemName::from("Sword")];
/// let request = BuildRequest::new(&location, &options)
///     .held(&held)
///     .clamp_counts(true);
/// assert_eq!(request.location().game, "Manual_Zelda_Someone");
/// ```
#[derive(Clone, Copy)]
pub struct BuildRequest<'a> {
    held: &'a [ItemName],
    location: &'a PackageLocation,
    options: &'a OptionTable,
    interpreter: Option<&'a dyn ExternalInterpreter>,
    goal: Option<GoalSource<'a>>,
    sink: Option<LogSink<'a>>,
    clamp_counts: bool,
}

impl<'a> BuildRequest<'a> {
    /// Starts a request for the package at `location` with the caller's
    /// `options`; nothing is held.
    #[must_use]
    pub const fn new(location: &'a PackageLocation, options: &'a OptionTable) -> Self {
        Self {
            held: &[],
            location,
            options,
            interpreter: None,
            goal: None,
            sink: None,
            clamp_counts: false,
        }
    }

    /// Held items; duplicates count as multiple units.
    #[must_use]
    pub const fn held(mut self, held: &'a [ItemName]) -> Self {
        self.held = held;
        self
    }

    /// Interpreter used to extract archived packages.
    #[must_use]
    pub const fn interpreter(mut self, interpreter: &'a dyn ExternalInterpreter) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    /// Callback supplying the goal selection.
    #[must_use]
    pub const fn goal(mut self, goal: GoalSource<'a>) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Sink receiving progress and failure messages.
    #[must_use]
    pub const fn sink(mut self, sink: LogSink<'a>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Clamps held counts to the package's item pool.
    #[must_use]
    pub const fn clamp_counts(mut self, clamp: bool) -> Self {
        self.clamp_counts = clamp;
        self
    }

    /// Package location the request targets.
    #[must_use]
    pub const fn location(&self) -> &PackageLocation {
        self.location
    }
}

impl fmt::Debug for BuildRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildRequest")
            .field("held", &self.held)
            .field("location", &self.location)
            .field("options", &self.options)
            .field("interpreter", &self.interpreter.is_some())
            .field("goal", &self.goal.is_some())
            .field("sink", &self.sink.is_some())
            .field("clamp_counts", &self.clamp_counts)
            .finish()
    }
}

/// Current stage of a build, logged on every transition.
struct Stages(Cell<BuildStage>);

impl Stages {
    const fn new() -> Self {
        Self(Cell::new(BuildStage::NotStarted))
    }

    fn enter(&self, next: BuildStage) {
        debug!("snapshot build: {} -> {next}", self.0.get());
        self.0.set(next);
    }

    fn current(&self) -> BuildStage {
        self.0.get()
    }
}

/// Raw package tables plus the merged options, ready for inference.
struct Tables {
    options: OptionTable,
    categories: RawCategories,
    items: RawItems,
    locations: RawLocations,
}

/// Builds a snapshot, reporting why when none can be produced.
///
/// # Errors
/// Returns [`BuildError::NotApplicable`] when no package applies to the game,
/// [`BuildError::Extraction`] when the package cannot produce a table,
/// [`BuildError::Unexpected`] when the package cannot be opened and
/// [`BuildError::ContractViolation`] when inference rejects the tables.
pub fn try_build(
    request: &BuildRequest<'_>,
    locator: &dyn PackageLocator,
) -> Result<Snapshot, BuildError> {
    run(request, locator, &Stages::new())
}

/// Builds a snapshot, or returns `None` when none can be produced.
///
/// Failures other than a missing package are forwarded to the request's sink
/// and logged at warn level. A panic inside a collaborator is caught here and
/// treated as an unexpected failure.
#[must_use]
pub fn build(request: &BuildRequest<'_>, locator: &dyn PackageLocator) -> Option<Snapshot> {
    let progress = Progress::new(request.sink);
    let stages = Stages::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(request, locator, &stages)))
        .unwrap_or_else(|payload| {
            let stage = stages.current();
            stages.enter(BuildStage::Failed);
            Err(BuildError::Unexpected {
                stage,
                message: panic_message(payload.as_ref()),
            })
        });

    match outcome {
        Ok(snapshot) => {
            progress.report(&format!(
                "snapshot for {} ready: {} items, {} locations, {} categories",
                snapshot.game(),
                snapshot.items().count(),
                snapshot.locations().count(),
                snapshot.categories().count()
            ));
            Some(snapshot)
        }
        Err(error @ BuildError::NotApplicable { .. }) => {
            debug!("{error}");
            None
        }
        Err(error) => {
            progress.failure(&format!("snapshot build failed: {}", describe(&error)));
            None
        }
    }
}

fn run(
    request: &BuildRequest<'_>,
    locator: &dyn PackageLocator,
    stages: &Stages,
) -> Result<Snapshot, BuildError> {
    let result = read(request, locator, stages).and_then(|tables| {
        stages.enter(BuildStage::Inferring);
        assemble(request, tables)
    });
    match result {
        Ok(snapshot) => {
            stages.enter(BuildStage::Assembled);
            Ok(snapshot)
        }
        Err(error) => {
            stages.enter(BuildStage::Failed);
            Err(error)
        }
    }
}

fn read(
    request: &BuildRequest<'_>,
    locator: &dyn PackageLocator,
    stages: &Stages,
) -> Result<Tables, BuildError> {
    stages.enter(BuildStage::Reading);
    let progress = Progress::new(request.sink);
    let game = &request.location.game;

    let reader = locator
        .locate(request.location, request.interpreter)
        .map_err(open_failure)?
        .ok_or_else(|| BuildError::NotApplicable { game: game.clone() })?;
    progress.report(&format!("reading package for {game}"));

    read_tables(reader.as_ref(), request)
}

fn read_tables(
    reader: &dyn PackageReader,
    request: &BuildRequest<'_>,
) -> Result<Tables, BuildError> {
    let package_options = reader.options().map_err(extraction_failure)?;
    for (key, value) in package_options.iter() {
        if let Some(previous) = request.options.get(key).filter(|&caller| caller != value) {
            debug!("package option {key}={value} replaces caller value {previous}");
        }
    }
    let mut options = request.options.clone();
    options.merge_forward(&package_options);

    let categories = reader
        .extract_categories(&options)
        .map_err(extraction_failure)?;
    let items = reader.extract_items().map_err(extraction_failure)?;
    let goal = request.goal.and_then(|source| source());
    let locations = reader
        .extract_locations(goal)
        .map_err(extraction_failure)?;

    Ok(Tables {
        options,
        categories,
        items,
        locations,
    })
}

const fn extraction_failure(source: ExtractionError) -> BuildError {
    BuildError::Extraction {
        stage: BuildStage::Reading,
        source,
    }
}

/// Malformed package contents are extraction failures; anything that kept the
/// package from being opened at all is unexpected.
fn open_failure(source: ExtractionError) -> BuildError {
    match source {
        ExtractionError::Json { .. }
        | ExtractionError::MissingTable(_)
        | ExtractionError::DuplicateName { .. } => extraction_failure(source),
        other => BuildError::Unexpected {
            stage: BuildStage::Reading,
            message: describe(&other),
        },
    }
}

fn assemble(request: &BuildRequest<'_>, tables: Tables) -> Result<Snapshot, BuildError> {
    let Tables {
        options,
        categories,
        items,
        locations,
    } = tables;
    let universe = category_universe(&categories, &items, &locations);

    let mut category_items = invert(&items.categories);
    let mut category_locations = locations.categories;
    let mut category_options = categories.option_keys;
    for category in &universe {
        category_items.entry(category.clone()).or_default();
        category_locations.entry(category.clone()).or_default();
        category_options.entry(category.clone()).or_default();
    }
    let mut location_categories = invert(&category_locations);
    for location in locations.requirements.keys() {
        location_categories.entry(location.clone()).or_default();
    }

    let contract = |source| BuildError::ContractViolation {
        stage: BuildStage::Inferring,
        source,
    };
    let disabled_locations = closure(
        &categories.disabled,
        Carrier::Forward(&category_locations),
    )
    .map_err(contract)?;
    let disabled_items =
        closure(&categories.disabled, Carrier::Reverse(&items.categories)).map_err(contract)?;

    let item_count = tally_held(request.held, &items.pool_counts, request.clamp_counts);
    let category_count = aggregate_count(&items.categories, &item_count);
    let category_pool_count = aggregate_count(&items.categories, &items.pool_counts);
    let phantom_items = invert_phantoms(&items.phantoms);

    Ok(Snapshot {
        game: request.location.game.clone(),
        options,
        clamp_counts: request.clamp_counts,
        category_locations: freeze_membership(category_locations),
        location_categories: freeze_membership(location_categories),
        category_items: freeze_membership(category_items),
        item_categories: freeze_membership(items.categories),
        item_count: freeze_map(item_count),
        item_pool_count: freeze_map(items.pool_counts),
        category_count: freeze_map(category_count),
        category_pool_count: freeze_map(category_pool_count),
        item_phantoms: freeze_map(items.phantoms),
        phantom_items: freeze_map(phantom_items),
        requirements: freeze_map(locations.requirements),
        category_options: freeze_membership(category_options),
        hidden_categories: freeze_set(categories.hidden),
        disabled_categories: freeze_set(categories.disabled),
        disabled_locations: freeze_set(disabled_locations),
        disabled_items: freeze_set(disabled_items),
    })
}

/// Every category the package mentions: declared in the category table, or
/// named by an item or a location.
fn category_universe(
    categories: &RawCategories,
    items: &RawItems,
    locations: &RawLocations,
) -> BTreeSet<CategoryName> {
    categories
        .option_keys
        .keys()
        .chain(&categories.hidden)
        .chain(items.categories.values().flatten())
        .chain(locations.categories.keys())
        .cloned()
        .collect()
}

/// Counts held units per item, optionally capped at the pool size. Items
/// left with no units are omitted.
fn tally_held(
    held: &[ItemName],
    pool: &BTreeMap<ItemName, u32>,
    clamp: bool,
) -> BTreeMap<ItemName, u32> {
    let mut counts: BTreeMap<ItemName, u32> = BTreeMap::new();
    for item in held {
        let count = counts.entry(item.clone()).or_insert(0);
        *count = count.saturating_add(1);
    }
    if clamp {
        counts = counts
            .into_iter()
            .filter_map(|(item, count)| {
                let capped = count.min(pool.get(&item).copied().unwrap_or(0));
                (capped > 0).then_some((item, capped))
            })
            .collect();
    }
    counts
}

/// Renders an error with its sources, skipping causes already quoted.
fn describe(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(
            || "panic during snapshot build".to_owned(),
            |message| format!("panic during snapshot build: {message}"),
        )
}
