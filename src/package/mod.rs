//! Package reader collaborators.
//!
//! A game-definition package is read through [`PackageReader`], which hands
//! back the raw, one-directional relationship tables the snapshot is built
//! from. [`PackageLocator`] finds the package for a game (or reports that none
//! applies) and [`ExternalInterpreter`] runs the extractor for archived
//! packages. All three are traits so assembly can be exercised with fakes.
//!
//! Concrete implementations:
//! - [`TablesReader`] reads the JSON tables of a package.
//! - [`ManualPackageLocator`] resolves unpacked directories and archives.
//! - [`PythonInterpreter`] invokes the extractor script.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::inference::{Membership, Weighted};
use crate::names::{CategoryName, ItemName, LocationName, PhantomName, Requirement};
use crate::options::OptionTable;

mod interpreter;
mod locate;
mod tables;

pub use interpreter::PythonInterpreter;
pub use locate::ManualPackageLocator;
pub use tables::{
    CategoryEntry, ItemEntry, LocationEntry, ManualTables, OptionEntry, OptionsDocument,
    RequiresEntry, TablesReader,
};

/// Category data as declared by the package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawCategories {
    /// Categories switched off by the current options.
    pub disabled: BTreeSet<CategoryName>,
    /// Categories the package asks trackers not to display.
    pub hidden: BTreeSet<CategoryName>,
    /// Option keys gating each declared category; every declared category has
    /// an entry, possibly empty.
    pub option_keys: BTreeMap<CategoryName, BTreeSet<String>>,
}

/// Item data as declared by the package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawItems {
    /// Categories of every item; uncategorised items map to an empty set.
    pub categories: Membership<ItemName, CategoryName>,
    /// Units of each item in the full item pool.
    pub pool_counts: BTreeMap<ItemName, u32>,
    /// Phantom items each item contributes to, with weights.
    pub phantoms: BTreeMap<ItemName, Weighted<PhantomName>>,
}

/// Location data as declared by the package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawLocations {
    /// Requirement expression of every location.
    pub requirements: BTreeMap<LocationName, Requirement>,
    /// Locations grouped by category.
    pub categories: Membership<CategoryName, LocationName>,
}

/// Goal selection used to pick the active victory location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalData {
    /// Victory location the player is aiming for.
    pub location: LocationName,
}

/// Where to look for a game's package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageLocation {
    /// Game name, e.g. `Manual_Zelda_Someone`.
    pub game: String,
    /// Directory holding packages.
    pub root: PathBuf,
}

impl PackageLocation {
    /// Creates a location for `game` under `root`.
    #[must_use]
    pub fn new(game: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            game: game.into(),
            root: root.into(),
        }
    }
}

/// Failures reading a package or running its extractor.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A package file could not be read.
    #[error("failed to read `{path}`")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A table was not valid JSON or did not match the expected schema.
    #[error("table `{table}` is malformed")]
    Json {
        /// Table name.
        table: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A required table was absent.
    #[error("package has no `{0}` table")]
    MissingTable(String),
    /// Two entries of a table share a name.
    #[error("duplicate {table} entry `{name}`")]
    DuplicateName {
        /// Table kind (`item`, `location`).
        table: &'static str,
        /// Repeated name.
        name: String,
    },
    /// An archived package was found but no interpreter was configured.
    #[error("package `{0}` is archived and needs an external interpreter")]
    InterpreterRequired(PathBuf),
    /// The interpreter could not be started.
    #[error("failed to start interpreter `{program}`")]
    InterpreterSpawn {
        /// Interpreter program.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The interpreter ran but reported failure.
    #[error("extractor exited with {status}: {stderr}")]
    InterpreterFailed {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The interpreter produced output that was not UTF-8.
    #[error("extractor output is not valid UTF-8")]
    InvalidOutput(#[source] std::string::FromUtf8Error),
}

/// Reads the raw relationship tables of one located package.
#[cfg_attr(any(test, feature = "test-support"), mockall::automock)]
pub trait PackageReader {
    /// Option values declared by the package.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] if the option table cannot be read.
    fn options(&self) -> Result<OptionTable, ExtractionError>;

    /// Categories, evaluated against the merged `options`.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] if the category table cannot be read.
    fn extract_categories(&self, options: &OptionTable) -> Result<RawCategories, ExtractionError>;

    /// Items with their categories, pool counts and phantom weights.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] if the item table cannot be read.
    fn extract_items(&self) -> Result<RawItems, ExtractionError>;

    /// Locations with their requirements and categories.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] if the location table cannot be read.
    fn extract_locations(&self, goal: Option<GoalData>) -> Result<RawLocations, ExtractionError>;
}

/// Finds the package for a game.
pub trait PackageLocator {
    /// Returns a reader for the package, or `None` when no package applies.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] when a package exists but cannot be opened.
    fn locate(
        &self,
        location: &PackageLocation,
        interpreter: Option<&dyn ExternalInterpreter>,
    ) -> Result<Option<Box<dyn PackageReader>>, ExtractionError>;
}

/// Runs the extractor over an archived package.
#[cfg_attr(any(test, feature = "test-support"), mockall::automock)]
pub trait ExternalInterpreter {
    /// Returns the extractor's JSON document for `package`.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] when the extractor cannot run or fails.
    fn extract(&self, package: &Path) -> Result<String, ExtractionError>;
}
