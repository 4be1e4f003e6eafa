#![cfg_attr(docsrs, feature(doc_cfg))]
//! Relationship index and disabled-set inference for randomizer game trackers.
//!
//! A game-definition package declares items, locations and categories. This
//! crate reads such a package through the collaborators in [`package`], runs
//! the pure rules in [`inference`] over its tables and freezes the result into
//! an immutable [`Snapshot`] that a tracker UI or requirement evaluator can
//! query from any thread.
//!
//! ```rust,no_run
//! use tracker_index::prelude::*;
//!
//! let location = PackageLocation::new("Manual_Zelda_Someone", "/srv/packages");
//! let options = OptionTable::new();
//! let held = [ItemName::from("Sword")];
//! let request = BuildRequest::new(&location, &options).held(&held);
//! if let Some(snapshot) = build(&request, &ManualPackageLocator) {
//!     println!("{} disabled locations", snapshot.disabled_locations().len());
//! }
//! ```
pub mod constants;
pub mod inference;
pub mod logging;
mod macros;
pub mod names;
pub mod options;
pub mod package;
pub mod snapshot;
pub use constants::*;

// Re-export commonly used items
pub use logging::{init as init_logging, LogSink};
pub use names::{CategoryName, ItemName, LocationName, PhantomName, Requirement};
pub use options::{OptionParseError, OptionTable};
pub use package::{
    ExternalInterpreter, ExtractionError, GoalData, ManualPackageLocator, PackageLocation,
    PackageLocator, PackageReader, PythonInterpreter, TablesReader,
};
pub use snapshot::{
    build, try_build, BuildError, BuildErrorKind, BuildRequest, BuildStage, GoalSource, Snapshot,
    SnapshotCell,
};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use tracker_index::prelude::*;
    //! ```

    pub use crate::build;
    pub use crate::names::{CategoryName, ItemName, LocationName};
    pub use crate::BuildRequest;
    pub use crate::ManualPackageLocator;
    pub use crate::OptionTable;
    pub use crate::PackageLocation;
    pub use crate::Snapshot;
    pub use crate::SnapshotCell;
}
