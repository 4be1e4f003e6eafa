//! Build failure taxonomy.

use std::fmt;

use thiserror::Error;

use crate::inference::InferenceError;
use crate::package::ExtractionError;

/// Progress of a snapshot build.
///
/// Builds move `NotStarted → Reading → Inferring → Assembled`; any stage
/// before `Assembled` may fall through to `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildStage {
    /// Nothing has run yet.
    NotStarted,
    /// Locating the package and extracting its tables.
    Reading,
    /// Running the inference rules and freezing the result.
    Inferring,
    /// A snapshot was produced.
    Assembled,
    /// The build stopped without a snapshot.
    Failed,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not started",
            Self::Reading => "reading",
            Self::Inferring => "inferring",
            Self::Assembled => "assembled",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Coarse classification of a [`BuildError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildErrorKind {
    /// No package applies to the requested game.
    NotApplicable,
    /// The located package could not produce one of its tables.
    ExtractionFailure,
    /// Anything else that stopped the build.
    UnexpectedFailure,
    /// An inference rule was called outside its contract.
    ContractViolation,
}

/// Reasons a snapshot build produced no snapshot.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No package applies to the requested game.
    #[error("no applicable package for game `{game}`")]
    NotApplicable {
        /// Requested game.
        game: String,
    },
    /// The package reader failed to produce a table.
    #[error("extraction failed while {stage}: {source}")]
    Extraction {
        /// Stage the build was in.
        stage: BuildStage,
        /// Reader failure.
        #[source]
        source: ExtractionError,
    },
    /// Opening the package, running the extractor, or a collaborator panic.
    #[error("unexpected failure while {stage}: {message}")]
    Unexpected {
        /// Stage the build was in.
        stage: BuildStage,
        /// Description of the failure.
        message: String,
    },
    /// An inference rule rejected its input.
    #[error("inference contract violated while {stage}: {source}")]
    ContractViolation {
        /// Stage the build was in.
        stage: BuildStage,
        /// Rule failure.
        #[source]
        source: InferenceError,
    },
}

impl BuildError {
    /// Classification of the failure.
    #[must_use]
    pub const fn kind(&self) -> BuildErrorKind {
        match self {
            Self::NotApplicable { .. } => BuildErrorKind::NotApplicable,
            Self::Extraction { .. } => BuildErrorKind::ExtractionFailure,
            Self::Unexpected { .. } => BuildErrorKind::UnexpectedFailure,
            Self::ContractViolation { .. } => BuildErrorKind::ContractViolation,
        }
    }

    /// Stage the build had reached when it failed.
    #[must_use]
    pub const fn stage(&self) -> BuildStage {
        match self {
            Self::NotApplicable { .. } => BuildStage::Reading,
            Self::Extraction { stage, .. }
            | Self::Unexpected { stage, .. }
            | Self::ContractViolation { stage, .. } => *stage,
        }
    }
}
