//! Extractor invocation for archived packages.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use super::{ExternalInterpreter, ExtractionError};
use crate::constants::{APWORLD_PATH_ENV, ARCHIPELAGO_REPO_ENV};

/// Runs an extractor script with an external interpreter.
///
/// The script receives the package path and the framework checkout through
/// environment variables and prints the extractor document on stdout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PythonInterpreter {
    program: PathBuf,
    script: PathBuf,
    archipelago_repo: PathBuf,
}

impl PythonInterpreter {
    /// Configures the interpreter `program`, extractor `script` and framework
    /// checkout the script imports from.
    #[must_use]
    pub fn new(
        program: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
        archipelago_repo: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            archipelago_repo: archipelago_repo.into(),
        }
    }
}

impl ExternalInterpreter for PythonInterpreter {
    fn extract(&self, package: &Path) -> Result<String, ExtractionError> {
        debug!(
            "running extractor {} {} for {}",
            self.program.display(),
            self.script.display(),
            package.display()
        );
        let output = Command::new(&self.program)
            .arg(&self.script)
            .env(APWORLD_PATH_ENV, package)
            .env(ARCHIPELAGO_REPO_ENV, &self.archipelago_repo)
            .output()
            .map_err(|source| ExtractionError::InterpreterSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractionError::InterpreterFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(ExtractionError::InvalidOutput)
    }
}
