//! `tracker-index` command line entry point.
//!
//! Builds a snapshot for one game package and writes it to stdout as JSON.
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser};
use tracker_index::options::parse_assignment;
use tracker_index::{
    build, init_logging, BuildRequest, ExternalInterpreter, GoalData, ItemName, LocationName,
    ManualPackageLocator, OptionTable, PackageLocation, PythonInterpreter,
};

/// Build the relationship index of a randomizer game package
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding game packages
    #[arg(long, env = "TRACKER_PACKAGES")]
    packages: PathBuf,

    /// Game name, e.g. `Manual_Zelda_Someone`
    #[arg(long)]
    game: String,

    /// Held item; repeat for multiple units
    #[arg(long = "held", value_name = "ITEM")]
    held: Vec<String>,

    /// Option assignment `key=value`
    #[arg(long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    options: Vec<(String, i64)>,

    /// Victory location to keep when the package declares several
    #[arg(long, value_name = "LOCATION")]
    goal: Option<String>,

    /// Clamp held counts to the item pool
    #[arg(long)]
    clamp_counts: bool,

    #[command(flatten)]
    extractor: ExtractorArgs,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Settings for extracting archived packages.
#[derive(ClapArgs)]
struct ExtractorArgs {
    /// Interpreter running the extractor script
    #[arg(long, env = "TRACKER_PYTHON", requires_all = ["extractor", "archipelago_repo"])]
    python: Option<PathBuf>,

    /// Extractor script
    #[arg(long, env = "TRACKER_EXTRACTOR")]
    extractor: Option<PathBuf>,

    /// Checkout of the framework the extractor imports from
    #[arg(long, env = "ARCHIPELAGO_REPO_PATH")]
    archipelago_repo: Option<PathBuf>,
}

impl ExtractorArgs {
    fn interpreter(&self) -> Option<PythonInterpreter> {
        match (&self.python, &self.extractor, &self.archipelago_repo) {
            (Some(python), Some(script), Some(repo)) => {
                Some(PythonInterpreter::new(python, script, repo))
            }
            _ => None,
        }
    }
}

fn parse_option(input: &str) -> Result<(String, i64), String> {
    parse_assignment(input).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let location = PackageLocation::new(args.game.as_str(), &args.packages);
    let options: OptionTable = args.options.iter().cloned().collect();
    let held: Vec<ItemName> = args.held.iter().map(String::as_str).map(ItemName::from).collect();
    let interpreter = args.extractor.interpreter();
    let goal = args.goal.as_deref().map(|name| GoalData {
        location: LocationName::from(name),
    });
    let goal_source = || goal.clone();

    let mut request = BuildRequest::new(&location, &options)
        .held(&held)
        .clamp_counts(args.clamp_counts)
        .goal(&goal_source);
    if let Some(python) = &interpreter {
        request = request.interpreter(python as &dyn ExternalInterpreter);
    }

    let Some(snapshot) = build(&request, &ManualPackageLocator) else {
        bail!(
            "no snapshot for `{}` under {}",
            args.game,
            args.packages.display()
        );
    };

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &snapshot).context("writing snapshot")?;
    writeln!(stdout).context("writing snapshot")?;
    Ok(())
}
