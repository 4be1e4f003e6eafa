//! Logger initialisation and progress reporting.
//!
//! Library code logs through the `log` facade. Snapshot builds additionally
//! forward progress and failure messages to an optional caller-supplied sink
//! so a host UI can surface them without installing a logger.
use env_logger::{Builder, Env};
use log::{info, warn, LevelFilter};

/// Caller-supplied sink receiving progress and diagnostic messages.
pub type LogSink<'a> = &'a dyn Fn(&str);

/// Initializes the global logger.
///
/// When `verbose` is `true`, all debug messages are printed. Otherwise only
/// info level and above are shown.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);

    // `try_init` only fails if a logger was already set. Ignore that case so
    // tests can call `init` multiple times without panicking.
    let _ = builder.try_init();
}

/// Forwards messages to both the `log` facade and an optional sink.
#[derive(Clone, Copy)]
pub(crate) struct Progress<'a> {
    sink: Option<LogSink<'a>>,
}

impl<'a> Progress<'a> {
    pub(crate) const fn new(sink: Option<LogSink<'a>>) -> Self {
        Self { sink }
    }

    pub(crate) fn report(&self, message: &str) {
        info!("{message}");
        self.forward(message);
    }

    pub(crate) fn failure(&self, message: &str) {
        warn!("{message}");
        self.forward(message);
    }

    fn forward(&self, message: &str) {
        if let Some(sink) = self.sink {
            sink(message);
        }
    }
}
