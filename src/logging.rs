use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
    EnvFilter,
    Registry,
};

/// Environment variable holding the log filter, e.g. `simple_script=trace`.
pub const LOG_ENV_VAR: &str = "SIMPLE_SCRIPT_LOG";

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "warn,simple_script=debug";

/// Handle to change the log filter after startup, for the `:verbose` command.
pub struct LogHandle {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
    // an explicit filter from the environment always wins over verbose mode.
    from_env: bool,
}

impl LogHandle {
    #[cfg(test)]
    pub fn without_subscriber(from_env: bool) -> LogHandle {
        LogHandle { handle: None, from_env }
    }

    /// Whether the filter was given in `SIMPLE_SCRIPT_LOG`, which makes
    /// `set_verbose` a no-op.
    pub fn filter_from_env(&self) -> bool {
        self.from_env
    }

    pub fn set_verbose(&self, verbose: bool) {
        if self.from_env {
            return;
        }
        if let Some(handle) = &self.handle {
            if let Err(e) = handle.reload(make_filter(verbose)) {
                eprintln!("warning: failed to change log level: {}", e);
            }
        }
    }
}

fn make_filter(verbose: bool) -> EnvFilter {
    EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
}

/// Logs go to stderr so they don't mix with the results printed on stdout.
pub fn init(verbose: bool) -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_env(LOG_ENV_VAR) {
        Ok(filter) => (filter, true),
        Err(_) => (make_filter(verbose), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let layer = fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr);

    let handle = match tracing_subscriber::registry().with(filter).with(layer).try_init() {
        Ok(()) => Some(handle),
        Err(e) => {
            eprintln!("warning: failed to initialize logging: {}", e);
            None
        },
    };
    LogHandle { handle, from_env }
}
