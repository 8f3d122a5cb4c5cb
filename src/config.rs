use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "covid-health-tracker";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Record file used when neither `--data-file` nor the env var is set.
pub const DEFAULT_DATA_FILE: &str = "userdata.txt";

pub const DATA_FILE_ENV: &str = "COVID_TRACKER_DATA";
pub const PASSWORD_ENV: &str = "COVID_TRACKER_PASSWORD";
pub const LOG_ENV: &str = "COVID_TRACKER_LOG";

pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "covid_health_tracker=debug"
    } else {
        "covid_health_tracker=info"
    }
}

/// Logs go to stderr; stdout is reserved for program output.
pub fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("{} v{} starting", APP_NAME, APP_VERSION);
}
