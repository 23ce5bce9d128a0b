use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(verbose: bool) -> Result<EnvFilter> {
    let level = if verbose { "fineprint=debug" } else { "fineprint=info" };
    Ok(EnvFilter::from_default_env()
        .add_directive(level.parse()?)
        .add_directive("warn".parse()?))
}

/// Install the global subscriber: stderr always, plus a plain-text file when asked
pub fn init_logging(verbose: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    // stdout carries command output, so logs never go there
    if let Some(log_file) = log_file {
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create log directory {}", parent.display()))?;
        }

        let file = fs::File::create(&log_file)
            .context(format!("Failed to create log file {}", log_file.display()))?;
        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(file);

        tracing_subscriber::registry()
            .with(env_filter(verbose)?)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter(verbose)?)
            .with(stderr_layer)
            .init();
    }

    Ok(())
}

/// Log file under the platform data directory
pub fn default_log_file() -> PathBuf {
    let mut path = match directories::ProjectDirs::from("com", "fineprint", "fineprint") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => PathBuf::from("./logs"),
    };

    path.push("fineprint.log");
    path
}
