//! Tracing setup: console on stderr, optional JSON-lines file.

use crate::cli::FILE_GUARD;
use eyre::WrapErr;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LEVEL: &str = "warn";

/// Install the global subscriber.
///
/// Level precedence: `RUST_LOG`, then `--log-level`, then `[logging] level`.
/// Console output goes to stderr so stdout only carries results.
pub fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    cfg: &weii_config::Logging,
) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.level.as_deref())
        .unwrap_or(DEFAULT_LEVEL)
        .to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let console_text = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let file_layer = match log_file(cfg) {
        Some(path) => {
            let writer = file_writer(path, cfg.rotation.as_deref())?;
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init();
    Ok(())
}

fn file_writer(
    path: &Path,
    rotation: Option<&str>,
) -> eyre::Result<tracing_appender::non_blocking::NonBlocking> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("create log directory {}", dir.display()))?;

    let appender = match rotation.map(str::to_ascii_lowercase).as_deref() {
        Some("daily") => tracing_appender::rolling::daily(dir, name),
        Some("hourly") => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    Ok(writer)
}

fn log_file(cfg: &weii_config::Logging) -> Option<&Path> {
    cfg.file
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(Path::new)
}
