mod cli;
mod error_fmt;
mod logging;
mod measure;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use std::path::{Path, PathBuf};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "weii failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::format_error_json(&e));
            } else {
                eprintln!("{}", error_fmt::humanize(&e));
            }
            error_fmt::exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> eyre::Result<i32> {
    color_eyre::install()?;

    if let Commands::InitConfig { force } = cli.cmd {
        let path = config_path(cli.config.as_deref())?;
        init_config(&path, force)?;
        return Ok(error_fmt::EXIT_OK);
    }

    let cfg = load_config(cli.config.as_deref())?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(?cfg, "configuration loaded");

    match cli.cmd {
        Commands::Measure(args) => measure::run_measure(&cfg, &args, cli.json),
        Commands::SelfCheck { simulate } => {
            measure::run_self_check(&cfg, simulate)?;
            Ok(error_fmt::EXIT_OK)
        }
        Commands::InitConfig { .. } => Ok(error_fmt::EXIT_OK),
    }
}

fn config_path(explicit: Option<&Path>) -> eyre::Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => cli::default_config_path()
            .ok_or_else(|| eyre::eyre!("cannot determine config directory; pass --config")),
    }
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(explicit: Option<&Path>) -> eyre::Result<weii_config::Config> {
    if let Some(path) = explicit {
        return weii_config::load_file(path);
    }
    match cli::default_config_path() {
        Some(path) if path.exists() => weii_config::load_file(&path),
        _ => Ok(weii_config::Config::default()),
    }
}

fn init_config(path: &Path, force: bool) -> eyre::Result<()> {
    if path.exists() && !force {
        eyre::bail!(
            "config {} already exists; pass --force to overwrite",
            path.display()
        );
    }
    weii_config::Config::default().save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
