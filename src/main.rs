//! Offline index builder.
//!
//! `upcat <config.json> [source-dir]` reads the reference inputs from
//! `<source-dir>/<remote_dir>` (current directory by default), builds the
//! worklists and catalog, and prints the initial host data and state as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use upcat::catalog::{self, HostData, HostState};
use upcat::config::AppConfig;
use upcat::local::{LocalFiles, StaticMembership};
use upcat::AppError;

fn usage() -> ExitCode {
    eprintln!("Usage: upcat <config.json> [source-dir]");
    ExitCode::from(2)
}

/// What the host needs to start the UI.
#[derive(Serialize)]
struct Output {
    data: HostData,
    state: HostState,
}

fn run(config_path: PathBuf, source_dir: PathBuf) -> Result<Output, AppError> {
    let mut config = AppConfig::load(&config_path)?;
    config.apply_env()?;

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
    log::info!("Reading reference inputs below {:?}", source_dir);

    let files = LocalFiles::new(source_dir);
    let members = StaticMembership::new(config.members.clone());
    let index = catalog::prepare(&files, &members, &config)?;

    Ok(Output {
        data: HostData::from_index(&index),
        state: HostState::initial(&index),
    })
}

fn main() -> ExitCode {
    let mut args = std::env::args_os().skip(1);
    let Some(config_path) = args.next().map(PathBuf::from) else {
        return usage();
    };
    let source_dir = args.next().map_or_else(|| PathBuf::from("."), PathBuf::from);
    if args.next().is_some() {
        return usage();
    }

    match run(config_path, source_dir) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to serialize output: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("upcat error: {e}");
            ExitCode::FAILURE
        }
    }
}
