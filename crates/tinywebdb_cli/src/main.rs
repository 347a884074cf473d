//! Command-line client for a local TinyWebDB store.
//!
//! # Responsibility
//! - Map `store`, `get`, `export`, `import`, `rebuild-index` and `table`
//!   onto `tinywebdb_core` use-cases.
//! - Print the same JSON envelopes a remote client would receive.

mod commands;

use commands::build_cli;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use tinywebdb_core::{SqliteEntryStore, StoreConfig, TagStoreService};

fn main() -> ExitCode {
    let matches = build_cli().get_matches();

    let mut config = StoreConfig::from_env();
    if let Some(db) = matches.get_one::<String>("db") {
        config.db_path = Some(PathBuf::from(db));
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level = level.clone();
    }
    if let Some(dir) = matches.get_one::<String>("log-dir") {
        config.log_dir = Some(PathBuf::from(dir));
    }
    let html = matches.get_flag("html");

    if let Err(err) = config.init_logging() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let conn = match config.open_connection() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let store = match SqliteEntryStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let service = TagStoreService::new(store);

    match commands::run(&service, &matches, html) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("event=cli_command module=cli status=error");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
