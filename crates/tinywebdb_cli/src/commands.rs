//! Clap command tree and dispatch.

use clap::{Arg, ArgAction, ArgMatches, Command};
use tinywebdb_core::service::bulk::format_entry_list;
use tinywebdb_core::{EntryStore, TagStoreService};

/// Builds the full command tree.
pub fn build_cli() -> Command {
    Command::new("tinywebdb")
        .about("Tag/value store compatible with TinyWebDB clients")
        .version(tinywebdb_core::core_version())
        .subcommand_required(true)
        .arg(
            Arg::new("db")
                .long("db")
                .help("Database file (default: $TINYWEBDB_DB_PATH, else in-memory)")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("trace|debug|info|warn|error")
                .global(true),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .help("Absolute directory for rolling log files")
                .global(true),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help("Escape markup in output, as for the web form")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("store")
                .about("Store a JSON value under a tag; \"*delete*\" deletes it")
                .arg(Arg::new("tag").required(true))
                .arg(Arg::new("value").required(true)),
        )
        .subcommand(
            Command::new("get")
                .about("Get the value stored under a tag")
                .arg(Arg::new("tag").required(true)),
        )
        .subcommand(Command::new("export").about("Print every tag/value pair"))
        .subcommand(
            Command::new("import")
                .about("Add tag/value pairs from a JSON file")
                .arg(Arg::new("file").required(true)),
        )
        .subcommand(
            Command::new("rebuild-index").about("Recompute *all_tags* from the stored entries"),
        )
        .subcommand(Command::new("table").about("Print the admin table rows"))
}

/// Runs the selected subcommand and returns its printable output.
pub fn run<S: EntryStore>(
    service: &TagStoreService<S>,
    matches: &ArgMatches,
    html: bool,
) -> Result<String, String> {
    match matches.subcommand() {
        Some(("store", sub)) => {
            let tag = required(sub, "tag")?;
            let value = required(sub, "value")?;
            let response = service.store(tag, value).map_err(|err| err.to_string())?;
            if let Some(warning) = response.warning.as_deref() {
                eprintln!("{warning}");
            }
            let response = if html { response.escaped() } else { response };
            Ok(response.to_json())
        }
        Some(("get", sub)) => {
            let tag = required(sub, "tag")?;
            let response = service.get(tag).map_err(|err| err.to_string())?;
            let response = if html { response.escaped() } else { response };
            Ok(response.to_json())
        }
        Some(("export", _)) => service.export_all().map_err(|err| err.to_string()),
        Some(("import", sub)) => {
            let path = required(sub, "file")?;
            let text = std::fs::read_to_string(path)
                .map_err(|err| format!("cannot read `{path}`: {err}"))?;
            let outcome = service.import_text(&text).map_err(|err| err.to_string())?;
            for tag in &outcome.skipped_tags {
                eprintln!("skipped reserved tag or delete value: {tag}");
            }
            let separator = if html { "<br>" } else { "\n" };
            let listed = if html {
                let escaped = outcome.escaped_entries();
                pairs_of(&escaped)
            } else {
                outcome.added_entries.clone()
            };
            Ok(format!(
                "These entries have been added to the database:{separator}{}",
                format_entry_list(&listed, separator)
            ))
        }
        Some(("rebuild-index", _)) => {
            let tags = service.rebuild_index().map_err(|err| err.to_string())?;
            Ok(format!("rebuilt *all_tags* with {} tags", tags.len()))
        }
        Some(("table", _)) => {
            let rows = service.table_rows().map_err(|err| err.to_string())?;
            let lines: Vec<String> = rows
                .iter()
                .map(|row| {
                    format!(
                        "{}\t{}\t{}\t{}",
                        row.tag,
                        row.value,
                        row.timestamp,
                        if row.deletable { "deletable" } else { "-" }
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        Some((other, _)) => Err(format!("unknown command `{other}`")),
        None => Err("no command given".to_string()),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument `{name}`"))
}

fn pairs_of(value: &tinywebdb_core::TagValue) -> Vec<(String, tinywebdb_core::TagValue)> {
    value
        .as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(|pair| match pair.as_list()? {
            [tag, value] => Some((tag.as_str()?.to_string(), value.clone())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{build_cli, run};
    use tinywebdb_core::db::open_db_in_memory;
    use tinywebdb_core::{SqliteEntryStore, TagStoreService};

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn store_and_get_print_wire_envelopes() {
        let conn = open_db_in_memory().unwrap();
        let service = TagStoreService::new(SqliteEntryStore::try_new(&conn).unwrap());

        let matches = build_cli().get_matches_from(["tinywebdb", "store", "x", "\"hello\""]);
        assert_eq!(
            run(&service, &matches, false).unwrap(),
            r#"["STORED","x","hello"]"#
        );

        let matches = build_cli().get_matches_from(["tinywebdb", "get", "x"]);
        assert_eq!(
            run(&service, &matches, false).unwrap(),
            r#"["VALUE","x","\"hello\""]"#
        );
    }

    #[test]
    fn import_summary_lists_only_added_entries() {
        let conn = open_db_in_memory().unwrap();
        let service = TagStoreService::new(SqliteEntryStore::try_new(&conn).unwrap());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        std::fs::write(&path, r#"[["a", 1], ["*all_values*", 2], ["b", "*delete*"]]"#).unwrap();

        let path_arg = path.to_str().unwrap();
        let matches = build_cli().get_matches_from(["tinywebdb", "import", path_arg]);
        let output = run(&service, &matches, false).unwrap();
        assert_eq!(
            output,
            "These entries have been added to the database:\n[\n[\"a\",1]\n]"
        );
    }

    #[test]
    fn html_flag_escapes_output() {
        let conn = open_db_in_memory().unwrap();
        let service = TagStoreService::new(SqliteEntryStore::try_new(&conn).unwrap());

        let matches =
            build_cli().get_matches_from(["tinywebdb", "--html", "store", "t", "\"<i>\""]);
        let output = run(&service, &matches, matches.get_flag("html")).unwrap();
        assert_eq!(output, r#"["STORED","t","&lt;i&gt;"]"#);
    }
}
