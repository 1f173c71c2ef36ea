// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::{BackendKind, Config};
use copydesk_app::{AppState, ArticleFilter};
use copydesk_db::Store;
use copydesk_remote::Client;
use copydesk_tui::AppRuntime;
use runtime::{DbRuntime, DeskSettings, RemoteRuntime, write_export};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `copydesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let backend = if options.demo {
        BackendKind::Sqlite
    } else {
        config.backend_kind()
    };
    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        match backend {
            BackendKind::Sqlite => println!("{}", db_path.display()),
            BackendKind::Remote => println!("{}", config.base_url().unwrap_or_default()),
        }
        return Ok(());
    }

    let data_dir = copydesk_db::data_dir()?;
    let _log_guard = logging::init(&data_dir, config.log_level())?;
    info!(config = %options.config_path.display(), ?backend, "starting copydesk");

    let settings = DeskSettings {
        author: config.author().to_owned(),
        editors: config.editors(),
        export_dir: env::current_dir().context("resolve current directory for exports")?,
    };

    match backend {
        BackendKind::Sqlite => {
            let store = Store::open(&db_path).with_context(|| {
                format!(
                    "open database {} -- if this path is wrong, set [storage].db_path or COPYDESK_DB_PATH",
                    db_path.display()
                )
            })?;
            store.bootstrap()?;
            if options.demo {
                store.seed_demo_data()?;
            }
            if options.check_only {
                return Ok(());
            }
            launch(DbRuntime::new(&store, settings), options.export_path.as_deref())
        }
        BackendKind::Remote => {
            let client = Client::new(
                config.base_url().unwrap_or_default(),
                config.api_key().unwrap_or_default(),
                config.timeout()?,
            )
            .with_context(|| {
                format!(
                    "invalid [backend] config in {}; fix base_url/api_key/timeout values",
                    options.config_path.display()
                )
            })?;
            if options.check_only {
                return Ok(());
            }
            launch(
                RemoteRuntime::new(client, settings),
                options.export_path.as_deref(),
            )
        }
    }
}

fn launch<R: AppRuntime>(mut desk: R, export_path: Option<&Path>) -> Result<()> {
    if let Some(path) = export_path {
        let articles = desk.list_articles(&ArticleFilter::default())?;
        let report = write_export(path, &articles, &[])?;
        println!(
            "exported {} articles to {}",
            report.rows,
            report.path.display()
        );
        return Ok(());
    }

    let mut state = AppState::default();
    copydesk_tui::run_app(&mut state, &mut desk)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    export_path: Option<PathBuf>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        export_path: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--export" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export requires an output file path"))?;
                options.export_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("copydesk: spreadsheet-style article editor");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path (or service URL)");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --check                  Validate config and backend, then exit");
    println!("  --export <path>          Write every article to a CSV file and exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, launch, parse_cli_args};
    use crate::runtime::{DbRuntime, DeskSettings};
    use anyhow::Result;
    use copydesk_db::Store;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/copydesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_db_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                export_path: None,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_export_paths() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--export",
                "/tmp/out.csv",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.export_path, Some(PathBuf::from("/tmp/out.csv")));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--export"], default_options_path())
            .expect_err("missing export value should fail");
        assert!(error.to_string().contains("--export requires"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--demo", "--check", "-h"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.print_db_path);
        assert!(options.demo);
        assert!(!options.print_example);
        assert!(options.check_only);
        assert!(options.show_help);
        Ok(())
    }

    #[test]
    fn export_flag_writes_seeded_articles_without_tui() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let seeded = store.seed_demo_data()?;

        let out = temp.path().join("articles.csv");
        let runtime = DbRuntime::new(
            &store,
            DeskSettings {
                author: "데스크".to_owned(),
                editors: Vec::new(),
                export_dir: temp.path().to_path_buf(),
            },
        );
        launch(runtime, Some(&out))?;

        let written = std::fs::read_to_string(&out)?;
        let mut reader = csv::Reader::from_reader(written.as_bytes());
        assert_eq!(reader.records().count(), seeded);
        Ok(())
    }
}
