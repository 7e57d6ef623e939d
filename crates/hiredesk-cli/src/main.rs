// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use hiredesk_api::RestClient;
use hiredesk_app::{ApplicationId, Backend, Route};
use hiredesk_db::LocalStore;
use hiredesk_tui::Session;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

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
            "load config {}; run `hiredesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    // The local offset must be read before any worker thread exists.
    let zone = config.display_zone()?;
    let log_path = logging::init(&config)?;
    tracing::info!(
        config = %options.config_path.display(),
        log = %log_path.display(),
        backend = ?options.backend,
        "starting hiredesk"
    );

    let backend = open_backend(&config, &options)?;
    let mut session = Session::new(backend, zone);

    if options.check_only {
        session.navigate(Route::ApplicationList);
        session.settle(config.api_timeout()?.saturating_mul(2))?;
        if let Some(message) = session.store().error_message() {
            bail!("startup check failed: {message}");
        }
        return Ok(());
    }

    session.navigate(options.start);
    hiredesk_tui::run_app(&mut session)
}

fn open_backend(config: &Config, options: &CliOptions) -> Result<Arc<dyn Backend>> {
    match options.backend {
        BackendChoice::Demo => {
            let store = LocalStore::open_memory()?;
            store.bootstrap()?;
            store.seed_demo_data()?;
            Ok(Arc::new(store))
        }
        BackendChoice::Local => {
            let db_path = config.db_path()?;
            let store = open_local(&db_path)?;
            Ok(Arc::new(store))
        }
        BackendChoice::Api => {
            let mut client = RestClient::new(config.api_base_url(), config.api_timeout()?)
                .with_context(|| {
                    format!(
                        "invalid [api] config in {}; fix base_url/timeout values",
                        options.config_path.display()
                    )
                })?;
            if let Some(token) = config.api_token() {
                client = client.with_token(token);
            }
            if options.check_only {
                client.ping()?;
            }
            Ok(Arc::new(client))
        }
    }
}

fn open_local(db_path: &Path) -> Result<LocalStore> {
    let store = LocalStore::open(db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or HIREDESK_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    Ok(store)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendChoice {
    Api,
    Local,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    backend: BackendChoice,
    check_only: bool,
    show_help: bool,
    start: Route,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        backend: BackendChoice::Api,
        check_only: false,
        show_help: false,
        start: Route::ApplicationList,
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
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.backend = pick_backend(options.backend, BackendChoice::Demo)?;
            }
            "--local" => {
                options.backend = pick_backend(options.backend, BackendChoice::Local)?;
            }
            "--check" => {
                options.check_only = true;
            }
            "--new" => {
                options.start = pick_start(options.start, Route::ApplicationNew)?;
            }
            "--edit" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--edit requires an application id"))?;
                let id = value.as_ref().parse::<ApplicationId>().with_context(|| {
                    format!("--edit expects a numeric application id, got {:?}", value.as_ref())
                })?;
                options.start = pick_start(options.start, Route::ApplicationEdit(id))?;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    Ok(options)
}

fn pick_backend(current: BackendChoice, requested: BackendChoice) -> Result<BackendChoice> {
    if current != BackendChoice::Api && current != requested {
        bail!("--demo and --local cannot be combined");
    }
    Ok(requested)
}

fn pick_start(current: Route, requested: Route) -> Result<Route> {
    if current != Route::ApplicationList && current != requested {
        bail!("--new and --edit cannot be combined");
    }
    Ok(requested)
}

fn print_help() {
    println!("hiredesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --local                  Use the local SQLite database instead of the API");
    println!("  --check                  Validate config and backend reachability, then exit");
    println!("  --new                    Open the create form");
    println!("  --edit <id>              Open the edit form for an application");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{BackendChoice, CliOptions, parse_cli_args};
    use anyhow::Result;
    use hiredesk_app::{ApplicationId, Route};
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/hiredesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                backend: BackendChoice::Api,
                check_only: false,
                show_help: false,
                start: Route::ApplicationList,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--edit"], default_options_path())
            .expect_err("missing id should fail");
        assert!(error.to_string().contains("--edit requires an application id"));
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
    fn parse_cli_args_sets_start_route() -> Result<()> {
        let options = parse_cli_args(vec!["--new"], default_options_path())?;
        assert_eq!(options.start, Route::ApplicationNew);

        let options = parse_cli_args(vec!["--edit", " 42"], default_options_path())?;
        assert_eq!(options.start, Route::ApplicationEdit(ApplicationId::new(42)));
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_bad_edit_id_and_conflicting_routes() {
        let error = parse_cli_args(vec!["--edit", "abc"], default_options_path())
            .expect_err("non-numeric id should fail");
        assert!(error.to_string().contains("numeric application id"));

        let error = parse_cli_args(vec!["--new", "--edit", "3"], default_options_path())
            .expect_err("conflicting routes should fail");
        assert!(error.to_string().contains("cannot be combined"));
    }

    #[test]
    fn parse_cli_args_picks_backend() -> Result<()> {
        let options = parse_cli_args(vec!["--demo", "--check"], default_options_path())?;
        assert_eq!(options.backend, BackendChoice::Demo);
        assert!(options.check_only);

        let options = parse_cli_args(vec!["--local"], default_options_path())?;
        assert_eq!(options.backend, BackendChoice::Local);

        let error = parse_cli_args(vec!["--demo", "--local"], default_options_path())
            .expect_err("two backends should fail");
        assert!(error.to_string().contains("cannot be combined"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_print_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
