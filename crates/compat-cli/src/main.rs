//! `compat-collector` binary

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use compat_cli::{run_infer, run_update, CollectorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn input_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML config file; flags take precedence"),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .value_parser(value_parser!(PathBuf))
                .help("Browser release catalog (JSON)"),
        )
        .arg(
            Arg::new("ua-map")
                .long("ua-map")
                .value_parser(value_parser!(PathBuf))
                .help("User-agent table (JSON)"),
        )
        .arg(
            Arg::new("overrides")
                .long("overrides")
                .value_parser(value_parser!(PathBuf))
                .help("Manual overrides (JSON)"),
        )
        .arg(
            Arg::new("strict-overrides")
                .long("strict-overrides")
                .action(ArgAction::SetTrue)
                .help("Fail on overrides without matching evidence"),
        )
        .arg(
            Arg::new("reports")
                .num_args(0..)
                .value_parser(value_parser!(PathBuf))
                .help("Report files or directories"),
        )
}

fn cli() -> Command {
    Command::new("compat-collector")
        .version(compat_cli::VERSION)
        .about("Infer browser support statements from feature-detection reports")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log skipped candidates"),
        )
        .subcommand(
            input_args(Command::new("update").about("Update the compatibility tree"))
                .arg(
                    Arg::new("tree")
                        .long("tree")
                        .value_parser(value_parser!(PathBuf))
                        .help("Compatibility tree to update (JSON)"),
                )
                .arg(
                    Arg::new("path")
                        .long("path")
                        .help("Feature path prefix or glob"),
                )
                .arg(
                    Arg::new("browser")
                        .long("browser")
                        .action(ArgAction::Append)
                        .help("Only update this browser (repeatable)"),
                )
                .arg(
                    Arg::new("release")
                        .long("release")
                        .help("Only apply inferences ending in release X or X-Y"),
                )
                .arg(
                    Arg::new("exact-only")
                        .long("exact-only")
                        .action(ArgAction::SetTrue)
                        .help("Never write ranged versions"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Decide but do not write the tree"),
                ),
        )
        .subcommand(
            input_args(Command::new("infer").about("Print inferred statements for one feature"))
                .arg(
                    Arg::new("feature")
                        .long("feature")
                        .required(true)
                        .help("Feature path, e.g. api.AbortController"),
                )
                .arg(
                    Arg::new("for-browser")
                        .long("for-browser")
                        .required(true)
                        .help("Browser id"),
                ),
        )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &ArgMatches) -> Result<CollectorConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => CollectorConfig::load(path)?,
        None => CollectorConfig::default(),
    };

    let path_flag = |name: &str| args.try_get_one::<PathBuf>(name).ok().flatten().cloned();
    if let Some(tree) = path_flag("tree") {
        config.tree = Some(tree);
    }
    if let Some(catalog) = path_flag("catalog") {
        config.catalog = Some(catalog);
    }
    if let Some(ua_map) = path_flag("ua-map") {
        config.ua_map = Some(ua_map);
    }
    if let Some(overrides) = path_flag("overrides") {
        config.overrides = Some(overrides);
    }
    if let Some(reports) = args.get_many::<PathBuf>("reports") {
        config.reports = reports.cloned().collect();
    }

    let string_flag = |name: &str| args.try_get_one::<String>(name).ok().flatten().cloned();
    if let Some(path) = string_flag("path") {
        config.update.path = Some(path);
    }
    if let Some(release) = string_flag("release") {
        config.update.release = Some(release);
    }
    if let Ok(Some(browsers)) = args.try_get_many::<String>("browser") {
        config.update.browsers = browsers.cloned().collect();
    }

    let flag = |name: &str| args.try_get_one::<bool>(name).ok().flatten().copied().unwrap_or(false);
    config.update.exact_only |= flag("exact-only");
    config.update.strict_overrides |= flag("strict-overrides");

    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("update", args)) => {
            let config = load_config(args)?;
            let summary = run_update(&config, args.get_flag("dry-run"))?;
            println!("{summary}");
        }
        Some(("infer", args)) => {
            let config = load_config(args)?;
            let feature = args.get_one::<String>("feature").map_or("", String::as_str);
            let browser = args.get_one::<String>("for-browser").map_or("", String::as_str);
            let statements = run_infer(&config, feature, browser)?;
            println!("{}", serde_json::to_string_pretty(&statements)?);
        }
        _ => {}
    }
    Ok(())
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    if let Err(e) = run(&matches) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let matches = cli().get_matches_from([
            "compat-collector",
            "update",
            "--tree",
            "tree.json",
            "--browser",
            "chrome",
            "--browser",
            "firefox",
            "--exact-only",
            "a.json",
            "b.json",
        ]);
        let (_, args) = matches.subcommand().unwrap();
        let config = load_config(args).unwrap();
        assert_eq!(config.tree, Some(PathBuf::from("tree.json")));
        assert_eq!(config.update.browsers, vec!["chrome", "firefox"]);
        assert!(config.update.exact_only);
        assert_eq!(config.reports.len(), 2);
    }

    #[test]
    fn infer_flags_parse() {
        let matches = cli().get_matches_from([
            "compat-collector",
            "infer",
            "--feature",
            "api.Foo",
            "--for-browser",
            "chrome",
        ]);
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "infer");
        let config = load_config(args).unwrap();
        assert_eq!(config.update.path, None);
    }
}
