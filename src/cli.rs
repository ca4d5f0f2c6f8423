use crate::config::DEFAULT_CONFIG_FILE;
use anyhow::{Result, bail};
use clap::{Arg, ArgAction, Command};
use log::{Level, LevelFilter};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    /// Write a template config instead of merging.
    pub generate: bool,
    /// Suppress the summary report.
    pub silent: bool,
    pub verbosity: u8,
}

pub fn command() -> Command {
    Command::new("srcpress")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Merges source files into one, hoisting imports into a shared header")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version"),
        )
        .arg(
            Arg::new("words")
                .value_name("ARGS")
                .help("`config=<path>` to pick the config file, `gen-config` to write a template")
                .num_args(0..),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets the config file path")
                .num_args(1),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Do not print the summary")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Log more detail (repeat for debug output)")
                .action(ArgAction::Count),
        )
}

pub fn parse_args() -> Result<CliArgs> {
    parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().get_matches_from(args);

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    let mut generate = false;

    for word in matches.get_many::<String>("words").into_iter().flatten() {
        let word = word.trim();
        if word == "gen-config" {
            generate = true;
        } else if let Some(path) = word.strip_prefix("config=") {
            let path = path.trim();
            if path.is_empty() {
                bail!("config= needs a file path");
            }
            config_path = PathBuf::from(path);
        } else {
            bail!("Unknown argument: {word} (expected `config=<path>` or `gen-config`)");
        }
    }

    if let Some(path) = matches.get_one::<String>("config") {
        config_path = PathBuf::from(path);
    }

    Ok(CliArgs {
        config_path,
        generate,
        silent: matches.get_flag("silent"),
        verbosity: matches.get_count("verbose"),
    })
}

/// Sets up `env_logger`. Warnings are always shown; `RUST_LOG` overrides.
pub fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let label = match record.level() {
                Level::Error => "Error",
                Level::Warn => "Warning",
                Level::Info => "Info",
                Level::Debug | Level::Trace => "Debug",
            };
            writeln!(buf, "{label}: {}", record.args())
        })
        .init();
}
