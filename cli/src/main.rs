use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use flexi_logger::{FileSpec, LevelFilter, LogSpecification, Logger, LoggerHandle, WriteMode};

mod output;
mod printer;

mod check;
use check::Check;

mod parse;
use parse::Parse;

mod seed;
use seed::Seed;

const SIMPLE_VERSION_STRING: &str = include!(concat!(env!("OUT_DIR"), "/simple_version_string"));
const VERSION_STRING: &str = include!(concat!(env!("OUT_DIR"), "/version_string"));

#[derive(Parser)]
#[command(name = "reposeed")]
#[command(version(SIMPLE_VERSION_STRING))]
#[command(long_version(VERSION_STRING))]
struct Cli {
    /// `-e`, `--log-stderr`: Log to `stderr` even when a log file is given
    #[arg(short = 'e', long, help = "Log to stderr instead of a file", action = clap::ArgAction::SetTrue, default_value_t = false)]
    log_stderr: bool,

    /// `-f`, `--log-file`: Path to a log file. Logs go to `stderr` when this
    /// isn't given.
    #[arg(short = 'f', long, help = "Send log output to the given file")]
    log_file: Option<PathBuf>,

    /// `-s`, `--log-spec`: Log specification for [flexi_logger](https://docs.rs/flexi_logger/latest/flexi_logger/struct.LogSpecification.html)
    #[arg(short = 's', long, help = "Log spec for flexi_logger")]
    log_spec: Option<String>,

    /// `-l`, `--log-level`: Set the desired log verbosity. Defaults to 0, all values are listed
    /// below:
    ///
    /// | Value | Log Level |
    /// | ----- | --------- |
    /// | **0** | **Warn** |
    /// | 1 | Info |
    /// | 2 | Debug |
    /// | 3 | Trace |
    #[arg(
        short = 'l',
        long,
        help = "Set the log level, 0 = warn, 1 = info, etc",
        long_help = None,
        default_value_t = 0
    )]
    log_level: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the full version string and exit
    #[command()]
    Version,

    /// Parse a single repo list file and print its repositories
    #[command()]
    Parse(Parse),

    /// Build the initial repository list from the vendor and bundled lists
    ///
    /// Vendor lists are looked up at `<root>/etc/<package>/additional_repos.xml`
    /// for every configured root and come before the bundled repositories.
    #[command()]
    Seed(Seed),

    /// Check whether a repo list file is structurally valid
    #[command()]
    Check(Check),
}

impl Cli {
    fn log_level_filter(&self) -> Option<LevelFilter> {
        match self.log_level {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        }
    }

    fn configure_loggers(&self) -> anyhow::Result<LoggerHandle> {
        let log_spec = match (&self.log_spec, self.log_level_filter()) {
            (Some(s), _) => {
                LogSpecification::parse(s).with_context(|| format!("parsing log spec {}", s))?
            }
            (None, Some(lvl)) => LogSpecification::builder().module("reposeed", lvl).build(),
            (None, None) => LogSpecification::env_or_parse("warn")
                .with_context(|| "getting log spec from env")?,
        };

        let mut logger = Logger::with(log_spec);

        if let (false, Some(v)) = (self.log_stderr, &self.log_file) {
            let path = if v.is_absolute() {
                Cow::Borrowed(v)
            } else {
                Cow::Owned(std::env::current_dir()?.join(v))
            };
            logger = logger
                .log_to_file(FileSpec::try_from(path.as_ref()).with_context(|| "creating filespec")?)
                .append()
                .write_mode(WriteMode::BufferAndFlush);
        }

        logger.start().with_context(|| "starting logger")
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = &cli.command {
        println!("{}", VERSION_STRING);
        return Ok(());
    }

    let log_handle = cli.configure_loggers()?;

    let res = match &cli.command {
        Commands::Parse(c) => c.run(),
        Commands::Seed(c) => c.run(),
        Commands::Check(c) => c.run(),
        Commands::Version => unreachable!(),
    };

    log_handle.flush();
    res
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(0, None)]
    #[case(1, Some(LevelFilter::Info))]
    #[case(2, Some(LevelFilter::Debug))]
    #[case(7, Some(LevelFilter::Trace))]
    fn test_log_level_filter(#[case] level: u8, #[case] expected: Option<LevelFilter>) {
        let lvl = level.to_string();
        let cli = Cli::try_parse_from(["reposeed", "-l", lvl.as_str(), "version"])
            .expect("valid args");
        assert_eq!(cli.log_level_filter(), expected);
    }

    #[rstest]
    #[case(&["reposeed", "parse", "repos.xml", "-c", "default_repos", "--flat"])]
    #[case(&["reposeed", "check", "repos.xml"])]
    #[case(&["reposeed", "seed", "-r", "/oem", "--json"])]
    fn test_commands_parse(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_ok());
    }
}
