//! CLI argument parsing and logging setup

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::commands::upgrade::{self, UpgradeArgs};

/// Environment variable that overrides the `--log-level` filter.
const LOG_ENV: &str = "VALGRADE_LOG";

/// valgrade - Upgrade a customized chart values file to a new chart version
#[derive(Parser, Debug)]
#[command(name = "valgrade")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    upgrade: UpgradeArgs,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level
    #[arg(short, long, value_enum, value_name = "LEVEL", default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Suppress all output except errors and the document printed by --dry-run
    #[arg(short, long)]
    silent: bool,
}

/// Log levels accepted by `--log-level`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Same as `error`.
    Fatal,
}

impl LogLevel {
    fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::Error,
        }
    }
}

impl Cli {
    /// Execute the upgrade
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level, self.silent);
        upgrade::execute(self.upgrade, &self.color, self.silent)
    }
}

fn init_logging(level: LogLevel, silent: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(if silent { LevelFilter::Off } else { level.filter() })
        .format_timestamp(None)
        .format_target(false);
    if !silent {
        builder.parse_env(LOG_ENV);
    }
    // A logger may already be installed when run in-process
    let _ = builder.try_init();
}
