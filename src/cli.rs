use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Parser, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default)]
#[command(
    author,
    version,
    about,
    long_about = "Sends a templated HTML email to every recipient listed in a CSV file."
)]
pub struct Cli {
    /// Specify a dotenv file to load settings from
    ///
    /// If not specified uses `.env` in the current folder when it exists
    #[arg(long = "env-file", short, value_name = "PATH")]
    pub env_filename: Option<String>,

    /// Set logging level to use
    #[arg(long, short, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// File the rolling log is written to
    #[arg(long = "log-file", value_name = "PATH", default_value = "log/mailer.log")]
    pub log_filename: String,
}

impl Cli {
    /// Returns the dotenv file to load and whether it was asked for explicitly
    pub fn get_env_path(&self) -> (PathBuf, bool) {
        match self.env_filename.as_ref() {
            Some(val) => (PathBuf::from(val), true),
            None => (PathBuf::from(".env"), false),
        }
    }
}

/// Exists to provide better help messages variants copied from LevelFilter as
/// that's the type that is actually needed
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum LogLevel {
    /// Nothing emitted in this mode
    #[default]
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
