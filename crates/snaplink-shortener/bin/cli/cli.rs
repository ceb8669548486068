use clap::{Parser, Subcommand, ValueEnum};
use snaplink_core::record::DEFAULT_VALIDITY_MINUTES;
use snaplink_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tracing::Level;

pub const DATA_DIR_ENV: &str = "SNAPLINK_DATA_DIR";
pub const BASE_URL_ENV: &str = "SNAPLINK_BASE_URL";
pub const GENERATOR_ENV: &str = "SNAPLINK_GENERATOR";
pub const LOG_FORMAT_ENV: &str = "SNAPLINK_LOG_FORMAT";
pub const UTC_ENV: &str = "SNAPLINK_UTC";

pub const DEFAULT_DATA_DIR: &str = ".snaplink";
/// Referrer recorded for clicks that arrive without one.
pub const DEFAULT_REFERRER: &str = "direct";
pub const DEFAULT_BASE_URL: &str = snaplink_shortener::settings::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    #[value(name = "random")]
    Random,
    #[value(name = "seq")]
    Seq,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Seq => write!(f, "seq"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LevelArg> for Level {
    fn from(value: LevelArg) -> Self {
        match value {
            LevelArg::Error => Level::ERROR,
            LevelArg::Warn => Level::WARN,
            LevelArg::Info => Level::INFO,
            LevelArg::Debug => Level::DEBUG,
            LevelArg::Trace => Level::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snaplink", version, about = "Shorten URLs, follow them and inspect their clicks")]
pub struct CLI {
    /// Directory holding the persisted links and event journal.
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Origin prefixed to short codes in printed short URLs.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorArg::Random
    )]
    pub generator: GeneratorArg,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    /// Bucket click statistics by UTC hours and days instead of local time.
    #[arg(long, env = UTC_ENV)]
    pub utc: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a short link.
    Shorten {
        url: String,
        /// Use this code instead of a generated one.
        #[arg(long)]
        code: Option<String>,
        /// Minutes until the link expires (1-10080).
        #[arg(long, default_value_t = DEFAULT_VALIDITY_MINUTES)]
        validity: u32,
    },
    /// Follow a short link, recording a click.
    Resolve {
        code: String,
        #[arg(long, default_value = DEFAULT_REFERRER)]
        referrer: String,
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Show a live link without recording a click.
    Get { code: String },
    /// List every link, expired ones included.
    List,
    /// Show click statistics for a link.
    Stats { code: String },
    /// Show recent log events.
    Logs {
        #[arg(long, value_enum)]
        level: Option<LevelArg>,
        #[arg(long)]
        limit: Option<usize>,
    },
}
