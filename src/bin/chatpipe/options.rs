use chatpipe::library::helpers::parse_seconds;
use std::str::FromStr;
use std::time::Duration;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(about = "Stream consumers of the chat notification pipeline.")]
pub struct MainOptions {
    /// Log level, scopable to different modules
    ///
    /// Levels: trace, debug, info, warn, error
    #[structopt(
        short,
        long,
        global = true,
        default_value = "info,mongodb=warn",
        env = "RUST_LOG",
        value_name = "level"
    )]
    pub log: String,

    /// Output format of log records
    ///
    /// Formats: text, compact, json
    #[structopt(long, global = true, env, default_value = "text", value_name = "format")]
    pub log_format: LogFormat,

    /// Enable status reporting server which can be used as a readiness probe
    #[structopt(long, global = true, env, value_name = "port")]
    pub status_server: Option<u16>,

    /// Seconds a module may spend connecting to the document store before giving up
    #[structopt(long, global = true, env, default_value = "60", parse(try_from_str = parse_seconds), value_name = "s")]
    pub startup_timeout: Duration,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug)]
pub enum LogFormat {
    Text,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Maintains unread and read receipt counters
    Counter(chatpipe::module::counter::Options),
    /// Purges the data of removed users
    Janitor(chatpipe::module::janitor::Options),
}
